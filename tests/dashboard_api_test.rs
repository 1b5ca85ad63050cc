/// Dashboard API integration tests
///
/// Drives the router end to end with an in-memory price provider:
/// - session lifecycle (create, get, delete)
/// - analysis success and failure, including clearing a prior chart
/// - theme switching over a cached analysis
/// - CSV export with and without a cached analysis

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use ticker_dashboard::app::create_app;
use ticker_dashboard::config::AppConfig;
use ticker_dashboard::external::price_provider::{
    ColumnLabel, PriceProvider, PriceProviderError, RawCell, RawTable,
};
use ticker_dashboard::models::{Period, Ticker};
use ticker_dashboard::state::AppState;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Serves 30 steadily rising daily bars for MSFT, nothing for anything else.
struct ScriptedProvider;

fn rising_table(ticker: &str, n: usize) -> RawTable {
    let fields = ["Open", "High", "Low", "Close", "Volume"];
    RawTable {
        index_name: Some("Date".to_string()),
        index: (0..n)
            .map(|i| RawCell::Text(format!("2024-01-{:02}", i + 1)))
            .collect(),
        columns: fields
            .iter()
            .map(|f| ColumnLabel::Compound(vec![f.to_string(), ticker.to_string()]))
            .collect(),
        rows: (0..n)
            .map(|i| {
                let close = 100.0 + i as f64;
                vec![
                    RawCell::Number(close - 0.5),
                    RawCell::Number(close + 1.0),
                    RawCell::Number(close - 1.0),
                    RawCell::Number(close),
                    RawCell::Number(1_000_000.0),
                ]
            })
            .collect(),
    }
}

#[async_trait]
impl PriceProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_daily_history(
        &self,
        ticker: &Ticker,
        _period: Period,
    ) -> Result<RawTable, PriceProviderError> {
        match ticker.as_str() {
            "MSFT" => Ok(rising_table("MSFT", 30)),
            "BROKEN" => Err(PriceProviderError::Network("connection reset".to_string())),
            _ => Ok(RawTable::default()),
        }
    }
}

fn test_state(export_dir: &std::path::Path) -> AppState {
    let config = AppConfig {
        export_dir: export_dir.to_path_buf(),
        fetch_timeout: Duration::from_secs(5),
        ..AppConfig::default()
    };
    AppState::new(config, Arc::new(ScriptedProvider))
}

fn test_app(export_dir: &std::path::Path) -> Router {
    create_app(test_state(export_dir))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };
    (status, value)
}

async fn new_session(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

fn last_status(session: &Value) -> &Value {
    session["status"].as_array().unwrap().last().unwrap()
}

// ---------------------------------------------------------------------------
// Plumbing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn test_themes_are_listed_with_full_palettes() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let (status, body) = send(&app, Method::GET, "/api/themes", None).await;
    assert_eq!(status, StatusCode::OK);

    let themes = body.as_array().unwrap();
    let names: Vec<&str> = themes.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["light", "dark", "terminal"]);
    assert_eq!(themes[2]["background"], "#000000");
    assert!(themes[1]["series"]["close"].as_str().unwrap().starts_with('#'));
}

#[tokio::test]
async fn test_session_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;

    let (status, body) = send(&app, Method::GET, &format!("/api/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["controls"]["theme"], "light");
    assert_eq!(body["controls"]["period"], "6mo");
    assert_eq!(body["has_analysis"], false);
    assert!(body["chart"].is_null());
    assert_eq!(last_status(&body)["message"], "Enter a ticker and click Run Analysis");

    let (status, _) = send(&app, Method::DELETE, &format!("/api/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, &format!("/api/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "session_not_found");
}

#[tokio::test]
async fn test_polling_a_session_keeps_it_alive() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());
    let app = create_app(state.clone());
    let id = new_session(&app).await;
    let uuid = id.parse::<uuid::Uuid>().unwrap();

    state.sessions.get(uuid).unwrap().lock().await.last_seen =
        chrono::Utc::now() - chrono::Duration::hours(3);

    let (status, _) = send(&app, Method::GET, &format!("/api/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(state.sessions.cleanup_expired(), 0);
    assert!(state.sessions.get(uuid).is_ok());
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_analysis_builds_linked_panels_and_stats() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/analyze", id),
        Some(json!({
            "ticker": "msft",
            "period": "1mo",
            "indicators": ["MACD", "RSI", "SMA/EMA"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    assert_eq!(body["controls"]["ticker"], "MSFT");
    assert_eq!(last_status(&body)["message"], "Loaded 30 days of data for MSFT");

    let panels = body["chart"]["panels"].as_array().unwrap();
    let kinds: Vec<&str> = panels.iter().map(|p| p["kind"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["price", "volume", "rsi", "macd"]);
    for panel in panels {
        assert_eq!(panel["x_axis"], "shared-time");
    }

    let stats = &body["stats"];
    assert_eq!(stats["current_price"], 129.0);
    assert_eq!(stats["rsi"], 100.0);
    assert_eq!(stats["rsi_signal"], "Overbought");
}

#[tokio::test]
async fn test_standalone_ema_toggle_draws_ema_twenty() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/analyze", id),
        Some(json!({ "ticker": "MSFT", "indicators": ["EMA"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["controls"]["indicators"], json!(["EMA"]));

    let names: Vec<&str> = body["chart"]["panels"][0]["series"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Close", "EMA_20"]);
}

#[tokio::test]
async fn test_no_data_clears_previous_chart() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;
    let analyze = format!("/api/sessions/{}/analyze", id);

    let (status, _) = send(&app, Method::POST, &analyze, Some(json!({ "ticker": "MSFT" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        &analyze,
        Some(json!({ "ticker": "AAPL", "period": "6mo", "indicators": ["SMA/EMA"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "no_data");
    assert_eq!(body["message"], "No data found for AAPL");

    let (_, session) = send(&app, Method::GET, &format!("/api/sessions/{}", id), None).await;
    assert!(session["chart"].is_null());
    assert!(session["stats"].is_null());
    assert_eq!(session["has_analysis"], false);
    assert_eq!(last_status(&session)["level"], "error");
}

#[tokio::test]
async fn test_provider_failure_is_reported_as_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/analyze", id),
        Some(json!({ "ticker": "broken" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No data found for BROKEN");
}

#[tokio::test]
async fn test_input_validation() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;
    let analyze = format!("/api/sessions/{}/analyze", id);

    let (status, body) = send(&app, Method::POST, &analyze, Some(json!({ "ticker": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please enter a ticker symbol");

    let (status, body) =
        send(&app, Method::POST, &analyze, Some(json!({ "ticker": "MSFT", "period": "7d" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_period");

    let (status, _) = send(
        &app,
        Method::POST,
        &analyze,
        Some(json!({ "ticker": "MSFT", "indicators": ["Stochastic"] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ---------------------------------------------------------------------------
// Theme and export
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_theme_switch_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;

    let (_, before) = send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/analyze", id),
        Some(json!({ "ticker": "MSFT", "indicators": ["Bollinger Bands", "RSI"] })),
    )
    .await;

    let (status, after) = send(
        &app,
        Method::PUT,
        &format!("/api/sessions/{}/theme", id),
        Some(json!({ "theme": "terminal" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["chart"]["theme"], "terminal");
    assert_eq!(after["chart"]["background"], "#000000");
    assert_eq!(after["chart"]["time_axis"], before["chart"]["time_axis"]);

    let data = |v: &Value| -> Vec<Value> {
        v["chart"]["panels"]
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|p| p["series"].as_array().unwrap().iter().map(|s| s["data"].clone()))
            .collect()
    };
    assert_eq!(data(&before), data(&after));

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/sessions/{}/theme", id),
        Some(json!({ "theme": "neon" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unknown_theme");
}

#[tokio::test]
async fn test_export_round() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;
    let export = format!("/api/sessions/{}/export", id);

    let (status, body) = send(&app, Method::POST, &export, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["file"].is_null());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/analyze", id),
        Some(json!({ "ticker": "MSFT" })),
    )
    .await;

    let (status, body) = send(&app, Method::POST, &export, None).await;
    assert_eq!(status, StatusCode::OK);
    let file = body["file"].as_str().unwrap();
    assert!(file.contains("MSFT_") && file.ends_with(".csv"));

    let mut reader = csv::Reader::from_path(file).unwrap();
    assert_eq!(reader.records().count(), 30);
}

#[tokio::test]
async fn test_refresh_reruns_last_controls() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;

    send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/analyze", id),
        Some(json!({ "ticker": "MSFT", "period": "3mo" })),
    )
    .await;

    let (status, body) = send(&app, Method::POST, &format!("/api/sessions/{}/refresh", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["controls"]["period"], "3mo");
    assert_eq!(body["has_analysis"], true);
}
