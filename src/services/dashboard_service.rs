use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::models::{Analysis, IndicatorGroup, Period, StatusLevel, ThemeName, Ticker};
use crate::services::session_store::Session;
use crate::services::{chart_service, export_service, indicators, ingestion, stats_service};

/// Body of a "Run Analysis" action.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub ticker: String,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub indicators: Vec<IndicatorGroup>,
    #[serde(default)]
    pub theme: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThemeRequest {
    pub theme: String,
}

fn normalize_groups(mut groups: Vec<IndicatorGroup>) -> Vec<IndicatorGroup> {
    groups.sort();
    groups.dedup();
    groups
}

async fn run_analysis(
    provider: &dyn PriceProvider,
    ticker: Ticker,
    period: Period,
    fetch_timeout: Duration,
) -> Result<Analysis, AppError> {
    let series = ingestion::load_series(provider, &ticker, period, fetch_timeout).await?;
    let indicators = indicators::compute(&series);

    Ok(Analysis {
        ticker,
        period,
        series,
        indicators,
        fetched_at: Utc::now(),
    })
}

/// Validates every control first and only then records them in the session,
/// so a rejected request leaves the previous controls in place.
async fn prepare_and_run(
    session: &mut Session,
    provider: &dyn PriceProvider,
    fetch_timeout: Duration,
    request: &AnalyzeRequest,
) -> Result<Analysis, AppError> {
    let period = match request.period.as_deref() {
        Some(raw) => raw.parse::<Period>()?,
        None => session.controls.period,
    };
    let theme = match request.theme.as_deref() {
        Some(raw) => raw.parse::<ThemeName>()?,
        None => session.controls.theme,
    };
    let ticker = Ticker::parse(&request.ticker)?;

    session.controls.ticker = ticker.to_string();
    session.controls.period = period;
    session.controls.theme = theme;
    session.controls.indicators = normalize_groups(request.indicators.clone());
    session.status.push(StatusLevel::Loading, format!("Loading data for {}...", ticker));

    run_analysis(provider, ticker, period, fetch_timeout).await
}

/// Runs a full analysis for the submitted controls.
///
/// On success the analysis, chart and stats replace the session's previous
/// ones. On any failure they are cleared and the error is logged to the
/// session's status area before being returned.
pub async fn analyze(
    session: &mut Session,
    provider: &dyn PriceProvider,
    fetch_timeout: Duration,
    request: AnalyzeRequest,
) -> Result<(), AppError> {
    session.touch();
    session.clear_results();

    let result = prepare_and_run(session, provider, fetch_timeout, &request).await;

    match result {
        Ok(analysis) => {
            let chart = chart_service::compose(&analysis, &session.controls.indicators, session.controls.theme);
            session.stats = stats_service::summarize(&analysis);
            session.chart = Some(chart);
            session.status.push(
                StatusLevel::Success,
                format!("Loaded {} days of data for {}", analysis.series.len(), analysis.ticker),
            );
            info!(
                "Analysis of {} ({}) ready: {} bars, indicators {:?}",
                analysis.ticker,
                analysis.period,
                analysis.series.len(),
                session.controls.indicators
            );
            session.analysis = Some(Arc::new(analysis));
            Ok(())
        }
        Err(e) => {
            warn!("Analysis for session {} failed: {}", session.id, e);
            session.status.push(StatusLevel::Error, e.to_string());
            Err(e)
        }
    }
}

/// Re-runs the analysis with the controls last submitted.
pub async fn refresh(
    session: &mut Session,
    provider: &dyn PriceProvider,
    fetch_timeout: Duration,
) -> Result<(), AppError> {
    let request = AnalyzeRequest {
        ticker: session.controls.ticker.clone(),
        period: Some(session.controls.period.as_str().to_string()),
        indicators: session.controls.indicators.clone(),
        theme: None,
    };
    analyze(session, provider, fetch_timeout, request).await
}

/// Switches the theme and, when an analysis is cached, rebuilds the chart from it.
pub fn change_theme(session: &mut Session, theme: &str) -> Result<(), AppError> {
    session.touch();

    let theme = match theme.parse::<ThemeName>() {
        Ok(theme) => theme,
        Err(e) => {
            session.status.push(StatusLevel::Error, e.to_string());
            return Err(e);
        }
    };
    session.controls.theme = theme;

    if let Some(analysis) = &session.analysis {
        session.chart = Some(chart_service::compose(analysis, &session.controls.indicators, theme));
    }
    session.status.push(StatusLevel::Info, format!("Theme changed to {}", theme));
    info!("Session {} switched to theme {}", session.id, theme);
    Ok(())
}

/// Writes the cached analysis to `{export_dir}/{TICKER}_{timestamp}.csv`.
///
/// Without a cached analysis this is a no-op returning `None`.
pub async fn export(session: &mut Session, export_dir: &Path) -> Result<Option<PathBuf>, AppError> {
    session.touch();

    let Some(analysis) = session.analysis.clone() else {
        session.status.push(StatusLevel::Info, "Nothing to export: run an analysis first");
        return Ok(None);
    };

    let dir = export_dir.to_path_buf();
    let written = tokio::task::spawn_blocking(move || export_service::export_analysis(&analysis, &dir, Utc::now()))
        .await
        .map_err(|e| AppError::Export(e.to_string()))
        .and_then(|r| r);

    match written {
        Ok(path) => {
            session.status.push(StatusLevel::Success, format!("Exported data to {}", path.display()));
            Ok(Some(path))
        }
        Err(e) => {
            error!("Export for session {} failed: {}", session.id, e);
            session.status.push(StatusLevel::Error, e.to_string());
            Err(e)
        }
    }
}
