use async_trait::async_trait;
use serde::Deserialize;

use crate::external::price_provider::{ColumnLabel, PriceProvider, PriceProviderError, RawCell, RawTable};
use crate::models::{Period, Ticker};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance provider - free v8 chart endpoint, no API key required.
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self::with_base_url(CHART_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; TickerDashboard/0.1)")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.into(),
        }
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn cell(values: &[Option<f64>], i: usize) -> RawCell {
    match values.get(i).copied().flatten() {
        Some(v) => RawCell::Number(v),
        None => RawCell::Missing,
    }
}

/// Lays the per-field quote arrays out as rows, dates in the index and
/// columns labeled `(field, symbol)`.
fn into_table(ticker: &Ticker, result: YahooResult) -> RawTable {
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let fields: [(&str, &Vec<Option<f64>>); 5] = [
        ("Open", &quote.open),
        ("High", &quote.high),
        ("Low", &quote.low),
        ("Close", &quote.close),
        ("Volume", &quote.volume),
    ];

    let columns = fields
        .iter()
        .map(|(name, _)| ColumnLabel::Compound(vec![name.to_string(), ticker.to_string()]))
        .collect();

    let rows = (0..result.timestamp.len())
        .map(|i| fields.iter().map(|(_, values)| cell(values, i)).collect())
        .collect();

    RawTable {
        index_name: Some("Date".to_string()),
        index: result.timestamp.into_iter().map(RawCell::Timestamp).collect(),
        columns,
        rows,
    }
}

#[async_trait]
impl PriceProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_daily_history(
        &self,
        ticker: &Ticker,
        period: Period,
    ) -> Result<RawTable, PriceProviderError> {
        let url = format!("{}/{}", self.base_url, ticker);

        let resp = self
            .client
            .get(&url)
            .query(&[("interval", "1d"), ("range", period.as_str())])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PriceProviderError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(PriceProviderError::BadResponse(format!("HTTP {}", resp.status())));
        }

        let body: YahooChartResponse = resp
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        if let Some(error) = body.chart.error {
            if error.description.contains("No data found") {
                return Err(PriceProviderError::NotFound);
            }
            return Err(PriceProviderError::BadResponse(error.description));
        }

        let result = body
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
            .ok_or(PriceProviderError::NotFound)?;

        Ok(into_table(ticker, result))
    }
}
