use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::models::{Period, Ticker};

/// Column header as a provider reports it. Some providers group fields per
/// symbol, giving compound labels like `("Close", "AAPL")`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnLabel {
    Flat(String),
    Compound(Vec<String>),
}

impl ColumnLabel {
    pub fn flat(name: impl Into<String>) -> Self {
        ColumnLabel::Flat(name.into())
    }

    /// First component for compound labels, the label itself otherwise.
    pub fn flatten(&self) -> String {
        match self {
            ColumnLabel::Flat(name) => name.clone(),
            ColumnLabel::Compound(parts) => parts.first().cloned().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    /// Unix seconds.
    Timestamp(i64),
    Text(String),
    Number(f64),
    Missing,
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%:z")
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

impl RawCell {
    /// Calendar date of a cell: Unix seconds, `YYYY-MM-DD`, RFC 3339, or
    /// `YYYY-MM-DD HH:MM:SS` with or without a UTC offset. Offset times keep
    /// the date local to their offset.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            RawCell::Timestamp(ts) => DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()),
            RawCell::Number(n) if n.is_finite() => DateTime::from_timestamp(*n as i64, 0).map(|dt| dt.date_naive()),
            RawCell::Text(text) => parse_date_text(text.trim()),
            _ => None,
        }
    }
}

/// Untyped table handed over by a provider, before normalization.
///
/// Rows may carry their dates in the row index (`index`, named by
/// `index_name`) instead of a regular column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub index_name: Option<String>,
    pub index: Vec<RawCell>,
    pub columns: Vec<ColumnLabel>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("ticker not found")]
    NotFound,

    #[error("rate limited")]
    RateLimited,

    #[error("timed out after {0}s")]
    Timeout(u64),
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    async fn fetch_daily_history(
        &self,
        ticker: &Ticker,
        period: Period,
    ) -> Result<RawTable, PriceProviderError>;
}
