use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// One trading day of OHLCV data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Up bars close at or above their open.
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

/// Lookback window offered by the timeframe selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Period {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[default]
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl Period {
    pub const ALL: [Period; 6] = [
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
    ];

    /// The provider range token ("1mo", "6mo", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
        }
    }

    /// Calendar days covered by the period.
    pub fn calendar_days(&self) -> i64 {
        match self {
            Period::OneMonth => 30,
            Period::ThreeMonths => 91,
            Period::SixMonths => 182,
            Period::OneYear => 365,
            Period::TwoYears => 730,
            Period::FiveYears => 1826,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::InvalidPeriod(s.to_string()))
    }
}

/// An upper-cased, validated ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticker(String);

fn ticker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9.^=\-]{1,15}$").expect("ticker pattern is valid"))
}

impl Ticker {
    /// Trims and upper-cases user input.
    ///
    /// Blank input is `EmptyInput`; anything that cannot be a symbol is `InvalidTicker`.
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let normalized = input.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(AppError::EmptyInput);
        }
        if !ticker_pattern().is_match(&normalized) {
            return Err(AppError::InvalidTicker(normalized));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
