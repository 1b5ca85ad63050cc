use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use crate::models::bar::{Bar, Period, Ticker};

/// Canonical daily series: ascending by date, one bar per date.
///
/// The bars are shared behind an `Arc` so later stages can hold the series
/// without copying it, but nothing can mutate it once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    bars: Arc<[Bar]>,
}

impl Series {
    /// Sorts by date and drops duplicate dates, keeping the last bar seen for a date.
    pub fn new(mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.date);

        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }

        Self { bars: deduped.into() }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn previous(&self) -> Option<&Bar> {
        self.bars.len().checked_sub(2).map(|i| &self.bars[i])
    }
}

/// Derived columns, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorColumn {
    Sma20,
    Sma50,
    Ema12,
    Ema26,
    Ema20,
    Macd,
    MacdSignal,
    MacdHistogram,
    Rsi14,
    BbMiddle,
    BbUpper,
    BbLower,
}

impl IndicatorColumn {
    pub const ALL: [IndicatorColumn; 12] = [
        IndicatorColumn::Sma20,
        IndicatorColumn::Sma50,
        IndicatorColumn::Ema12,
        IndicatorColumn::Ema26,
        IndicatorColumn::Ema20,
        IndicatorColumn::Macd,
        IndicatorColumn::MacdSignal,
        IndicatorColumn::MacdHistogram,
        IndicatorColumn::Rsi14,
        IndicatorColumn::BbMiddle,
        IndicatorColumn::BbUpper,
        IndicatorColumn::BbLower,
    ];

    /// Column header used in exports and chart series names.
    pub fn name(&self) -> &'static str {
        match self {
            IndicatorColumn::Sma20 => "SMA_20",
            IndicatorColumn::Sma50 => "SMA_50",
            IndicatorColumn::Ema12 => "EMA_12",
            IndicatorColumn::Ema26 => "EMA_26",
            IndicatorColumn::Ema20 => "EMA_20",
            IndicatorColumn::Macd => "MACD",
            IndicatorColumn::MacdSignal => "MACD_Signal",
            IndicatorColumn::MacdHistogram => "MACD_Hist",
            IndicatorColumn::Rsi14 => "RSI",
            IndicatorColumn::BbMiddle => "BB_Middle",
            IndicatorColumn::BbUpper => "BB_Upper",
            IndicatorColumn::BbLower => "BB_Lower",
        }
    }
}

/// Indicator columns index-aligned with the bars of the series they were computed from.
///
/// `None` marks a position where the window has not filled yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorSet {
    pub sma_20: Vec<Option<f64>>,
    pub sma_50: Vec<Option<f64>>,
    pub ema_12: Vec<Option<f64>>,
    pub ema_26: Vec<Option<f64>>,
    /// Span-20 overlay drawn by the standalone EMA toggle.
    pub ema_20: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub macd_histogram: Vec<Option<f64>>,
    pub rsi_14: Vec<Option<f64>>,
    pub bb_middle: Vec<Option<f64>>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
}

impl IndicatorSet {
    pub fn column(&self, column: IndicatorColumn) -> &[Option<f64>] {
        match column {
            IndicatorColumn::Sma20 => &self.sma_20,
            IndicatorColumn::Sma50 => &self.sma_50,
            IndicatorColumn::Ema12 => &self.ema_12,
            IndicatorColumn::Ema26 => &self.ema_26,
            IndicatorColumn::Ema20 => &self.ema_20,
            IndicatorColumn::Macd => &self.macd,
            IndicatorColumn::MacdSignal => &self.macd_signal,
            IndicatorColumn::MacdHistogram => &self.macd_histogram,
            IndicatorColumn::Rsi14 => &self.rsi_14,
            IndicatorColumn::BbMiddle => &self.bb_middle,
            IndicatorColumn::BbUpper => &self.bb_upper,
            IndicatorColumn::BbLower => &self.bb_lower,
        }
    }

    /// Value of a column at `index`, flattening out-of-range and absent alike.
    pub fn value(&self, column: IndicatorColumn, index: usize) -> Option<f64> {
        self.column(column).get(index).copied().flatten()
    }

    pub fn latest_rsi(&self) -> Option<f64> {
        self.rsi_14.last().copied().flatten()
    }
}

/// Result of one successful analysis run: the series plus everything derived from it.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub ticker: Ticker,
    pub period: Period,
    pub series: Series,
    pub indicators: IndicatorSet,
    pub fetched_at: DateTime<Utc>,
}
