use serde::{Deserialize, Serialize};

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

/// RSI classification shown in the statistics panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiSignal {
    Overbought,
    Oversold,
    Neutral,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl RsiSignal {
    pub fn classify(rsi: Option<f64>) -> Self {
        match rsi {
            Some(v) if v > RSI_OVERBOUGHT => RsiSignal::Overbought,
            Some(v) if v < RSI_OVERSOLD => RsiSignal::Oversold,
            Some(_) => RsiSignal::Neutral,
            None => RsiSignal::NotAvailable,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RsiSignal::Overbought => "Overbought",
            RsiSignal::Oversold => "Oversold",
            RsiSignal::Neutral => "Neutral",
            RsiSignal::NotAvailable => "N/A",
        }
    }
}

/// Headline numbers for the latest bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub current_price: f64,
    /// Percent change from the previous close, e.g. 10.0 for +10%.
    pub change_pct: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub volume: u64,
    pub rsi: Option<f64>,
    pub rsi_signal: RsiSignal,
}
