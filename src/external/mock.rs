use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};

use crate::external::price_provider::{ColumnLabel, PriceProvider, PriceProviderError, RawCell, RawTable};
use crate::models::{Period, Ticker};

/// Random-walk prices for demos and local development.
pub struct MockProvider {
    start_price: f64,
}

impl MockProvider {
    pub fn new() -> Self {
        Self { start_price: 100.0 }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn trading_days(end: NaiveDate, period: Period) -> Vec<NaiveDate> {
    let start = end - Duration::days(period.calendar_days());
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

#[async_trait]
impl PriceProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_daily_history(
        &self,
        _ticker: &Ticker,
        period: Period,
    ) -> Result<RawTable, PriceProviderError> {
        let days = trading_days(Utc::now().date_naive(), period);
        let mut current = self.start_price;
        let mut rows = Vec::with_capacity(days.len());

        for _ in &days {
            let open = current;
            current *= 1.0 + (rand::random::<f64>() - 0.5) * 0.04;
            let spread = current * rand::random::<f64>() * 0.01;
            let high = open.max(current) + spread;
            let low = (open.min(current) - spread).max(0.01);
            let volume = 1_000_000.0 + rand::random::<f64>() * 4_000_000.0;

            rows.push(vec![
                RawCell::Number(open),
                RawCell::Number(high),
                RawCell::Number(low),
                RawCell::Number(current),
                RawCell::Number(volume.round()),
            ]);
        }

        Ok(RawTable {
            index_name: Some("Date".to_string()),
            index: days
                .iter()
                .map(|d| RawCell::Text(d.format("%Y-%m-%d").to_string()))
                .collect(),
            columns: ["Open", "High", "Low", "Close", "Volume"]
                .into_iter()
                .map(ColumnLabel::flat)
                .collect(),
            rows,
        })
    }
}
