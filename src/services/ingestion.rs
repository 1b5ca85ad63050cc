use std::time::Duration;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::external::price_provider::{PriceProvider, PriceProviderError, RawCell, RawTable};
use crate::models::{Bar, Period, Series, Ticker};

const DATE: &str = "Date";
const INTRADAY_DATE: &str = "Datetime";

/// Fetches a ticker's history and normalizes it, bounded by `timeout`.
///
/// Every provider failure, a timeout included, is reported as `NoData`.
pub async fn load_series(
    provider: &dyn PriceProvider,
    ticker: &Ticker,
    period: Period,
    timeout: Duration,
) -> Result<Series, AppError> {
    let fetched = tokio::time::timeout(timeout, provider.fetch_daily_history(ticker, period))
        .await
        .unwrap_or(Err(PriceProviderError::Timeout(timeout.as_secs())));

    let raw = match fetched {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Fetch of {} ({}) from {} failed: {}", ticker, period, provider.name(), e);
            return Err(AppError::NoData(ticker.to_string()));
        }
    };

    info!("Fetched {} rows for {} ({}) from {}", raw.rows.len(), ticker, period, provider.name());
    normalize(ticker, raw)
}

fn number(cell: Option<&RawCell>) -> Option<f64> {
    match cell {
        Some(RawCell::Number(v)) if v.is_finite() => Some(*v),
        Some(RawCell::Text(text)) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn price(cell: Option<&RawCell>) -> Option<f64> {
    number(cell).filter(|v| *v > 0.0)
}

/// Turns a provider table into the canonical series.
///
/// Compound column labels are flattened to their first component and a date
/// index is moved into a regular `Date` column. `Date` and `Close` must be
/// present afterwards. Missing Open/High/Low fall back to Close and a missing
/// Volume to zero. Rows without a readable date or a positive Close are
/// dropped.
pub fn normalize(ticker: &Ticker, raw: RawTable) -> Result<Series, AppError> {
    if raw.is_empty() {
        return Err(AppError::NoData(ticker.to_string()));
    }

    let mut names: Vec<String> = raw.columns.iter().map(|c| c.flatten()).collect();
    let mut rows = raw.rows;

    if !raw.index.is_empty() && !names.iter().any(|n| n == DATE) {
        let index_name = raw.index_name.unwrap_or_else(|| "index".to_string());
        names.insert(0, index_name);
        for (row, idx) in rows.iter_mut().zip(raw.index) {
            row.insert(0, idx);
        }
    }

    if !names.iter().any(|n| n == DATE) {
        if let Some(pos) = names.iter().position(|n| n == INTRADAY_DATE) {
            names[pos] = DATE.to_string();
        }
    }

    let position = |name: &str| names.iter().position(|n| n == name);
    let (Some(date_col), Some(close_col)) = (position(DATE), position("Close")) else {
        warn!("Columns available for {}: {:?}", ticker, names);
        return Err(AppError::MalformedData {
            ticker: ticker.to_string(),
            detail: format!("expected Date and Close columns, found {:?}", names),
        });
    };
    let open_col = position("Open");
    let high_col = position("High");
    let low_col = position("Low");
    let volume_col = position("Volume");

    let total = rows.len();
    let mut dated = 0usize;
    let mut bars = Vec::with_capacity(total);

    for row in &rows {
        let Some(date) = row.get(date_col).and_then(RawCell::as_date) else {
            continue;
        };
        dated += 1;

        let Some(close) = price(row.get(close_col)) else {
            continue;
        };
        let cell = |col: Option<usize>| col.and_then(|c| row.get(c));

        let open = price(cell(open_col)).unwrap_or(close);
        let high = price(cell(high_col)).unwrap_or(open.max(close));
        let low = price(cell(low_col)).unwrap_or(open.min(close));
        let volume = number(cell(volume_col)).map_or(0, |v| v.max(0.0).round() as u64);

        bars.push(Bar { date, open, high, low, close, volume });
    }

    if dated == 0 {
        return Err(AppError::MalformedData {
            ticker: ticker.to_string(),
            detail: "Date column could not be read as dates".to_string(),
        });
    }
    if bars.is_empty() {
        return Err(AppError::NoData(ticker.to_string()));
    }
    if bars.len() < total {
        warn!("Dropped {} of {} rows for {} with a missing date or close", total - bars.len(), total, ticker);
    }

    Ok(Series::new(bars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::price_provider::ColumnLabel;
    use chrono::NaiveDate;
    use async_trait::async_trait;

    fn ticker() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    fn compound(field: &str) -> ColumnLabel {
        ColumnLabel::Compound(vec![field.to_string(), "AAPL".to_string()])
    }

    fn yahoo_like_table() -> RawTable {
        RawTable {
            index_name: Some("Date".to_string()),
            // 2024-01-03, then 2024-01-02 to check sorting
            index: vec![RawCell::Timestamp(1704292200), RawCell::Timestamp(1704205800)],
            columns: ["Open", "High", "Low", "Close", "Volume"].into_iter().map(compound).collect(),
            rows: vec![
                vec![
                    RawCell::Number(184.22),
                    RawCell::Number(185.88),
                    RawCell::Number(183.43),
                    RawCell::Number(184.25),
                    RawCell::Number(58414500.0),
                ],
                vec![
                    RawCell::Number(187.15),
                    RawCell::Number(188.44),
                    RawCell::Number(183.89),
                    RawCell::Number(185.64),
                    RawCell::Number(82488700.0),
                ],
            ],
        }
    }

    #[test]
    fn test_normalize_flattens_and_resets_index() {
        let series = normalize(&ticker(), yahoo_like_table()).unwrap();

        assert_eq!(series.len(), 2);
        let first = series.bars()[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(first.close, 185.64);
        assert_eq!(first.volume, 82488700);
        assert_eq!(series.bars()[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    #[test]
    fn test_empty_table_is_no_data() {
        let err = normalize(&ticker(), RawTable::default()).unwrap_err();
        assert!(matches!(err, AppError::NoData(t) if t == "AAPL"));
    }

    #[test]
    fn test_missing_close_column_is_malformed() {
        let table = RawTable {
            index_name: None,
            index: Vec::new(),
            columns: vec![ColumnLabel::flat("Date"), ColumnLabel::flat("Adj Close")],
            rows: vec![vec![RawCell::Text("2024-01-02".into()), RawCell::Number(1.0)]],
        };
        assert!(matches!(normalize(&ticker(), table), Err(AppError::MalformedData { .. })));
    }

    #[test]
    fn test_missing_date_is_malformed() {
        let table = RawTable {
            index_name: None,
            index: Vec::new(),
            columns: vec![ColumnLabel::flat("Close")],
            rows: vec![vec![RawCell::Number(1.0)]],
        };
        assert!(matches!(normalize(&ticker(), table), Err(AppError::MalformedData { .. })));
    }

    #[test]
    fn test_unnamed_index_is_not_a_date_column() {
        let mut table = yahoo_like_table();
        table.index_name = None;
        assert!(matches!(normalize(&ticker(), table), Err(AppError::MalformedData { .. })));
    }

    #[test]
    fn test_rows_without_close_are_dropped() {
        let mut table = yahoo_like_table();
        table.rows[0][3] = RawCell::Missing;
        let series = normalize(&ticker(), table).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_all_closes_missing_is_no_data() {
        let mut table = yahoo_like_table();
        for row in &mut table.rows {
            row[3] = RawCell::Missing;
        }
        assert!(matches!(normalize(&ticker(), table), Err(AppError::NoData(_))));
    }

    #[test]
    fn test_text_dates_and_close_only_table() {
        let table = RawTable {
            index_name: None,
            index: Vec::new(),
            columns: vec![ColumnLabel::flat("Date"), ColumnLabel::flat("Close")],
            rows: vec![
                vec![RawCell::Text("2024-01-02".into()), RawCell::Number(10.0)],
                vec![RawCell::Text("2024-01-02T00:00:00Z".into()), RawCell::Number(11.0)],
                vec![RawCell::Text("2024-01-03 00:00:00".into()), RawCell::Number(12.0)],
            ],
        };
        let series = normalize(&ticker(), table).unwrap();

        assert_eq!(series.closes(), vec![11.0, 12.0]);
        let bar = series.bars()[1];
        assert_eq!((bar.open, bar.high, bar.low, bar.volume), (12.0, 12.0, 12.0, 0));
    }

    struct FailingProvider;

    #[async_trait]
    impl PriceProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch_daily_history(&self, _: &Ticker, _: Period) -> Result<RawTable, PriceProviderError> {
            Err(PriceProviderError::Network("connection reset".into()))
        }
    }

    struct HangingProvider;

    #[async_trait]
    impl PriceProvider for HangingProvider {
        fn name(&self) -> &'static str {
            "hanging"
        }

        async fn fetch_daily_history(&self, _: &Ticker, _: Period) -> Result<RawTable, PriceProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(RawTable::default())
        }
    }

    #[tokio::test]
    async fn test_provider_error_becomes_no_data() {
        let err = load_series(&FailingProvider, &ticker(), Period::SixMonths, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoData(_)));
    }

    #[tokio::test]
    async fn test_hanging_fetch_times_out_as_no_data() {
        let err = load_series(&HangingProvider, &ticker(), Period::SixMonths, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoData(_)));
    }
}
