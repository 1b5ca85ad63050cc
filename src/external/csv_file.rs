use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use csv::ReaderBuilder;
use tracing::debug;

use crate::external::price_provider::{ColumnLabel, PriceProvider, PriceProviderError, RawCell, RawTable};
use crate::models::{Period, Ticker};

/// Offline provider reading `{data_dir}/{TICKER}.csv`.
///
/// Files are expected to carry a header row; a `Date` column is used to cut
/// the table down to the requested period.
pub struct CsvFileProvider {
    data_dir: PathBuf,
}

impl CsvFileProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    fn path_for(&self, ticker: &Ticker) -> PathBuf {
        self.data_dir.join(format!("{}.csv", ticker))
    }
}

fn parse_cell(raw: &str) -> RawCell {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") || trimmed.eq_ignore_ascii_case("null") {
        return RawCell::Missing;
    }
    match trimmed.parse::<f64>() {
        Ok(v) => RawCell::Number(v),
        Err(_) => RawCell::Text(trimmed.to_string()),
    }
}

fn read_table(path: &Path) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let columns = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .iter()
        .map(|h| ColumnLabel::flat(h.trim()))
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Failed to read row of {}", path.display()))?;
        let mut row: Vec<RawCell> = record.iter().map(parse_cell).collect();
        row.resize(columns.len(), RawCell::Missing);
        rows.push(row);
    }

    Ok(RawTable {
        index_name: None,
        index: Vec::new(),
        columns,
        rows,
    })
}

fn row_date(row: &[RawCell], date_col: usize) -> Option<NaiveDate> {
    row.get(date_col).and_then(RawCell::as_date)
}

/// Keeps rows within `period` of the newest dated row. Rows without a
/// readable date are left for the normalizer to judge.
fn restrict_to_period(mut table: RawTable, period: Period) -> RawTable {
    let Some(date_col) = table.columns.iter().position(|c| c.flatten() == "Date") else {
        return table;
    };
    let Some(newest) = table.rows.iter().filter_map(|r| row_date(r, date_col)).max() else {
        return table;
    };
    let cutoff = newest - Duration::days(period.calendar_days());

    table
        .rows
        .retain(|row| row_date(row, date_col).map_or(true, |d| d > cutoff));
    table
}

#[async_trait]
impl PriceProvider for CsvFileProvider {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn fetch_daily_history(
        &self,
        ticker: &Ticker,
        period: Period,
    ) -> Result<RawTable, PriceProviderError> {
        let path = self.path_for(ticker);
        if !path.exists() {
            return Err(PriceProviderError::NotFound);
        }
        debug!("Reading {} for {}", path.display(), ticker);

        let table = tokio::task::spawn_blocking(move || read_table(&path))
            .await
            .map_err(|e| PriceProviderError::BadResponse(e.to_string()))?
            .map_err(|e| PriceProviderError::Parse(format!("{:#}", e)))?;

        Ok(restrict_to_period(table, period))
    }
}
