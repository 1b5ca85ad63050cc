use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use tracing::info;

use crate::errors::AppError;
use crate::models::{Analysis, IndicatorColumn};

const BAR_HEADERS: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

/// `{TICKER}_{YYYYMMDD_HHMMSS}.csv`
pub fn export_file_name(ticker: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}.csv", ticker, at.format("%Y%m%d_%H%M%S"))
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes one row per bar with every indicator column; absent values are left empty.
pub fn write_csv(analysis: &Analysis, path: &Path) -> Result<(), AppError> {
    let mut writer = WriterBuilder::new().from_path(path)?;

    let headers = BAR_HEADERS
        .iter()
        .copied()
        .chain(IndicatorColumn::ALL.iter().map(|c| c.name()));
    writer.write_record(headers)?;

    for (i, bar) in analysis.series.bars().iter().enumerate() {
        let mut record = vec![
            bar.date.format("%Y-%m-%d").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ];
        record.extend(
            IndicatorColumn::ALL
                .iter()
                .map(|c| format_value(analysis.indicators.value(*c, i))),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Exports `analysis` into `dir`, creating it if needed, and returns the file path.
pub fn export_analysis(analysis: &Analysis, dir: &Path, at: DateTime<Utc>) -> Result<PathBuf, AppError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(analysis.ticker.as_str(), at));
    write_csv(analysis, &path)?;

    info!("Exported {} rows for {} to {}", analysis.series.len(), analysis.ticker, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bar, Period, Series, Ticker};
    use crate::services::indicators;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn analysis(n: usize) -> Analysis {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = Series::new(
            (0..n)
                .map(|i| Bar {
                    date: start + Duration::days(i as i64),
                    open: 10.0,
                    high: 12.0,
                    low: 9.0,
                    close: 10.0 + i as f64,
                    volume: 42,
                })
                .collect(),
        );
        Analysis {
            ticker: Ticker::parse("TSLA").unwrap(),
            period: Period::OneMonth,
            indicators: indicators::compute(&series),
            series,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_file_name_format() {
        let at = Utc.with_ymd_and_hms(2024, 7, 4, 9, 5, 3).unwrap();
        assert_eq!(export_file_name("AAPL", at), "AAPL_20240704_090503.csv");
    }

    #[test]
    fn test_export_writes_all_columns() {
        let dir = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 7, 4, 9, 5, 3).unwrap();

        let path = export_analysis(&analysis(25), &dir.path().join("nested"), at).unwrap();
        assert!(path.ends_with("TSLA_20240704_090503.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 6 + IndicatorColumn::ALL.len());
        assert_eq!(&headers[0], "Date");
        assert_eq!(&headers[6], "SMA_20");

        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 25);
        assert_eq!(&rows[0][0], "2024-01-01");
        // SMA_20 is absent for the first 19 rows
        assert_eq!(&rows[18][6], "");
        assert!(rows[19][6].parse::<f64>().is_ok());
    }

    #[test]
    fn test_unwritable_directory_is_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let err = export_analysis(&analysis(3), &blocker, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Export(_)));
    }
}
