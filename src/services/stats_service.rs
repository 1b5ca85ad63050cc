use crate::models::{Analysis, RsiSignal, Series, StatsSummary};

/// Percent change of the latest close over the previous one; 0 with fewer than two bars.
pub fn percent_change(series: &Series) -> f64 {
    match (series.latest(), series.previous()) {
        (Some(latest), Some(prev)) if prev.close != 0.0 => (latest.close - prev.close) / prev.close * 100.0,
        _ => 0.0,
    }
}

/// Headline statistics for the statistics panel, `None` for an empty series.
pub fn summarize(analysis: &Analysis) -> Option<StatsSummary> {
    let latest = analysis.series.latest()?;
    let rsi = analysis.indicators.latest_rsi();

    Some(StatsSummary {
        current_price: latest.close,
        change_pct: percent_change(&analysis.series),
        day_high: latest.high,
        day_low: latest.low,
        volume: latest.volume,
        rsi,
        rsi_signal: RsiSignal::classify(rsi),
    })
}
