use crate::models::{IndicatorSet, Series};

pub const SMA_SHORT: usize = 20;
pub const SMA_LONG: usize = 50;
pub const EMA_FAST: usize = 12;
pub const EMA_SLOW: usize = 26;
pub const EMA_OVERLAY: usize = 20;
pub const MACD_SIGNAL: usize = 9;
pub const RSI_PERIOD: usize = 14;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD_DEV: f64 = 2.0;

/// Computes every indicator column from the closes of `series`.
///
/// Each column depends only on past and current closes, so the columns are
/// independent of each other and of evaluation order.
pub fn compute(series: &Series) -> IndicatorSet {
    let closes = series.closes();

    let ema_12 = ema(&closes, EMA_FAST);
    let ema_26 = ema(&closes, EMA_SLOW);
    let (macd_line, signal_line, histogram) = macd(&closes, EMA_FAST, EMA_SLOW, MACD_SIGNAL);
    let (bb_middle, bb_upper, bb_lower) = bollinger_bands(&closes, BOLLINGER_PERIOD, BOLLINGER_STD_DEV);

    IndicatorSet {
        sma_20: sma(&closes, SMA_SHORT),
        sma_50: sma(&closes, SMA_LONG),
        ema_12,
        ema_26,
        ema_20: ema(&closes, EMA_OVERLAY),
        macd: macd_line,
        macd_signal: signal_line,
        macd_histogram: histogram,
        rsi_14: rsi(&closes, RSI_PERIOD),
        bb_middle,
        bb_upper,
        bb_lower,
    }
}

/// Simple Moving Average (SMA)
/// Returns a vector aligned with `values`:
/// - `None` until enough values exist
/// - `Some(avg)` after `window` values
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    // Running sum; subtract the value that falls out of the window.
    values
        .iter()
        .enumerate()
        .scan(0.0_f64, move |sum, (i, &v)| {
            *sum += v;
            if i >= window {
                *sum -= values[i - window];
            }

            let out = if i + 1 >= window {
                Some(*sum / window as f64)
            } else {
                None
            };

            Some(out)
        })
        .collect()
}

/// Exponential Moving Average (EMA), recursive form without bias adjustment:
/// `ema[0] = v[0]`, `ema[i] = alpha * v[i] + (1 - alpha) * ema[i-1]`,
/// `alpha = 2 / (span + 1)`.
///
/// Defined from the first value on; only a zero span yields absents.
pub fn ema(values: &[f64], span: usize) -> Vec<Option<f64>> {
    if values.is_empty() || span == 0 {
        return vec![None; values.len()];
    }

    let alpha = 2.0 / (span as f64 + 1.0);

    values
        .iter()
        .scan(None::<f64>, move |prev, &v| {
            let next = match *prev {
                Some(p) => alpha * v + (1.0 - alpha) * p,
                None => v,
            };
            *prev = Some(next);
            Some(Some(next))
        })
        .collect()
}

/// EMA over a column that may have absents; the recursion starts at the
/// first defined value and absents stay absent.
fn ema_of_optional(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    let defined: Vec<f64> = values.iter().filter_map(|&v| v).collect();
    let mut smoothed = ema(&defined, span).into_iter();

    values
        .iter()
        .map(|v| v.and_then(|_| smoothed.next().flatten()))
        .collect()
}

/// Relative Strength Index (RSI)
///
/// Measures momentum by comparing recent gains to recent losses.
/// RSI values range from 0 to 100:
/// - Below 30: Oversold
/// - Above 70: Overbought
///
/// Calculation:
/// 1. Price changes between consecutive closes (none for the first close)
/// 2. Simple rolling mean of gains and of losses over `period` changes
/// 3. RS = Average Gain / Average Loss
/// 4. RSI = 100 - (100 / (1 + RS))
///
/// A window without losses has RSI 100, and a window without any movement
/// has RSI 50.
///
/// Returns `None` for the first `period` values, then `Some(rsi)`.
pub fn rsi(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; prices.len()];
    if prices.len() < 2 || period == 0 {
        return result;
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = prices
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    // Window sums are taken fresh for every position so a run of zero losses
    // stays exactly zero.
    for (i, (gain_window, loss_window)) in gains.windows(period).zip(losses.windows(period)).enumerate() {
        let avg_gain = gain_window.iter().sum::<f64>() / period as f64;
        let avg_loss = loss_window.iter().sum::<f64>() / period as f64;

        let value = if avg_loss == 0.0 {
            if avg_gain == 0.0 { 50.0 } else { 100.0 }
        } else {
            100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
        };

        // change i + period - 1 belongs to price i + period
        result[i + period] = Some(value);
    }

    result
}

/// Moving Average Convergence Divergence (MACD)
///
/// Components:
/// - MACD Line: fast EMA - slow EMA
/// - Signal Line: EMA of the MACD Line
/// - Histogram: MACD Line - Signal Line
///
/// Returns: (macd_line, signal_line, histogram) as three separate Vec<Option<f64>>
pub fn macd(
    prices: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> (Vec<Option<f64>>, Vec<Option<f64>>, Vec<Option<f64>>) {
    let fast_ema = ema(prices, fast_period);
    let slow_ema = ema(prices, slow_period);

    let macd_line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(fast, slow)| Some((*fast)? - (*slow)?))
        .collect();

    let signal_line = ema_of_optional(&macd_line, signal_period);

    let histogram = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    (macd_line, signal_line, histogram)
}

/// Sample standard deviation (n - 1 denominator) of a window around `mean`.
fn sample_std_dev(window: &[f64], mean: f64) -> f64 {
    if window.len() < 2 {
        return 0.0;
    }
    let variance = window
        .iter()
        .map(|&x| {
            let diff = x - mean;
            diff * diff
        })
        .sum::<f64>()
        / (window.len() - 1) as f64;
    variance.sqrt()
}

/// Bollinger Bands
///
/// Volatility envelope around a moving average.
///
/// Components:
/// - Middle Band: SMA of prices
/// - Upper Band: Middle Band + (std_dev * num_std_dev)
/// - Lower Band: Middle Band - (std_dev * num_std_dev)
///
/// The deviation is the rolling sample standard deviation of the same window.
///
/// Returns: (middle_band, upper_band, lower_band) as three separate Vec<Option<f64>>
pub fn bollinger_bands(
    prices: &[f64],
    period: usize,
    num_std_dev: f64,
) -> (Vec<Option<f64>>, Vec<Option<f64>>, Vec<Option<f64>>) {
    let middle_band = sma(prices, period);
    let len = prices.len();

    let mut upper_band: Vec<Option<f64>> = vec![None; len];
    let mut lower_band: Vec<Option<f64>> = vec![None; len];

    for (i, mean) in middle_band.iter().enumerate() {
        let Some(mean) = *mean else { continue };
        let window = &prices[i + 1 - period..=i];
        let offset = num_std_dev * sample_std_dev(window, mean);

        upper_band[i] = Some(mean + offset);
        lower_band[i] = Some(mean - offset);
    }

    (middle_band, upper_band, lower_band)
}
