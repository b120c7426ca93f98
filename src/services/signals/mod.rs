//! Technical indicator service module.
//!
//! Provides the indicator calculations the composite scorer consumes and
//! the snapshot that collects them as of the last bar of a window.

pub mod indicators;

use crate::error::{AppError, Result};
use crate::types::{IndicatorSnapshot, PriceBar, SignalCategory};
use indicators::{BollingerBands, Macd, Roc, Rsi, VolumeProfile, ZScore};

/// Trait for implementing technical indicators.
pub trait Indicator: Send + Sync {
    /// Value produced by the indicator.
    type Output;

    /// Unique identifier for this indicator.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Category this indicator belongs to.
    fn category(&self) -> SignalCategory;

    /// Minimum number of bars required for calculation.
    fn min_periods(&self) -> usize;

    /// Calculate the indicator as of the last bar.
    /// Returns None if there are fewer than `min_periods` bars.
    fn calculate(&self, bars: &[PriceBar]) -> Option<Self::Output>;
}

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). NaN below two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Population standard deviation (n denominator).
pub fn population_std(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Whether every value equals the first one.
///
/// Checked directly on the prices: summing a run of equal floats can leave
/// rounding noise that a stdev comparison against zero would miss.
pub fn is_flat(values: &[f64]) -> bool {
    values.first().map_or(true, |first| values.iter().all(|v| v == first))
}

/// Closing prices of the trailing `count` bars, oldest first.
pub fn trailing_closes(bars: &[PriceBar], count: usize) -> Vec<f64> {
    let start = bars.len().saturating_sub(count);
    bars[start..].iter().map(|b| b.close).collect()
}

/// Largest lookback among the indicators in a snapshot.
pub fn snapshot_lookback() -> usize {
    [
        Rsi::default().min_periods(),
        BollingerBands::default().min_periods(),
        ZScore::default().min_periods(),
        VolumeProfile::default().min_periods(),
        Macd::default().min_periods(),
        Roc::default().min_periods(),
    ]
    .into_iter()
    .max()
    .unwrap_or_default()
}

impl IndicatorSnapshot {
    /// Compute every indicator as of the last bar of `bars`.
    pub fn from_series(bars: &[PriceBar]) -> Result<Self> {
        let required = snapshot_lookback();
        let insufficient = || AppError::InsufficientData {
            required,
            available: bars.len(),
        };

        let last = bars.last().ok_or_else(insufficient)?;
        if bars.len() < required {
            return Err(insufficient());
        }

        let rsi = Rsi::default().calculate(bars).ok_or_else(insufficient)?;
        let bollinger = BollingerBands::default()
            .calculate(bars)
            .ok_or_else(insufficient)?;
        let z_score = ZScore::default().calculate(bars).ok_or_else(insufficient)?;
        let volume = VolumeProfile::default()
            .calculate(bars)
            .ok_or_else(insufficient)?;
        let macd = Macd::default().calculate(bars).ok_or_else(insufficient)?;
        let roc = Roc::default().calculate(bars).ok_or_else(insufficient)?;

        Ok(Self {
            rsi,
            bollinger_upper: bollinger.upper,
            bollinger_middle: bollinger.middle,
            bollinger_lower: bollinger.lower,
            bollinger_percent_b: bollinger.percent_b,
            z_score,
            current_volume: volume.current_volume,
            avg_volume: volume.avg_volume,
            volume_ratio: volume.volume_ratio,
            current_buy_pressure: volume.current_buy_pressure,
            avg_buy_pressure: volume.avg_buy_pressure,
            buy_pressure_ratio: volume.buy_pressure_ratio,
            macd_line: macd.line,
            macd_signal: macd.signal,
            macd_histogram: macd.histogram,
            roc,
            current_price: last.close,
            timestamp: last.timestamp,
        })
    }
}
