//! Relative Strength Index (RSI) indicator.

use crate::services::signals::{mean, trailing_closes, Indicator};
use crate::types::{PriceBar, SignalCategory};

/// RSI (Relative Strength Index) indicator.
///
/// Measures momentum by comparing recent gains to recent losses.
/// Average gain and loss are simple means of the last `period` close-to-close
/// deltas. Values range from 0-100:
/// - Below 30: Oversold
/// - Above 70: Overbought
///
/// With no losses in the window the ratio is infinite and RSI is 100. With
/// no movement at all the ratio is 0/0 and RSI is NaN; callers decide what
/// NaN means.
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// RSI over the last `period` deltas of `closes`.
    pub fn from_closes(closes: &[f64], period: usize) -> Option<f64> {
        if period == 0 || closes.len() < period + 1 {
            return None;
        }

        let window = &closes[closes.len() - period - 1..];
        let (gains, losses): (Vec<f64>, Vec<f64>) = window
            .windows(2)
            .map(|pair| {
                let change = pair[1] - pair[0];
                if change > 0.0 {
                    (change, 0.0)
                } else {
                    (0.0, -change)
                }
            })
            .unzip();

        let rs = mean(&gains) / mean(&losses);
        Some(100.0 - (100.0 / (1.0 + rs)))
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn id(&self) -> &str {
        "rsi"
    }

    fn name(&self) -> &str {
        "RSI (14)"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Momentum
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<f64> {
        if bars.len() < self.min_periods() {
            return None;
        }
        Self::from_closes(&trailing_closes(bars, self.min_periods()), self.period)
    }
}
