//! MACD (Moving Average Convergence Divergence) indicator.

use super::Ema;
use crate::services::signals::Indicator;
use crate::types::{PriceBar, SignalCategory};

/// MACD indicator.
///
/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

/// MACD values as of the last bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdOutput {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Indicator for Macd {
    type Output = MacdOutput;

    fn id(&self) -> &str {
        "macd"
    }

    fn name(&self) -> &str {
        "MACD"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Trend
    }

    fn min_periods(&self) -> usize {
        self.slow_period
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<MacdOutput> {
        if bars.len() < self.min_periods() {
            return None;
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast_ema = Ema::series(&closes, self.fast_period);
        let slow_ema = Ema::series(&closes, self.slow_period);

        // Both EMAs are seeded from the first close, so they align index for index
        let macd_line: Vec<f64> = fast_ema
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();
        let signal_line = Ema::series(&macd_line, self.signal_period);

        let line = *macd_line.last()?;
        let signal = *signal_line.last()?;

        Some(MacdOutput {
            line,
            signal,
            histogram: line - signal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_bars::*;

    #[test]
    fn test_macd_min_periods() {
        let macd = Macd::default();
        assert_eq!(macd.min_periods(), 26);
        assert!(macd.calculate(&create_uptrend_bars(25)).is_none());
        assert!(macd.calculate(&create_uptrend_bars(26)).is_some());
    }

    #[test]
    fn test_macd_uptrend_positive_line() {
        let output = Macd::default().calculate(&create_uptrend_bars(60)).unwrap();
        assert!(output.line > 0.0);
        assert!(output.histogram > 0.0);
    }

    #[test]
    fn test_macd_downtrend_negative_line() {
        let output = Macd::default().calculate(&create_downtrend_bars(60)).unwrap();
        assert!(output.line < 0.0);
        assert!(output.histogram < 0.0);
    }

    #[test]
    fn test_macd_flat_is_zero() {
        let output = Macd::default().calculate(&create_flat_bars(40, 10.0)).unwrap();
        assert_eq!(output.line, 0.0);
        assert_eq!(output.signal, 0.0);
        assert_eq!(output.histogram, 0.0);
    }

    #[test]
    fn test_macd_histogram_is_line_minus_signal() {
        let output = Macd::default().calculate(&create_choppy_bars(50)).unwrap();
        assert!((output.histogram - (output.line - output.signal)).abs() < 1e-12);
    }
}
