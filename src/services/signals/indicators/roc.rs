//! Rate of Change (ROC) indicator.

use crate::services::signals::Indicator;
use crate::types::{PriceBar, SignalCategory};

/// ROC indicator.
///
/// Percentage change between the current close and the close `period + 1`
/// bars back: (p[t] - p[t-period-1]) / p[t-period-1] * 100.
pub struct Roc {
    period: usize,
}

impl Default for Roc {
    fn default() -> Self {
        Self { period: 10 }
    }
}

impl Roc {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Roc {
    type Output = f64;

    fn id(&self) -> &str {
        "roc"
    }

    fn name(&self) -> &str {
        "ROC (10)"
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
        let current = bars.last()?.close;
        let past = bars[bars.len() - self.min_periods()].close;
        Some((current - past) / past * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_bars::*;

    #[test]
    fn test_roc_min_periods() {
        let roc = Roc::default();
        assert_eq!(roc.min_periods(), 11);
        assert!(roc.calculate(&create_uptrend_bars(10)).is_none());
    }

    #[test]
    fn test_roc_known_value() {
        let mut closes = vec![100.0; 10];
        closes.push(110.0);
        let value = Roc::default().calculate(&from_closes(&closes)).unwrap();
        assert!((value - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_compares_eleven_bars_back() {
        // Only the close 11 bars from the end is the reference
        let mut closes = vec![1000.0, 50.0];
        closes.extend(vec![80.0; 9]);
        closes.push(100.0);
        let value = Roc::default().calculate(&from_closes(&closes)).unwrap();
        assert!((value - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_custom_period() {
        let value = Roc::new(1).calculate(&from_closes(&[999.0, 200.0, 100.0])).unwrap();
        assert!((value + 50.0).abs() < 1e-12);
    }
}
