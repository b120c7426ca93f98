//! Z-Score indicator.

use crate::services::signals::{is_flat, mean, sample_std, trailing_closes, Indicator};
use crate::types::{PriceBar, SignalCategory};

/// Z-Score of the current price against its trailing window.
///
/// (price - mean) / stdev over the last `lookback` closes, using the sample
/// standard deviation. A flat window scores exactly 0.
pub struct ZScore {
    lookback: usize,
}

impl Default for ZScore {
    fn default() -> Self {
        Self { lookback: 20 }
    }
}

impl ZScore {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }
}

impl Indicator for ZScore {
    type Output = f64;

    fn id(&self) -> &str {
        "zscore"
    }

    fn name(&self) -> &str {
        "Z-Score (20)"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Volatility
    }

    fn min_periods(&self) -> usize {
        self.lookback
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<f64> {
        if self.lookback < 2 || bars.len() < self.lookback {
            return None;
        }

        let closes = trailing_closes(bars, self.lookback);
        if is_flat(&closes) {
            return Some(0.0);
        }
        let std_dev = sample_std(&closes);

        let current_price = bars.last()?.close;
        Some((current_price - mean(&closes)) / std_dev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_bars::*;

    #[test]
    fn test_zscore_min_periods() {
        assert_eq!(ZScore::default().min_periods(), 20);
        assert!(ZScore::default().calculate(&create_uptrend_bars(19)).is_none());
    }

    #[test]
    fn test_zscore_flat_is_zero() {
        let z = ZScore::default().calculate(&create_flat_bars(25, 42.0));
        assert_eq!(z, Some(0.0));
    }

    #[test]
    fn test_zscore_flat_inexact_prices() {
        // Sums of these prices carry rounding error
        for price in [0.1, 0.3, 27123.37] {
            let z = ZScore::default().calculate(&create_flat_bars(40, price));
            assert_eq!(z, Some(0.0), "price {}", price);
        }
    }

    #[test]
    fn test_zscore_known_value() {
        // Window [1, 2, 3]: mean 2, sample std 1, price 3
        let z = ZScore::new(3).calculate(&from_closes(&[9.0, 1.0, 2.0, 3.0]));
        assert_eq!(z, Some(1.0));
    }

    #[test]
    fn test_zscore_sign_follows_trend() {
        let up = ZScore::default().calculate(&create_uptrend_bars(30)).unwrap();
        let down = ZScore::default().calculate(&create_downtrend_bars(30)).unwrap();
        assert!(up > 1.0);
        assert!(down < -1.0);
        assert!((up + down).abs() < 1e-9);
    }
}
