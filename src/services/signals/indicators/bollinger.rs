//! Bollinger Bands indicator.

use crate::services::signals::{is_flat, mean, population_std, trailing_closes, Indicator};
use crate::types::{PriceBar, SignalCategory};

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// StdDev is the population standard deviation of the window.
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

/// Band values and %B as of the last bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerOutput {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// (price - lower) / (upper - lower). NaN when the bands collapse.
    pub percent_b: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            period,
            std_dev_multiplier,
        }
    }
}

impl Indicator for BollingerBands {
    type Output = BollingerOutput;

    fn id(&self) -> &str {
        "bollinger"
    }

    fn name(&self) -> &str {
        "Bollinger Bands"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Volatility
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<BollingerOutput> {
        if self.period == 0 || bars.len() < self.period {
            return None;
        }

        let closes = trailing_closes(bars, self.period);
        let current_price = bars.last()?.close;

        // Flat window: bands collapse onto the price and %B is left undefined
        if is_flat(&closes) {
            return Some(BollingerOutput {
                upper: current_price,
                middle: current_price,
                lower: current_price,
                percent_b: f64::NAN,
            });
        }

        let middle = mean(&closes);
        let std_dev = population_std(&closes);
        let upper = middle + self.std_dev_multiplier * std_dev;
        let lower = middle - self.std_dev_multiplier * std_dev;
        let percent_b = (current_price - lower) / (upper - lower);

        Some(BollingerOutput {
            upper,
            middle,
            lower,
            percent_b,
        })
    }
}
