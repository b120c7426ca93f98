//! Volume and buy-pressure profile.

use crate::services::signals::Indicator;
use crate::types::{PriceBar, SignalCategory};

/// Volume profile over a trailing window.
///
/// - Volume ratio: current volume / mean volume of the window
/// - Buy pressure: taker-buy volume / volume, per bar
/// - Buy-pressure ratio: current buy pressure / mean buy pressure of the window
///
/// Both ratios fall back to 1.0 when the window mean is not positive.
pub struct VolumeProfile {
    lookback: usize,
}

/// Volume profile as of the last bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeOutput {
    pub current_volume: f64,
    pub avg_volume: f64,
    pub volume_ratio: f64,
    pub current_buy_pressure: f64,
    pub avg_buy_pressure: f64,
    pub buy_pressure_ratio: f64,
}

impl Default for VolumeProfile {
    fn default() -> Self {
        Self { lookback: 20 }
    }
}

impl VolumeProfile {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }

    fn buy_pressure(bar: &PriceBar) -> f64 {
        bar.taker_buy_volume / bar.volume
    }

    fn ratio(current: f64, avg: f64) -> f64 {
        if avg > 0.0 {
            current / avg
        } else {
            1.0
        }
    }
}

impl Indicator for VolumeProfile {
    type Output = VolumeOutput;

    fn id(&self) -> &str {
        "volume"
    }

    fn name(&self) -> &str {
        "Volume / Buy Pressure"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Volume
    }

    fn min_periods(&self) -> usize {
        self.lookback
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<VolumeOutput> {
        if self.lookback == 0 || bars.len() < self.lookback {
            return None;
        }

        let window = &bars[bars.len() - self.lookback..];
        let current = bars.last()?;

        let avg_volume = window.iter().map(|b| b.volume).sum::<f64>() / window.len() as f64;

        // Zero-volume bars have no defined buy pressure; skip them in the mean
        let pressures: Vec<f64> = window
            .iter()
            .map(Self::buy_pressure)
            .filter(|p| p.is_finite())
            .collect();
        let avg_buy_pressure = if pressures.is_empty() {
            0.0
        } else {
            pressures.iter().sum::<f64>() / pressures.len() as f64
        };
        let current_buy_pressure = Self::buy_pressure(current);

        Some(VolumeOutput {
            current_volume: current.volume,
            avg_volume,
            volume_ratio: Self::ratio(current.volume, avg_volume),
            current_buy_pressure,
            avg_buy_pressure,
            buy_pressure_ratio: Self::ratio(current_buy_pressure, avg_buy_pressure),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_bars::*;

    fn bars_with_volume(volumes: &[(f64, f64)]) -> Vec<PriceBar> {
        volumes
            .iter()
            .enumerate()
            .map(|(i, (v, t))| bar(i, 100.0, *v, *t))
            .collect()
    }

    #[test]
    fn test_volume_insufficient_data() {
        let profile = VolumeProfile::default();
        assert_eq!(profile.min_periods(), 20);
        assert!(profile.calculate(&create_flat_bars(10, 1.0)).is_none());
    }

    #[test]
    fn test_volume_steady_ratios_are_one() {
        let output = VolumeProfile::default()
            .calculate(&create_choppy_bars(30))
            .unwrap();
        assert!((output.volume_ratio - 1.0).abs() < 1e-12);
        assert!((output.buy_pressure_ratio - 1.0).abs() < 1e-12);
        assert!((output.current_buy_pressure - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_volume_spike() {
        // Three bars of 100 then a spike of 500: mean 200, ratio 2.5
        let bars = bars_with_volume(&[(100.0, 50.0), (100.0, 50.0), (100.0, 50.0), (500.0, 400.0)]);
        let output = VolumeProfile::new(4).calculate(&bars).unwrap();
        assert_eq!(output.avg_volume, 200.0);
        assert_eq!(output.volume_ratio, 2.5);
        // Pressures 0.5, 0.5, 0.5, 0.8: mean 0.575
        assert!((output.avg_buy_pressure - 0.575).abs() < 1e-12);
        assert!((output.buy_pressure_ratio - 0.8 / 0.575).abs() < 1e-12);
    }

    #[test]
    fn test_volume_zero_window_falls_back_to_one() {
        let bars = bars_with_volume(&[(0.0, 0.0), (0.0, 0.0), (0.0, 0.0)]);
        let output = VolumeProfile::new(3).calculate(&bars).unwrap();
        assert_eq!(output.volume_ratio, 1.0);
        assert_eq!(output.buy_pressure_ratio, 1.0);
        assert!(output.current_buy_pressure.is_nan());
    }
}
