//! Exponential Moving Average (EMA).

/// EMA series used by MACD.
///
/// Recursive definition with smoothing factor 2 / (span + 1), seeded from
/// the first value of the series rather than from an SMA.
pub struct Ema;

impl Ema {
    /// EMA at every point of `values`.
    pub fn series(values: &[f64], span: usize) -> Vec<f64> {
        let alpha = 2.0 / (span as f64 + 1.0);
        let mut ema = Vec::with_capacity(values.len());
        let mut current = match values.first() {
            Some(first) => *first,
            None => return ema,
        };
        ema.push(current);
        for value in &values[1..] {
            current += alpha * (value - current);
            ema.push(current);
        }
        ema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_seeded_from_first_value() {
        // span 3 -> alpha 0.5
        let ema = Ema::series(&[10.0, 20.0, 20.0], 3);
        assert_eq!(ema, vec![10.0, 15.0, 17.5]);
    }

    #[test]
    fn test_ema_empty_series() {
        assert!(Ema::series(&[], 12).is_empty());
    }

    #[test]
    fn test_ema_lags_uptrend() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64 * 1.5).collect();
        let ema = Ema::series(&closes, 12);
        assert_eq!(ema.len(), 40);
        assert!(ema[39] < closes[39]);
        assert!(ema.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_ema_flat_series_is_exact() {
        let ema = Ema::series(&[0.1; 30], 26);
        assert!(ema.iter().all(|v| *v == 0.1));
    }
}
