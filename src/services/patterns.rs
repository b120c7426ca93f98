//! Historical Pattern Analysis
//!
//! Groups forward returns of a history, usually weekly candles, by calendar
//! position and by the indicator reading at entry.
//! Features:
//! - Week-of-year, month and quarter seasonality
//! - Best and worst weeks of the year
//! - RSI, Bollinger %B and Z-Score entry ranges

use crate::services::signals::indicators::{BollingerBands, Rsi, ZScore};
use crate::services::signals::{mean, sample_std, Indicator};
use crate::types::{EntryPointAnalysis, PatternBucket, PriceSeries, ReturnStats, TimingPatterns};
use chrono::{DateTime, Datelike, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Bars ahead for the short forward return.
pub const SHORT_HORIZON: usize = 4;
/// Bars ahead for the long forward return.
pub const LONG_HORIZON: usize = 12;
/// Weeks listed in the best and worst rankings.
const RANKED_WEEKS: usize = 5;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const QUARTER_NAMES: [&str; 4] = ["Q1 (Jan-Mar)", "Q2 (Apr-Jun)", "Q3 (Jul-Sep)", "Q4 (Oct-Dec)"];

/// Entry ranges as `(low, high, label)`, each covering `(low, high]`. The
/// first range also takes its lower edge.
type Ranges = [(f64, f64, &'static str)];

const RSI_RANGES: [(f64, f64, &str); 6] = [
    (0.0, 30.0, "Oversold (<30)"),
    (30.0, 40.0, "Low (30-40)"),
    (40.0, 50.0, "Neutral-Low (40-50)"),
    (50.0, 60.0, "Neutral-High (50-60)"),
    (60.0, 70.0, "High (60-70)"),
    (70.0, 100.0, "Overbought (>70)"),
];

const PERCENT_B_RANGES: [(f64, f64, &str); 5] = [
    (-0.5, 0.0, "Below (-0.5 to 0)"),
    (0.0, 0.2, "Lower (0 to 0.2)"),
    (0.2, 0.8, "Middle (0.2 to 0.8)"),
    (0.8, 1.0, "Upper (0.8 to 1.0)"),
    (1.0, 1.5, "Above (>1.0)"),
];

const Z_SCORE_RANGES: [(f64, f64, &str); 6] = [
    (-5.0, -2.0, "Very Low (<-2)"),
    (-2.0, -1.0, "Low (-2 to -1)"),
    (-1.0, 0.0, "Slightly Low (-1 to 0)"),
    (0.0, 1.0, "Slightly High (0 to 1)"),
    (1.0, 2.0, "High (1 to 2)"),
    (2.0, 5.0, "Very High (>2)"),
];

/// Indicator readings and forward returns as of one bar.
#[derive(Debug, Clone, Copy)]
struct Observation {
    date: DateTime<Utc>,
    rsi: Option<f64>,
    percent_b: Option<f64>,
    z_score: Option<f64>,
    forward_short: Option<f64>,
    forward_long: Option<f64>,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// `close[i + horizon] / close[i] - 1`, if that bar exists.
fn forward_return(closes: &[f64], i: usize, horizon: usize) -> Option<f64> {
    closes.get(i + horizon).map(|future| future / closes[i] - 1.0)
}

fn observations(history: &PriceSeries) -> Vec<Observation> {
    let bars = history.bars();
    let closes = history.closes();
    let rsi = Rsi::default();
    let bollinger = BollingerBands::default();
    let zscore = ZScore::default();

    (0..bars.len())
        .map(|i| {
            let prefix = &bars[..=i];
            Observation {
                date: bars[i].datetime(),
                rsi: finite(rsi.calculate(prefix)),
                percent_b: finite(bollinger.calculate(prefix).map(|b| b.percent_b)),
                z_score: finite(zscore.calculate(prefix)),
                forward_short: forward_return(&closes, i, SHORT_HORIZON),
                forward_long: forward_return(&closes, i, LONG_HORIZON),
            }
        })
        .collect()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    match n {
        0 => f64::NAN,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// Mean, median, sample stdev and count. `None` for no values.
pub fn return_stats(values: &[f64]) -> Option<ReturnStats> {
    if values.is_empty() {
        return None;
    }
    Some(ReturnStats {
        mean: mean(values),
        median: median(values),
        std_dev: sample_std(values),
        count: values.len(),
    })
}

fn average(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let present: Vec<f64> = values.flatten().collect();
    (!present.is_empty()).then(|| mean(&present))
}

/// Summarise a group of bars. `None` when none of them has a short forward
/// return.
fn bucket(label: String, group: &[&Observation]) -> Option<PatternBucket> {
    let short: Vec<f64> = group.iter().filter_map(|o| o.forward_short).collect();
    let long: Vec<f64> = group.iter().filter_map(|o| o.forward_long).collect();

    Some(PatternBucket {
        label,
        forward_4: return_stats(&short)?,
        forward_12: return_stats(&long),
        avg_rsi: average(group.iter().map(|o| o.rsi)),
        avg_percent_b: average(group.iter().map(|o| o.percent_b)),
        avg_z_score: average(group.iter().map(|o| o.z_score)),
    })
}

fn by_calendar<K: Ord + Copy>(
    observations: &[Observation],
    key: impl Fn(&Observation) -> K,
    label: impl Fn(K) -> String,
) -> Vec<PatternBucket> {
    let mut groups: BTreeMap<K, Vec<&Observation>> = BTreeMap::new();
    for observation in observations {
        groups.entry(key(observation)).or_default().push(observation);
    }
    groups
        .into_iter()
        .filter_map(|(k, group)| bucket(label(k), &group))
        .collect()
}

fn by_range(
    observations: &[&Observation],
    ranges: &Ranges,
    value: impl Fn(&Observation) -> Option<f64>,
) -> Vec<PatternBucket> {
    ranges
        .iter()
        .enumerate()
        .filter_map(|(i, (low, high, label))| {
            let group: Vec<&Observation> = observations
                .iter()
                .copied()
                .filter(|o| {
                    value(*o).is_some_and(|v| (v > *low || (i == 0 && v == *low)) && v <= *high)
                })
                .collect();
            bucket(label.to_string(), &group)
        })
        .collect()
}

fn ranked_weeks(weeks: &[PatternBucket], best_first: bool) -> Vec<PatternBucket> {
    let mut ranked = weeks.to_vec();
    ranked.sort_by(|a, b| {
        let order = a.forward_4.mean.total_cmp(&b.forward_4.mean);
        if best_first {
            order.reverse()
        } else {
            order
        }
    });
    ranked.truncate(RANKED_WEEKS);
    ranked
}

/// Forward returns grouped by ISO week of the year, month and quarter.
///
/// Groups where no bar has a 4-bar forward return are left out.
pub fn analyze_timing_patterns(history: &PriceSeries) -> TimingPatterns {
    let observations = observations(history);

    let by_week_of_year = by_calendar(
        &observations,
        |o| o.date.iso_week().week(),
        |week| format!("Week {}", week),
    );
    let by_month = by_calendar(
        &observations,
        |o| o.date.month0(),
        |month| MONTH_NAMES[month as usize].to_string(),
    );
    let by_quarter = by_calendar(
        &observations,
        |o| o.date.month0() / 3,
        |quarter| QUARTER_NAMES[quarter as usize].to_string(),
    );

    info!(
        "Timing patterns over {} bars: {} weeks, {} months, {} quarters",
        observations.len(),
        by_week_of_year.len(),
        by_month.len(),
        by_quarter.len()
    );

    TimingPatterns {
        best_weeks: ranked_weeks(&by_week_of_year, true),
        worst_weeks: ranked_weeks(&by_week_of_year, false),
        by_week_of_year,
        by_month,
        by_quarter,
    }
}

/// Forward returns grouped by RSI, %B and Z-Score range at entry.
///
/// Only bars where all three indicators are defined and a 4-bar forward
/// return exists are counted. Empty ranges are left out.
pub fn analyze_entry_points(history: &PriceSeries) -> EntryPointAnalysis {
    let observations = observations(history);
    let valid: Vec<&Observation> = observations
        .iter()
        .filter(|o| {
            o.rsi.is_some() && o.percent_b.is_some() && o.z_score.is_some() && o.forward_short.is_some()
        })
        .collect();
    debug!("Entry point analysis: {} of {} bars usable", valid.len(), observations.len());

    EntryPointAnalysis {
        rsi: by_range(&valid, &RSI_RANGES, |o| o.rsi),
        percent_b: by_range(&valid, &PERCENT_B_RANGES, |o| o.percent_b),
        z_score: by_range(&valid, &Z_SCORE_RANGES, |o| o.z_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_bars::*;
    use crate::types::{PriceBar, MS_PER_DAY};

    const MS_PER_WEEK: i64 = 7 * MS_PER_DAY;

    fn weekly(closes: &[f64]) -> PriceSeries {
        let bars: Vec<PriceBar> = closes
            .iter()
            .enumerate()
            .map(|(i, close)| PriceBar {
                timestamp: START + i as i64 * MS_PER_WEEK,
                close_time: START + (i as i64 + 1) * MS_PER_WEEK - 1,
                open: *close,
                high: *close,
                low: *close,
                close: *close,
                volume: 1000.0,
                taker_buy_volume: 500.0,
            })
            .collect();
        PriceSeries::new(bars)
    }

    /// Three years of weekly closes that only rise during March.
    fn march_rally() -> PriceSeries {
        let mut closes: Vec<f64> = Vec::with_capacity(156);
        let mut price = 100.0;
        for i in 0..156 {
            let date = DateTime::from_timestamp_millis(START + i as i64 * MS_PER_WEEK).unwrap();
            if i > 0 && date.month() == 3 {
                price *= 1.05;
            }
            closes.push(price);
        }
        weekly(&closes)
    }

    #[test]
    fn test_forward_return() {
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(forward_return(&closes, 0, 4), Some(4.0));
        assert_eq!(forward_return(&closes, 1, 4), None);
    }

    #[test]
    fn test_return_stats() {
        let stats = return_stats(&[0.1, -0.1, 0.3, 0.5]).unwrap();
        assert!((stats.mean - 0.2).abs() < 1e-12);
        assert!((stats.median - 0.2).abs() < 1e-12);
        assert_eq!(stats.count, 4);
        assert!(return_stats(&[]).is_none());
        assert!(return_stats(&[0.1]).unwrap().std_dev.is_nan());
    }

    #[test]
    fn test_timing_patterns_find_march_rally() {
        let patterns = analyze_timing_patterns(&march_rally());

        assert_eq!(patterns.by_month.len(), 12);
        assert_eq!(patterns.by_quarter.len(), 4);
        for month in &patterns.by_month {
            let rallies = month.label == "Feb" || month.label == "Mar";
            assert_eq!(month.forward_4.mean > 0.0, rallies, "{}", month.label);
            if !rallies {
                assert_eq!(month.forward_4.mean, 0.0, "{}", month.label);
            }
        }
        assert_eq!(patterns.by_quarter[0].label, "Q1 (Jan-Mar)");
        assert!(patterns.by_quarter[0].forward_4.mean > 0.0);
        assert!(patterns.by_quarter[1..].iter().all(|q| q.forward_4.mean == 0.0));

        // The last four bars have no forward return
        let counted: usize = patterns.by_month.iter().map(|m| m.forward_4.count).sum();
        assert_eq!(counted, 152);

        assert_eq!(patterns.best_weeks.len(), 5);
        assert!(patterns.best_weeks[0].forward_4.mean > 0.0);
        assert!(patterns
            .best_weeks
            .windows(2)
            .all(|w| w[0].forward_4.mean >= w[1].forward_4.mean));
        assert!(patterns.worst_weeks.iter().all(|w| w.forward_4.mean == 0.0));
    }

    #[test]
    fn test_entry_points_in_downtrend() {
        let analysis = analyze_entry_points(&PriceSeries::new(create_downtrend_bars(60)));

        // Bars 19..=55 have every indicator and a 4-bar forward return
        assert_eq!(analysis.rsi.len(), 1);
        assert_eq!(analysis.rsi[0].label, "Oversold (<30)");
        assert_eq!(analysis.rsi[0].forward_4.count, 37);
        assert_eq!(analysis.rsi[0].forward_12.map(|s| s.count), Some(29));
        assert!(analysis.rsi[0].forward_4.mean < 0.0);
        assert_eq!(analysis.rsi[0].avg_rsi, Some(0.0));

        assert_eq!(analysis.z_score.len(), 1);
        assert_eq!(analysis.z_score[0].label, "Low (-2 to -1)");
        assert_eq!(analysis.percent_b.len(), 1);
        assert_eq!(analysis.percent_b[0].label, "Lower (0 to 0.2)");
    }

    #[test]
    fn test_empty_history() {
        let history = PriceSeries::default();
        let patterns = analyze_timing_patterns(&history);
        assert!(patterns.by_week_of_year.is_empty());
        assert!(patterns.best_weeks.is_empty());
        let entries = analyze_entry_points(&history);
        assert!(entries.rsi.is_empty() && entries.percent_b.is_empty() && entries.z_score.is_empty());
    }
}
