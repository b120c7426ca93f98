//! Weekday Pattern Analyzer
//!
//! Ranks weekdays by their recent next-bar returns and scores how the chosen
//! weekday's own daily returns compare with the rest of the week.
//! Features:
//! - Per-weekday forward-return statistics over a 180-day window
//! - Best weekday selection with a confidence label
//! - Short-horizon day-advantage score over a 90-day window

use crate::services::signals::{mean, sample_std};
use crate::types::{
    trailing_days, BestDayResult, Confidence, DayPatternScore, PriceBar, WeekdayStats, WEEKDAYS,
};
use chrono::Weekday;
use tracing::debug;

/// Trailing window of the best-weekday analysis.
pub const BEST_DAY_WINDOW_DAYS: i64 = 180;
/// Rows required in the best-weekday window.
pub const BEST_DAY_MIN_ROWS: usize = 30;
/// Trailing window of the day-advantage score.
pub const DAY_PATTERN_WINDOW_DAYS: i64 = 90;
/// Rows required in the day-advantage window.
pub const DAY_PATTERN_MIN_ROWS: usize = 10;
/// Observations a weekday needs before it is considered.
pub const MIN_DAY_SAMPLES: usize = 3;

/// Next-bar return of each bar in `window` that has a following bar.
///
/// The last bar has no forward return and is not a sample: it counts
/// toward neither `sample_count` nor the `positive_rate` denominator.
fn forward_returns(window: &[PriceBar]) -> Vec<(Weekday, f64)> {
    window
        .windows(2)
        .map(|pair| {
            let ret = (pair[1].close - pair[0].close) / pair[0].close;
            (pair[0].weekday(), ret)
        })
        .collect()
}

fn weekday_stats(weekday: Weekday, returns: &[f64]) -> WeekdayStats {
    let avg_forward_return = mean(returns);
    let positive_rate = returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64;
    let volatility = sample_std(returns);

    WeekdayStats {
        weekday,
        avg_forward_return,
        positive_rate,
        volatility,
        sample_count: returns.len(),
        combined_score: avg_forward_return + positive_rate * 0.02 - volatility * 0.1,
    }
}

/// Identify the weekday with the best recent next-bar behaviour.
///
/// `bars` is a chronological daily history. Only the trailing 180 days are
/// used. Returns [`BestDayResult::degenerate`] when the window holds fewer
/// than 30 rows or no weekday has enough observations.
pub fn analyze_weekdays(bars: &[PriceBar]) -> BestDayResult {
    let window = trailing_days(bars, BEST_DAY_WINDOW_DAYS);
    if window.len() < BEST_DAY_MIN_ROWS {
        debug!(
            "Weekday analysis: {} rows in window, need {}",
            window.len(),
            BEST_DAY_MIN_ROWS
        );
        return BestDayResult::degenerate();
    }

    let returns = forward_returns(window);
    let per_day: Vec<WeekdayStats> = WEEKDAYS
        .iter()
        .filter_map(|day| {
            let day_returns: Vec<f64> = returns
                .iter()
                .filter(|(d, _)| d == day)
                .map(|(_, r)| *r)
                .collect();
            (day_returns.len() >= MIN_DAY_SAMPLES).then(|| weekday_stats(*day, &day_returns))
        })
        .collect();

    // First maximum wins, Monday first
    let mut best: Option<&WeekdayStats> = None;
    for stats in per_day.iter().filter(|s| s.combined_score.is_finite()) {
        if best.map_or(true, |b| stats.combined_score > b.combined_score) {
            best = Some(stats);
        }
    }
    let Some(best) = best.copied() else {
        return BestDayResult::degenerate();
    };

    let total_samples: usize = per_day.iter().map(|s| s.sample_count).sum();
    let scores: Vec<f64> = per_day.iter().map(|s| s.combined_score).collect();
    let score_dispersion = sample_std(&scores);

    let confidence = if total_samples > 100 && score_dispersion > 0.01 {
        Confidence::High
    } else if total_samples > 50 {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    debug!(
        "Best weekday {:?} (score {:.4}, {} samples, {})",
        best.weekday,
        best.combined_score,
        total_samples,
        confidence.label()
    );

    BestDayResult {
        best_day: best.weekday,
        best_day_score: best.combined_score,
        confidence,
        total_samples,
        per_day,
    }
}

/// Score how favourable `best_day`'s own daily returns are for buying.
///
/// Compares the same-day return (close over previous close) of `best_day`
/// against every other day in the trailing 90 days. Days that tend to dip
/// score higher. Returns [`DayPatternScore::neutral`] when the window has
/// fewer than 10 rows or `best_day` has fewer than 3 observations.
pub fn day_pattern_score(bars: &[PriceBar], best_day: Weekday) -> DayPatternScore {
    let window_len = trailing_days(bars, DAY_PATTERN_WINDOW_DAYS).len();
    if window_len < DAY_PATTERN_MIN_ROWS {
        return DayPatternScore::neutral(best_day);
    }

    // Returns are taken over the full slice so the first window row still
    // has its previous close
    let start = bars.len() - window_len;
    let mut best_returns = Vec::new();
    let mut other_returns = Vec::new();
    for i in start.max(1)..bars.len() {
        let ret = bars[i].close / bars[i - 1].close - 1.0;
        if bars[i].weekday() == best_day {
            best_returns.push(ret);
        } else {
            other_returns.push(ret);
        }
    }

    if best_returns.len() < MIN_DAY_SAMPLES {
        return DayPatternScore::neutral(best_day);
    }

    let avg_best = mean(&best_returns);
    let avg_other = mean(&other_returns);
    let best_volatility = sample_std(&best_returns);
    let other_volatility = sample_std(&other_returns);

    let volatility_ratio = if other_volatility > 0.0 {
        best_volatility / other_volatility
    } else {
        1.0
    };

    let mut score = if avg_best < -0.01 {
        0.4
    } else if avg_best < 0.0 {
        0.2
    } else if avg_best < 0.02 {
        0.1
    } else {
        -0.2
    };

    if volatility_ratio > 1.2 {
        score += 0.1;
    } else if volatility_ratio < 0.8 {
        score -= 0.1;
    }

    let positive_rate =
        best_returns.iter().filter(|r| **r > 0.0).count() as f64 / best_returns.len() as f64;

    DayPatternScore {
        best_day,
        best_day_score: score,
        pattern_strength: (avg_best - avg_other).abs(),
        avg_best_day_return: avg_best,
        best_day_volatility: best_volatility,
        best_day_positive_rate: positive_rate,
        volatility_ratio,
    }
}
