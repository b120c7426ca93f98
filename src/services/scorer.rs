//! Composite Scorer
//!
//! Maps each indicator onto a bounded sub-score with fixed breakpoints and
//! combines the sub-scores into one final score under a named weight
//! profile. The final score sizes the purchase through
//! [`InvestmentDecision::from_score`].

use crate::error::{AppError, Result};
use crate::types::{
    IndicatorSnapshot, InvestmentDecision, MultiTimeframeDecision, ScoreBreakdown, Timeframe,
    TimeframeScore,
};
use serde::Serialize;
use tracing::debug;

/// Fixed bonus used when simulating Thursday purchases.
pub const THURSDAY_WEEKDAY_BONUS: f64 = 0.25;
/// Fixed bonus used when simulating Sunday purchases.
pub const SUNDAY_WEEKDAY_BONUS: f64 = 0.30;
/// Added to the multi-indicator score when today is the best weekday.
pub const BEST_DAY_TIMING_BONUS: f64 = 0.15;

/// Weighting scheme for the final score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "profile")]
pub enum WeightProfile {
    /// 0.20 RSI, 0.15 %B, 0.15 Z, 0.10 volume, 0.08 MACD, 0.07 ROC,
    /// 0.25 day pattern, plus 0.15 when today is the best weekday.
    MultiIndicator,
    /// 0.25 RSI, 0.20 %B, 0.20 Z, 0.10 MACD, 0.10 ROC, plus
    /// 0.15 x `weekday_bonus`. Assumes today is the target weekday.
    FixedWeekday { weekday_bonus: f64 },
}

impl WeightProfile {
    pub fn thursday() -> Self {
        WeightProfile::FixedWeekday {
            weekday_bonus: THURSDAY_WEEKDAY_BONUS,
        }
    }

    pub fn sunday() -> Self {
        WeightProfile::FixedWeekday {
            weekday_bonus: SUNDAY_WEEKDAY_BONUS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WeightProfile::MultiIndicator => "multi-indicator",
            WeightProfile::FixedWeekday { .. } => "fixed-weekday",
        }
    }

    /// Whether the profile consumes the weekday pattern inputs.
    pub fn uses_day_pattern(&self) -> bool {
        matches!(self, WeightProfile::MultiIndicator)
    }
}

impl Default for WeightProfile {
    fn default() -> Self {
        WeightProfile::MultiIndicator
    }
}

/// Weekday inputs of the multi-indicator profile.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoringContext {
    /// Day-advantage sub-score of the best weekday.
    pub best_day_score: f64,
    /// Whether the evaluation day is the best weekday.
    pub is_best_day_today: bool,
}

// NaN falls through every comparison below and lands in the last band.

pub fn rsi_score(rsi: f64) -> f64 {
    if rsi <= 30.0 {
        1.0
    } else if rsi <= 40.0 {
        0.7
    } else if rsi <= 60.0 {
        0.3
    } else if rsi <= 70.0 {
        -0.2
    } else {
        -0.8
    }
}

pub fn bollinger_score(percent_b: f64) -> f64 {
    if percent_b <= 0.0 {
        1.0
    } else if percent_b <= 0.2 {
        0.7
    } else if percent_b <= 0.8 {
        0.0
    } else if percent_b <= 1.0 {
        -0.3
    } else {
        -0.8
    }
}

pub fn zscore_score(z: f64) -> f64 {
    if z <= -2.0 {
        1.0
    } else if z <= -1.0 {
        0.6
    } else if z <= 1.0 {
        0.0
    } else if z <= 2.0 {
        -0.4
    } else {
        -0.8
    }
}

/// Additive volume and buy-pressure sub-score.
pub fn volume_score(volume_ratio: f64, buy_pressure_ratio: f64) -> f64 {
    let mut score = 0.0;
    if volume_ratio >= 2.0 {
        score += 0.4;
    } else if volume_ratio >= 1.5 {
        score += 0.2;
    }

    if buy_pressure_ratio >= 1.2 {
        score += 0.4;
    } else if buy_pressure_ratio >= 1.0 {
        score += 0.1;
    } else {
        score -= 0.2;
    }
    score
}

/// MACD sub-score that rewards a bullish histogram below the zero line.
pub fn macd_score(histogram: f64, macd_line: f64) -> f64 {
    if histogram > 0.0 && macd_line < 0.0 {
        0.6
    } else if histogram > 0.0 {
        0.3
    } else if histogram < 0.0 && macd_line > 0.0 {
        -0.3
    } else {
        -0.1
    }
}

/// MACD sub-score on the histogram sign alone.
pub fn macd_histogram_score(histogram: f64) -> f64 {
    if histogram > 0.0 {
        0.3
    } else {
        -0.1
    }
}

pub fn roc_score(roc: f64) -> f64 {
    if roc < -5.0 {
        0.6
    } else if roc < -2.0 {
        0.3
    } else if roc > 5.0 {
        -0.6
    } else {
        0.0
    }
}

/// Breakdown and sizing decision produced for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredDecision {
    pub breakdown: ScoreBreakdown,
    pub decision: InvestmentDecision,
}

/// Turns indicator snapshots into investment decisions.
#[derive(Debug, Clone, Copy)]
pub struct CompositeScorer {
    profile: WeightProfile,
    base_investment: f64,
}

impl CompositeScorer {
    pub fn new(profile: WeightProfile, base_investment: f64) -> Self {
        Self {
            profile,
            base_investment,
        }
    }

    pub fn profile(&self) -> WeightProfile {
        self.profile
    }

    pub fn base_investment(&self) -> f64 {
        self.base_investment
    }

    /// Sub-scores and weighted final score. `ctx` is ignored by the
    /// fixed-weekday profile.
    pub fn breakdown(&self, snapshot: &IndicatorSnapshot, ctx: &ScoringContext) -> ScoreBreakdown {
        let rsi = rsi_score(snapshot.rsi);
        let bb = bollinger_score(snapshot.bollinger_percent_b);
        let zscore = zscore_score(snapshot.z_score);
        let roc = roc_score(snapshot.roc);

        match self.profile {
            WeightProfile::MultiIndicator => {
                let volume = volume_score(snapshot.volume_ratio, snapshot.buy_pressure_ratio);
                let macd = macd_score(snapshot.macd_histogram, snapshot.macd_line);
                let timing_bonus = if ctx.is_best_day_today {
                    BEST_DAY_TIMING_BONUS
                } else {
                    0.0
                };
                let final_score = rsi * 0.20
                    + bb * 0.15
                    + zscore * 0.15
                    + volume * 0.10
                    + macd * 0.08
                    + roc * 0.07
                    + ctx.best_day_score * 0.25
                    + timing_bonus;

                ScoreBreakdown {
                    rsi_score: rsi,
                    bb_score: bb,
                    zscore_score: zscore,
                    volume_score: Some(volume),
                    macd_score: macd,
                    roc_score: roc,
                    best_day_score: Some(ctx.best_day_score),
                    timing_bonus,
                    final_score,
                }
            }
            WeightProfile::FixedWeekday { weekday_bonus } => {
                let macd = macd_histogram_score(snapshot.macd_histogram);
                let timing_bonus = weekday_bonus * 0.15;
                let final_score = rsi * 0.25
                    + bb * 0.20
                    + zscore * 0.20
                    + macd * 0.10
                    + roc * 0.10
                    + timing_bonus;

                ScoreBreakdown {
                    rsi_score: rsi,
                    bb_score: bb,
                    zscore_score: zscore,
                    volume_score: None,
                    macd_score: macd,
                    roc_score: roc,
                    best_day_score: None,
                    timing_bonus,
                    final_score,
                }
            }
        }
    }

    /// Score a snapshot and size the purchase.
    pub fn score(&self, snapshot: &IndicatorSnapshot, ctx: &ScoringContext) -> ScoredDecision {
        let breakdown = self.breakdown(snapshot, ctx);
        let decision = InvestmentDecision::from_score(breakdown.final_score, self.base_investment);
        debug!(
            "{} score {:.3} -> x{:.2} {}",
            self.profile.name(),
            breakdown.final_score,
            decision.investment_multiplier,
            decision.recommendation
        );
        ScoredDecision {
            breakdown,
            decision,
        }
    }
}

/// Weighted average of per-timeframe final scores.
///
/// Only timeframes present in `scores` contribute; their weights are
/// renormalised. Fails with [`AppError::DataUnavailable`] when `scores` is
/// empty.
pub fn combine_timeframes(
    scores: &[(Timeframe, f64)],
    skipped: Vec<Timeframe>,
    base_investment: f64,
) -> Result<MultiTimeframeDecision> {
    if scores.is_empty() {
        return Err(AppError::DataUnavailable(
            "no timeframe produced a score".to_string(),
        ));
    }

    let total_weight: f64 = scores.iter().map(|(tf, _)| tf.weight()).sum();
    let weighted: f64 = scores.iter().map(|(tf, s)| tf.weight() * s).sum();
    let final_score = weighted / total_weight;

    Ok(MultiTimeframeDecision {
        timeframes: scores
            .iter()
            .map(|(timeframe, final_score)| TimeframeScore {
                timeframe: *timeframe,
                final_score: *final_score,
                weight: timeframe.weight(),
            })
            .collect(),
        skipped,
        decision: InvestmentDecision::from_score(final_score, base_investment),
    })
}
