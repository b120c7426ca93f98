//! Quant Analyst
//!
//! Fetches recent candles, runs the indicator library, weekday analyzer and
//! composite scorer over them, and reports the outcome as data. Whether an
//! unscorable window means "buy the base amount" is the caller's decision.

use crate::config::AnalysisConfig;
use crate::error::{AppError, Result};
use crate::services::scorer::{combine_timeframes, CompositeScorer, ScoringContext, WeightProfile};
use crate::services::timing;
use crate::services::weekday::{analyze_weekdays, day_pattern_score};
use crate::sources::{KlineRequest, MarketDataProvider};
use crate::types::{
    BestDayResult, DayPatternScore, IndicatorSnapshot, InvestmentDecision, MultiTimeframeDecision,
    PriceBar, ScoreBreakdown, SessionTiming, Timeframe, TimingInfo, TradeRecommendation,
};
use chrono::{DateTime, Datelike, Utc, Weekday};
use serde::Serialize;
use tracing::{info, warn};

/// A fully scored window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedAnalysis {
    pub snapshot: IndicatorSnapshot,
    /// Present when the profile weighs the weekday pattern.
    pub day_pattern: Option<DayPatternScore>,
    pub breakdown: ScoreBreakdown,
    pub decision: InvestmentDecision,
}

/// Result of scoring one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum AnalysisOutcome {
    Computed(Box<ComputedAnalysis>),
    InsufficientData { required: usize, available: usize },
    ProviderError { message: String },
}

impl AnalysisOutcome {
    /// Classify an error raised while preparing a window.
    pub fn from_error(err: AppError, required: usize) -> Self {
        match err {
            AppError::InsufficientData {
                required,
                available,
            } => AnalysisOutcome::InsufficientData {
                required,
                available,
            },
            AppError::EmptyHistory(_) => AnalysisOutcome::InsufficientData {
                required,
                available: 0,
            },
            other => AnalysisOutcome::ProviderError {
                message: other.to_string(),
            },
        }
    }

    pub fn computed(&self) -> Option<&ComputedAnalysis> {
        match self {
            AnalysisOutcome::Computed(analysis) => Some(analysis),
            _ => None,
        }
    }

    /// Multiplier to buy with: the decision's, or 1.0 for either fallback.
    pub fn multiplier(&self) -> f64 {
        self.computed()
            .map_or(1.0, |a| a.decision.investment_multiplier)
    }

    /// Recommendation label to record for a purchase.
    pub fn trade_recommendation(&self) -> TradeRecommendation {
        match self {
            AnalysisOutcome::Computed(a) => TradeRecommendation::Scored(a.decision.recommendation),
            AnalysisOutcome::InsufficientData { .. } => TradeRecommendation::InsufficientData,
            AnalysisOutcome::ProviderError { .. } => TradeRecommendation::ProviderError,
        }
    }
}

/// Weekday inputs for the multi-indicator profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayTiming {
    pub best_day: Weekday,
    /// Evaluation moment; its weekday decides the best-day bonus.
    pub now: DateTime<Utc>,
}

/// Score the last bar of `bars`.
///
/// Requires at least `min_bars` bars. `day` is only consulted by profiles
/// that weigh the weekday pattern; without it the pattern contributes 0.
pub fn analyze_series(
    bars: &[PriceBar],
    scorer: &CompositeScorer,
    day: Option<DayTiming>,
    min_bars: usize,
) -> AnalysisOutcome {
    if bars.len() < min_bars {
        return AnalysisOutcome::InsufficientData {
            required: min_bars,
            available: bars.len(),
        };
    }

    let snapshot = match IndicatorSnapshot::from_series(bars) {
        Ok(snapshot) => snapshot,
        Err(e) => return AnalysisOutcome::from_error(e, min_bars),
    };

    let (day_pattern, ctx) = match (scorer.profile().uses_day_pattern(), day) {
        (true, Some(day)) => {
            let pattern = day_pattern_score(bars, day.best_day);
            let ctx = ScoringContext {
                best_day_score: pattern.best_day_score,
                is_best_day_today: day.now.weekday() == day.best_day,
            };
            (Some(pattern), ctx)
        }
        _ => (None, ScoringContext::default()),
    };

    let scored = scorer.score(&snapshot, &ctx);
    AnalysisOutcome::Computed(Box::new(ComputedAnalysis {
        snapshot,
        day_pattern,
        breakdown: scored.breakdown,
        decision: scored.decision,
    }))
}

/// Outcome of one timeframe in a market analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeAnalysis {
    pub timeframe: Timeframe,
    pub outcome: AnalysisOutcome,
}

/// Full live analysis across timeframes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub symbol: String,
    pub timing: TimingInfo,
    /// Countdown to the Monday 09:00 UTC session.
    pub session: SessionTiming,
    pub timeframes: Vec<TimeframeAnalysis>,
    pub combined: MultiTimeframeDecision,
}

/// Live analysis over a market data provider.
pub struct QuantAnalyst<P> {
    provider: P,
    symbol: String,
    scorer: CompositeScorer,
    settings: AnalysisConfig,
}

impl<P: MarketDataProvider> QuantAnalyst<P> {
    pub fn new(provider: P, symbol: &str, base_investment: f64, settings: AnalysisConfig) -> Self {
        Self {
            provider,
            symbol: symbol.to_string(),
            scorer: CompositeScorer::new(WeightProfile::MultiIndicator, base_investment),
            settings,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    async fn latest_bars(&self, timeframe: Timeframe) -> Result<Vec<PriceBar>> {
        let request = KlineRequest::latest(&self.symbol, timeframe, self.settings.kline_limit);
        let bars = self.provider.fetch_klines(&request).await?;
        if bars.is_empty() {
            return Err(AppError::EmptyHistory(self.symbol.clone()));
        }
        Ok(bars)
    }

    /// Best weekday over the recent daily history.
    pub async fn best_day_analysis(&self) -> Result<BestDayResult> {
        let bars = self.latest_bars(Timeframe::Daily).await?;
        Ok(analyze_weekdays(&bars))
    }

    /// Best-day timing relative to `now`. A failed fetch falls back to the
    /// degenerate best-day result.
    pub async fn timing_info(&self, now: DateTime<Utc>) -> TimingInfo {
        let best = match self.best_day_analysis().await {
            Ok(best) => best,
            Err(e) => {
                warn!("Best-day analysis failed for {}: {}", self.symbol, e);
                BestDayResult::degenerate()
            }
        };
        timing::advise(now, &best)
    }

    /// Score the latest bars of one timeframe.
    pub async fn comprehensive_score(
        &self,
        timeframe: Timeframe,
        best_day: Weekday,
        now: DateTime<Utc>,
    ) -> AnalysisOutcome {
        let bars = match self.latest_bars(timeframe).await {
            Ok(bars) => bars,
            Err(e) => {
                warn!(
                    "Fetching {} {} failed: {}",
                    self.symbol,
                    timeframe.interval(),
                    e
                );
                return AnalysisOutcome::from_error(e, self.settings.min_bars);
            }
        };

        analyze_series(
            &bars,
            &self.scorer,
            Some(DayTiming { best_day, now }),
            self.settings.min_bars,
        )
    }

    /// Score the daily, 4-hour and weekly timeframes and combine them.
    ///
    /// Fails with [`AppError::DataUnavailable`] when no timeframe scores.
    pub async fn analyze_multiple_timeframes(&self, now: DateTime<Utc>) -> Result<MarketAnalysis> {
        let timing = self.timing_info(now).await;

        let mut timeframes = Vec::new();
        let mut scores = Vec::new();
        let mut skipped = Vec::new();
        for timeframe in Timeframe::all() {
            let outcome = self.comprehensive_score(timeframe, timing.best_day, now).await;
            match outcome.computed() {
                Some(analysis) => scores.push((timeframe, analysis.breakdown.final_score)),
                None => skipped.push(timeframe),
            }
            timeframes.push(TimeframeAnalysis { timeframe, outcome });
        }

        let combined = combine_timeframes(&scores, skipped, self.scorer.base_investment())?;
        info!(
            "{}: combined score {:.3} over {} timeframe(s) -> {}",
            self.symbol,
            combined.decision.final_score,
            scores.len(),
            combined.decision.recommendation
        );

        Ok(MarketAnalysis {
            symbol: self.symbol.clone(),
            session: timing::session_timing(now, Weekday::Mon),
            timing,
            timeframes,
            combined,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_bars::*;
    use crate::types::Recommendation;
    use chrono::TimeZone;

    fn multi() -> CompositeScorer {
        CompositeScorer::new(WeightProfile::MultiIndicator, 100.0)
    }

    #[test]
    fn test_analyze_series_insufficient() {
        let outcome = analyze_series(&create_choppy_bars(49), &multi(), None, 50);
        assert_eq!(
            outcome,
            AnalysisOutcome::InsufficientData {
                required: 50,
                available: 49
            }
        );
        assert_eq!(outcome.multiplier(), 1.0);
        assert_eq!(outcome.trade_recommendation().label(), "NEUTRAL");
    }

    #[test]
    fn test_analyze_series_snapshot_lookback_enforced() {
        // min_bars below the indicator lookback still reports missing data
        let outcome = analyze_series(&create_choppy_bars(10), &multi(), None, 5);
        assert!(matches!(
            outcome,
            AnalysisOutcome::InsufficientData { required: 26, available: 10 }
        ));
    }

    #[test]
    fn test_analyze_series_computed() {
        let bars = create_choppy_bars(120);
        let outcome = analyze_series(&bars, &multi(), None, 50);
        let analysis = outcome.computed().unwrap();
        assert!(analysis.day_pattern.is_none());
        let m = analysis.decision.investment_multiplier;
        assert!((0.5..=2.0).contains(&m));
        assert_eq!(outcome.multiplier(), m);
    }

    #[test]
    fn test_analyze_series_best_day_bonus() {
        let bars = create_choppy_bars(120);
        // 2024-01-03 was a Wednesday
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        let today = analyze_series(
            &bars,
            &multi(),
            Some(DayTiming {
                best_day: Weekday::Wed,
                now,
            }),
            50,
        );
        let other = analyze_series(
            &bars,
            &multi(),
            Some(DayTiming {
                best_day: Weekday::Thu,
                now,
            }),
            50,
        );
        let today = today.computed().unwrap();
        let other = other.computed().unwrap();
        assert_eq!(today.breakdown.timing_bonus, 0.15);
        assert_eq!(other.breakdown.timing_bonus, 0.0);
        assert!(today.day_pattern.is_some());
    }

    #[test]
    fn test_fixed_profile_skips_day_pattern() {
        let scorer = CompositeScorer::new(WeightProfile::thursday(), 100.0);
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        let outcome = analyze_series(
            &create_choppy_bars(60),
            &scorer,
            Some(DayTiming {
                best_day: Weekday::Wed,
                now,
            }),
            50,
        );
        assert!(outcome.computed().unwrap().day_pattern.is_none());
    }

    #[test]
    fn test_outcome_from_error() {
        let provider = AnalysisOutcome::from_error(AppError::ExternalApi("boom".to_string()), 50);
        assert_eq!(provider.trade_recommendation().label(), "ERROR - DCA NORMAL");
        assert_eq!(provider.multiplier(), 1.0);

        let empty = AnalysisOutcome::from_error(AppError::EmptyHistory("BTCUSDT".to_string()), 50);
        assert_eq!(
            empty,
            AnalysisOutcome::InsufficientData {
                required: 50,
                available: 0
            }
        );
    }

    #[test]
    fn test_uptrend_not_rewarded() {
        let outcome = analyze_series(&create_uptrend_bars(80), &multi(), None, 50);
        let analysis = outcome.computed().unwrap();
        assert!(analysis.breakdown.rsi_score <= 0.0);
        assert!(analysis.breakdown.roc_score <= 0.0);
        assert_ne!(analysis.decision.recommendation, Recommendation::StrongBuy);
    }
}
