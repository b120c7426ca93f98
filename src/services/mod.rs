pub mod analyst;
pub mod backtester;
pub mod patterns;
pub mod scorer;
pub mod signals;
pub mod timing;
pub mod weekday;

pub use analyst::{analyze_series, AnalysisOutcome, ComputedAnalysis, DayTiming, MarketAnalysis, QuantAnalyst};
pub use backtester::{
    compare_weekdays, compare_with_best_weekday, compare_with_regular, load_history,
    simulate_strategies, BacktestError, DcaBacktester,
};
pub use patterns::{analyze_entry_points, analyze_timing_patterns};
pub use scorer::{combine_timeframes, CompositeScorer, ScoringContext, WeightProfile};
pub use signals::Indicator;
pub use weekday::{analyze_weekdays, day_pattern_score};
