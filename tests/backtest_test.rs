/**
 * Analyst and Backtest Tests
 *
 * Runs the live analyst and the backtester against an in-memory provider:
 * - Multi-timeframe combination with a skipped timeframe
 * - Provider failures surfacing as data, not panics
 * - Paginated history download feeding a weekday backtest
 * - Best plain weekday comparison and weekly pattern analysis
 */
mod common;

use chrono::{TimeZone, Utc, Weekday};
use common::*;
use dca_scout::config::AnalysisConfig;
use dca_scout::error::AppError;
use dca_scout::services::analyst::{AnalysisOutcome, QuantAnalyst};
use dca_scout::services::backtester::{
    compare_weekdays, compare_with_best_weekday, compare_with_regular, load_history,
    simulate_strategies, DcaBacktester,
};
use dca_scout::services::patterns::{analyze_entry_points, analyze_timing_patterns};
use dca_scout::services::scorer::WeightProfile;
use dca_scout::types::{PriceSeries, Timeframe, TradeRecommendation, WeekdayVerdict, MS_PER_DAY};

const MS_PER_WEEK: i64 = 7 * MS_PER_DAY;

fn provider() -> InMemoryProvider {
    InMemoryProvider::new()
        .with(Timeframe::Daily, bars_from_closes(&choppy_closes(300), MS_PER_DAY))
        .with(Timeframe::FourHour, bars_from_closes(&choppy_closes(300), MS_PER_4H))
        .with(Timeframe::Weekly, bars_from_closes(&choppy_closes(30), MS_PER_WEEK))
}

#[tokio::test]
async fn test_multi_timeframe_skips_short_weekly_history() {
    let analyst = QuantAnalyst::new(provider(), "BTCUSDT", 250.0, AnalysisConfig::default());
    let now = Utc.with_ymd_and_hms(2024, 10, 28, 12, 0, 0).unwrap();
    let analysis = analyst.analyze_multiple_timeframes(now).await.unwrap();

    assert_eq!(analysis.timeframes.len(), 3);
    assert_eq!(analysis.combined.skipped, vec![Timeframe::Weekly]);
    assert!(matches!(
        analysis.timeframes[2].outcome,
        AnalysisOutcome::InsufficientData {
            required: 50,
            available: 30
        }
    ));

    let scores: Vec<f64> = analysis.timeframes[..2]
        .iter()
        .map(|tf| tf.outcome.computed().unwrap().breakdown.final_score)
        .collect();
    let expected = (0.5 * scores[0] + 0.3 * scores[1]) / 0.8;
    assert!((analysis.combined.decision.final_score - expected).abs() < 1e-12);

    let m = analysis.combined.decision.investment_multiplier;
    assert!((0.5..=2.0).contains(&m));
    assert!((analysis.combined.decision.investment_amount - 250.0 * m).abs() < 1e-9);
}

#[tokio::test]
async fn test_provider_failure_is_reported() {
    let analyst = QuantAnalyst::new(
        InMemoryProvider::failing(),
        "BTCUSDT",
        250.0,
        AnalysisConfig::default(),
    );
    let now = Utc.with_ymd_and_hms(2024, 10, 28, 12, 0, 0).unwrap();

    let outcome = analyst.comprehensive_score(Timeframe::Daily, Weekday::Thu, now).await;
    assert_eq!(outcome.trade_recommendation(), TradeRecommendation::ProviderError);
    assert_eq!(outcome.multiplier(), 1.0);

    // Falls back to the degenerate best day
    let timing = analyst.timing_info(now).await;
    assert_eq!(timing.best_day, Weekday::Mon);
    assert!(timing.is_best_day_today);

    let err = analyst.analyze_multiple_timeframes(now).await.unwrap_err();
    assert!(matches!(err, AppError::DataUnavailable(_)));
}

#[tokio::test]
async fn test_backtest_from_paginated_history() {
    let closes = choppy_closes(1500);
    let provider = InMemoryProvider::new().with(Timeframe::Daily, daily_bars(&closes));
    let end = START + 1500 * MS_PER_DAY;

    let history = load_history(&provider, "BTCUSDT", START, end).await.unwrap();
    assert_eq!(history.len(), 1500);
    assert_eq!(provider.calls(), 2);

    let backtester = DcaBacktester::new(250.0, WeightProfile::thursday());
    let result = backtester.run_weekday(&history, Weekday::Thu).unwrap();
    assert_eq!(result.trades.len(), 214);
    assert!(result
        .trades
        .iter()
        .all(|t| (0.5..=2.0).contains(&t.multiplier)));
    assert_eq!(
        result.trades[0].recommendation,
        TradeRecommendation::InsufficientData
    );
    assert!(result.trades.last().unwrap().recommendation.is_scored());

    let comparison = compare_with_regular(&result, &history);
    assert!((comparison.period_years - 1499.0 / 365.25).abs() < 1e-12);
    assert!(
        (comparison.capital_difference
            - (result.total_invested - 250.0 * result.trades.len() as f64))
            .abs()
            < 1e-6
    );

    let weekdays = compare_weekdays(&history, 250.0);
    let thursday = weekdays.iter().find(|w| w.weekday == Weekday::Thu).unwrap();
    assert_eq!(thursday.operations, 214);
    assert!(
        (thursday.total_invested - result.metrics.regular_dca_comparison.regular_invested).abs()
            < 1e-9
    );
}

#[tokio::test]
async fn test_multi_profile_backtest_refetching() {
    let provider = provider();
    let history = load_history(&provider, "BTCUSDT", START, START + 300 * MS_PER_DAY)
        .await
        .unwrap();
    let calls_before = provider.calls();

    let backtester = DcaBacktester::new(100.0, WeightProfile::MultiIndicator);
    let refetched = backtester
        .run_weekday_refetching(&provider, "BTCUSDT", &history, Weekday::Sun)
        .await
        .unwrap();
    // One provider round trip per trade date
    assert_eq!(provider.calls() - calls_before, refetched.trades.len());

    let preloaded = backtester.run_weekday(&history, Weekday::Sun).unwrap();
    assert_eq!(preloaded.trades, refetched.trades);
    assert_eq!(preloaded.total_invested, refetched.total_invested);
}

#[tokio::test]
async fn test_missing_history() {
    let provider = InMemoryProvider::new();
    let err = load_history(&provider, "ETHUSDT", START, START + 10 * MS_PER_DAY)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ETHUSDT"));
}

#[test]
fn test_weekly_strategies() {
    let weekly = PriceSeries::new(bars_from_closes(
        &choppy_closes(120),
        MS_PER_WEEK,
    ));
    let results = simulate_strategies(&weekly, 100.0);
    assert_eq!(results[0].purchases, 120);
    for conditional in &results[1..] {
        assert!(conditional.purchases < 120);
        assert_eq!(
            conditional.total_invested,
            100.0 * conditional.purchases as f64
        );
    }
}

#[tokio::test]
async fn test_backtest_against_best_plain_weekday() {
    let provider = InMemoryProvider::new().with(Timeframe::Daily, daily_bars(&choppy_closes(400)));
    let history = load_history(&provider, "BTCUSDT", START, START + 400 * MS_PER_DAY)
        .await
        .unwrap();

    let result = DcaBacktester::new(250.0, WeightProfile::thursday())
        .run_weekday(&history, Weekday::Thu)
        .unwrap();
    let weekdays = compare_weekdays(&history, 250.0);
    let cmp = compare_with_best_weekday(&result, &weekdays).unwrap();

    let best = weekdays
        .iter()
        .max_by(|a, b| a.total_return.total_cmp(&b.total_return))
        .unwrap();
    assert_eq!(cmp.best_regular_return, best.total_return);
    assert!(
        (cmp.same_day_regular_return - result.metrics.regular_dca_comparison.regular_return).abs()
            < 1e-12
    );
    let expected = match cmp.improvement_vs_best {
        i if i.abs() < 5.0 => WeekdayVerdict::Marginal,
        i if i > 0.0 => WeekdayVerdict::UseScored,
        _ => WeekdayVerdict::UseRegular,
    };
    assert_eq!(cmp.verdict, expected);
}

#[test]
fn test_weekly_patterns() {
    let weekly = PriceSeries::new(bars_from_closes(&choppy_closes(160), MS_PER_WEEK));

    let timing = analyze_timing_patterns(&weekly);
    let counted: usize = timing.by_month.iter().map(|m| m.forward_4.count).sum();
    assert_eq!(counted, 156);
    let quarters: usize = timing.by_quarter.iter().map(|q| q.forward_4.count).sum();
    assert_eq!(quarters, 156);
    assert_eq!(timing.best_weeks.len(), 5);
    assert!(timing.best_weeks[0].forward_4.mean >= timing.worst_weeks[0].forward_4.mean);

    // Bars 19..=155 have every indicator and a 4-bar forward return
    let entries = analyze_entry_points(&weekly);
    let rsi_total: usize = entries.rsi.iter().map(|b| b.forward_4.count).sum();
    assert!(rsi_total <= 137);
    assert!(entries.rsi.iter().all(|b| b.forward_4.count > 0));
    assert!(entries
        .z_score
        .iter()
        .all(|b| b.avg_z_score.is_some() && b.forward_12.map_or(true, |s| s.count <= b.forward_4.count)));
}
