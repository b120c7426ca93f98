//! Backtesting Engine
//!
//! Replays fixed-weekday DCA purchases over downloaded daily history.
//! Features:
//! - Scored DCA sized by the composite scorer on each trade date
//! - Context taken from the already downloaded series, or refetched per trade
//! - Regular DCA comparison on the same dates
//! - Plain DCA per weekday
//! - Scored DCA against the best plain weekday
//! - Conditional DCA strategies on weekly bars

use crate::config::AnalysisConfig;
use crate::error::{AppError, Result};
use crate::services::analyst::{analyze_series, AnalysisOutcome, DayTiming};
use crate::services::scorer::{CompositeScorer, WeightProfile};
use crate::services::signals::indicators::{BollingerBands, Rsi, ZScore};
use crate::services::signals::Indicator;
use crate::services::weekday::analyze_weekdays;
use crate::sources::{fetch_history, KlineRequest, MarketDataProvider};
use crate::types::{
    weekday_name, BacktestResult, BestWeekdayComparison, PerformanceMetrics, PriceBar, PriceSeries, RecommendationCount,
    RegularDcaComparison, StrategyComparison, StrategyKind, StrategyResult, Timeframe,
    TradeRecord, WeekdayDcaResult, WeekdayVerdict, MS_PER_DAY, WEEKDAYS,
};
use chrono::{DateTime, Utc, Weekday};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Backtesting errors.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("No historical data available for {symbol} from {start} to {end}")]
    NoHistoricalData { symbol: String, start: i64, end: i64 },
    #[error("No {weekday} bars in the backtest history")]
    NoTradeDates { weekday: String },
}

/// Log progress every this many trades.
const PROGRESS_EVERY: usize = 20;

/// Purchase rules simulated by [`simulate_strategies`].
pub fn default_strategies() -> [StrategyKind; 4] {
    [
        StrategyKind::Regular,
        StrategyKind::RsiBelow(50.0),
        StrategyKind::ZScoreBelow(-0.5),
        StrategyKind::PercentBBelow(0.3),
    ]
}

/// Download daily history for a backtest.
pub async fn load_history<P: MarketDataProvider + ?Sized>(
    provider: &P,
    symbol: &str,
    start: i64,
    end: i64,
) -> Result<PriceSeries> {
    match fetch_history(provider, symbol, Timeframe::Daily, start, end).await {
        Err(AppError::EmptyHistory(_)) => Err(BacktestError::NoHistoricalData {
            symbol: symbol.to_string(),
            start,
            end,
        }
        .into()),
        other => other,
    }
}

fn simple_return(invested: f64, value: f64) -> f64 {
    if invested > 0.0 {
        (value - invested) / invested
    } else {
        0.0
    }
}

/// Relative change of `value` over `reference`, in percent. 0 when the
/// reference is 0.
fn relative_improvement(value: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        0.0
    } else {
        (value - reference) / reference.abs() * 100.0
    }
}

/// Scored fixed-weekday DCA simulation.
#[derive(Debug, Clone, Copy)]
pub struct DcaBacktester {
    base_investment: f64,
    profile: WeightProfile,
    context_days: i64,
    context_limit: usize,
    min_bars: usize,
}

impl DcaBacktester {
    pub fn new(base_investment: f64, profile: WeightProfile) -> Self {
        let defaults = AnalysisConfig::default();
        Self {
            base_investment,
            profile,
            context_days: defaults.context_days,
            context_limit: defaults.kline_limit,
            min_bars: defaults.min_bars,
        }
    }

    /// Take the context window and bar requirement from `settings`.
    pub fn with_settings(mut self, settings: &AnalysisConfig) -> Self {
        self.context_days = settings.context_days;
        self.context_limit = settings.kline_limit;
        self.min_bars = settings.min_bars;
        self
    }

    pub fn profile(&self) -> WeightProfile {
        self.profile
    }

    pub fn base_investment(&self) -> f64 {
        self.base_investment
    }

    /// Start of the context range for a trade at `timestamp`.
    ///
    /// Narrowed so the range holds at most `context_limit` daily bars. The
    /// exchange keeps the earliest bars of an oversized range, which would
    /// drop the trade bar itself.
    fn context_start(&self, timestamp: i64) -> i64 {
        let days = self.context_days.min(self.context_limit.saturating_sub(1) as i64);
        timestamp - days * MS_PER_DAY
    }

    /// Score a trade date from the bars leading up to it.
    fn evaluate(&self, context: &[PriceBar], at: DateTime<Utc>) -> AnalysisOutcome {
        let scorer = CompositeScorer::new(self.profile, self.base_investment);
        let day = self.profile.uses_day_pattern().then(|| DayTiming {
            best_day: analyze_weekdays(context).best_day,
            now: at,
        });
        analyze_series(context, &scorer, day, self.min_bars)
    }

    fn record(&self, bar: &PriceBar, outcome: &AnalysisOutcome) -> TradeRecord {
        match outcome {
            AnalysisOutcome::Computed(analysis) => TradeRecord::scored(
                bar.datetime(),
                bar.close,
                &analysis.decision,
                analysis.snapshot,
            ),
            other => TradeRecord::fallback(
                bar.datetime(),
                bar.close,
                self.base_investment,
                other.trade_recommendation(),
            ),
        }
    }

    fn trade_dates<'a>(&self, history: &'a PriceSeries, weekday: Weekday) -> Result<Vec<&'a PriceBar>> {
        let dates: Vec<&PriceBar> = history.on_weekday(weekday).collect();
        if dates.is_empty() {
            return Err(BacktestError::NoTradeDates {
                weekday: weekday_name(weekday).to_string(),
            }
            .into());
        }
        info!(
            "Backtesting {} {} purchases with the {} profile",
            dates.len(),
            weekday_name(weekday),
            self.profile.name()
        );
        Ok(dates)
    }

    /// Buy on every `weekday` bar of `history`, scoring each purchase from
    /// the history window ending at that bar.
    pub fn run_weekday(&self, history: &PriceSeries, weekday: Weekday) -> Result<BacktestResult> {
        let dates = self.trade_dates(history, weekday)?;

        let mut trades = Vec::with_capacity(dates.len());
        for (i, bar) in dates.iter().enumerate() {
            let context = history.window_ending_at(bar.timestamp, self.context_days, self.context_limit);
            let outcome = self.evaluate(context, bar.datetime());
            trades.push(self.record(bar, &outcome));

            if (i + 1) % PROGRESS_EVERY == 0 {
                debug!("Processed {}/{} trade dates", i + 1, dates.len());
            }
        }

        Ok(self.finish(weekday, history, trades))
    }

    /// Like [`Self::run_weekday`], but fetches each trade's context from
    /// `provider`. A failed fetch degrades that trade to the base amount.
    pub async fn run_weekday_refetching<P: MarketDataProvider + ?Sized>(
        &self,
        provider: &P,
        symbol: &str,
        history: &PriceSeries,
        weekday: Weekday,
    ) -> Result<BacktestResult> {
        let dates = self.trade_dates(history, weekday)?;

        let mut trades = Vec::with_capacity(dates.len());
        for (i, bar) in dates.iter().enumerate() {
            let request = KlineRequest::range(
                symbol,
                Timeframe::Daily,
                self.context_start(bar.timestamp),
                Some(bar.timestamp),
                self.context_limit,
            );
            let outcome = match provider.fetch_klines(&request).await {
                Ok(context) => self.evaluate(&context, bar.datetime()),
                Err(e) => {
                    warn!("Context fetch for {} failed: {}", bar.datetime().date_naive(), e);
                    AnalysisOutcome::from_error(e, self.min_bars)
                }
            };
            trades.push(self.record(bar, &outcome));

            if (i + 1) % PROGRESS_EVERY == 0 {
                debug!("Processed {}/{} trade dates", i + 1, dates.len());
            }
        }

        Ok(self.finish(weekday, history, trades))
    }

    fn finish(&self, weekday: Weekday, history: &PriceSeries, trades: Vec<TradeRecord>) -> BacktestResult {
        let final_price = history.last().map_or(0.0, |b| b.close);
        let total_invested: f64 = trades.iter().map(|t| t.investment_amount).sum();
        let total_coins: f64 = trades.iter().map(|t| t.coins_bought).sum();
        let final_value = total_coins * final_price;
        let total_return = simple_return(total_invested, final_value);
        let metrics = self.metrics(&trades, final_price, total_return);

        info!(
            "{} backtest: invested {:.2}, value {:.2}, return {:.2}% ({:+.2}% vs regular DCA)",
            weekday_name(weekday),
            total_invested,
            final_value,
            total_return * 100.0,
            metrics.regular_dca_comparison.improvement_percentage
        );

        BacktestResult {
            weekday,
            base_investment: self.base_investment,
            total_invested,
            total_coins,
            final_value,
            total_return,
            final_price,
            trades,
            metrics,
        }
    }

    fn metrics(&self, trades: &[TradeRecord], final_price: f64, scored_return: f64) -> PerformanceMetrics {
        let n = trades.len() as f64;
        let amounts = trades.iter().map(|t| t.investment_amount);
        let multipliers = trades.iter().map(|t| t.multiplier);

        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for trade in trades {
            *counts.entry(trade.recommendation.label()).or_default() += 1;
        }
        let mut recommendation_distribution: Vec<RecommendationCount> = counts
            .into_iter()
            .map(|(recommendation, count)| RecommendationCount {
                recommendation,
                count,
                percentage: count as f64 / n * 100.0,
            })
            .collect();
        recommendation_distribution.sort_by(|a, b| b.count.cmp(&a.count));

        let regular_invested = n * self.base_investment;
        let regular_coins: f64 = trades.iter().map(|t| self.base_investment / t.price).sum();
        let regular_value = regular_coins * final_price;
        let regular_return = simple_return(regular_invested, regular_value);

        PerformanceMetrics {
            avg_investment: amounts.clone().sum::<f64>() / n,
            max_investment: amounts.clone().fold(f64::NEG_INFINITY, f64::max),
            min_investment: amounts.fold(f64::INFINITY, f64::min),
            avg_multiplier: multipliers.clone().sum::<f64>() / n,
            max_multiplier: multipliers.clone().fold(f64::NEG_INFINITY, f64::max),
            min_multiplier: multipliers.fold(f64::INFINITY, f64::min),
            recommendation_distribution,
            regular_dca_comparison: RegularDcaComparison {
                regular_invested,
                regular_coins,
                regular_value,
                regular_return,
                improvement_percentage: relative_improvement(scored_return, regular_return),
            },
        }
    }
}

/// Plain fixed-amount DCA on each weekday, Monday first.
pub fn compare_weekdays(history: &PriceSeries, base_investment: f64) -> Vec<WeekdayDcaResult> {
    let final_price = history.last().map_or(0.0, |b| b.close);

    WEEKDAYS
        .iter()
        .map(|&weekday| {
            let (operations, total_coins) = history
                .on_weekday(weekday)
                .fold((0usize, 0.0), |(ops, coins), bar| {
                    (ops + 1, coins + base_investment / bar.close)
                });
            let total_invested = operations as f64 * base_investment;
            let final_value = total_coins * final_price;

            WeekdayDcaResult {
                weekday,
                total_invested,
                total_coins,
                final_value,
                total_return: simple_return(total_invested, final_value),
                operations,
            }
        })
        .collect()
}

/// Measure a scored backtest against regular DCA on the same dates.
pub fn compare_with_regular(result: &BacktestResult, history: &PriceSeries) -> StrategyComparison {
    let regular = &result.metrics.regular_dca_comparison;

    let capital_ratio = result.total_invested / regular.regular_invested;
    let capital_efficiency = if regular.regular_return == 0.0 || !capital_ratio.is_finite() {
        0.0
    } else {
        (result.total_return / capital_ratio) / regular.regular_return - 1.0
    };

    let period_years = match (history.first(), history.last()) {
        (Some(first), Some(last)) => {
            (last.datetime() - first.datetime()).num_days() as f64 / 365.25
        }
        _ => 0.0,
    };

    StrategyComparison {
        return_difference: result.total_return - regular.regular_return,
        return_improvement: relative_improvement(result.total_return, regular.regular_return),
        capital_difference: result.total_invested - regular.regular_invested,
        capital_efficiency,
        period_years,
    }
}

/// Measure a scored backtest against plain DCA on every weekday.
///
/// `weekdays` is the output of [`compare_weekdays`] over the same history.
/// The best plain weekday is the first with the highest return, Monday
/// first. `None` when no weekday had a purchase.
pub fn compare_with_best_weekday(
    result: &BacktestResult,
    weekdays: &[WeekdayDcaResult],
) -> Option<BestWeekdayComparison> {
    let mut best: Option<&WeekdayDcaResult> = None;
    for day in weekdays.iter().filter(|w| w.operations > 0) {
        if best.map_or(true, |b| day.total_return > b.total_return) {
            best = Some(day);
        }
    }
    let best = best?;

    let same_day_regular_return = weekdays
        .iter()
        .find(|w| w.weekday == result.weekday)
        .map_or(result.metrics.regular_dca_comparison.regular_return, |w| w.total_return);
    let improvement_vs_best = relative_improvement(result.total_return, best.total_return);
    let capital_factor = if result.trades.is_empty() || result.base_investment == 0.0 {
        0.0
    } else {
        result.total_invested / result.trades.len() as f64 / result.base_investment
    };
    let verdict = WeekdayVerdict::from_improvement(improvement_vs_best);

    info!(
        "Scored {} {:.2}% vs best plain weekday {} {:.2}% ({:+.2}%)",
        weekday_name(result.weekday),
        result.total_return * 100.0,
        weekday_name(best.weekday),
        best.total_return * 100.0,
        improvement_vs_best
    );

    Some(BestWeekdayComparison {
        scored_weekday: result.weekday,
        scored_return: result.total_return,
        same_day_regular_return,
        improvement_vs_same_day: relative_improvement(result.total_return, same_day_regular_return),
        best_regular_day: best.weekday,
        best_regular_return: best.total_return,
        improvement_vs_best,
        capital_factor,
        beats_best_regular: result.total_return > best.total_return,
        verdict,
    })
}

/// Whether `kind` buys at the last bar of `prefix`.
fn should_buy(kind: StrategyKind, prefix: &[PriceBar]) -> bool {
    match kind {
        StrategyKind::Regular => true,
        StrategyKind::RsiBelow(t) => Rsi::default().calculate(prefix).is_some_and(|v| v < t),
        StrategyKind::ZScoreBelow(t) => ZScore::default().calculate(prefix).is_some_and(|v| v < t),
        StrategyKind::PercentBBelow(t) => BollingerBands::default()
            .calculate(prefix)
            .is_some_and(|b| b.percent_b < t),
    }
}

/// Regular and conditional DCA over every bar of `history`.
///
/// Indicators are taken as of each bar; bars where an indicator is not yet
/// defined (or is NaN) are skipped by that strategy.
pub fn simulate_strategies(history: &PriceSeries, base_investment: f64) -> Vec<StrategyResult> {
    let bars = history.bars();
    let final_price = history.last().map_or(0.0, |b| b.close);

    default_strategies()
        .into_iter()
        .map(|kind| {
            let mut purchases = 0usize;
            let mut total_coins = 0.0;
            for i in 0..bars.len() {
                if should_buy(kind, &bars[..=i]) {
                    purchases += 1;
                    total_coins += base_investment / bars[i].close;
                }
            }
            let total_invested = purchases as f64 * base_investment;
            let final_value = total_coins * final_price;

            debug!("{}: {} purchases", kind.name(), purchases);
            StrategyResult {
                kind,
                total_invested,
                total_coins,
                final_value,
                total_return: simple_return(total_invested, final_value),
                purchases,
            }
        })
        .collect()
}
