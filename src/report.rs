//! Plain-text and JSON rendering of analysis and backtest results.
//!
//! Renderers return strings; the binary decides where they go.

use crate::error::Result;
use crate::services::analyst::{AnalysisOutcome, MarketAnalysis};
use crate::types::{
    weekday_name, BacktestResult, BestWeekdayComparison, EntryPointAnalysis, PatternBucket,
    StrategyComparison, StrategyResult, TimingInfo, TimingPatterns, WeekdayDcaResult,
    WeekdayVerdict,
};
use serde::Serialize;

const RULE: &str = "================================================================";

/// Pretty-printed JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Ratio as a signed percentage, e.g. `0.1234` -> `+12.34%`.
pub fn signed_percent(ratio: f64) -> String {
    format!("{:+.2}%", ratio * 100.0)
}

fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

fn header(out: &mut String, title: &str) {
    out.push_str(RULE);
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    out.push_str(RULE);
    out.push('\n');
}

fn line(out: &mut String, text: impl AsRef<str>) {
    out.push_str(text.as_ref());
    out.push('\n');
}

/// Weekday ranking with the countdown to the best day.
pub fn render_timing(symbol: &str, timing: &TimingInfo) -> String {
    let mut out = String::new();
    header(&mut out, &format!("BEST WEEKDAY - {}", symbol));

    line(
        &mut out,
        format!(
            "Best day: {} (score {:.4}, confidence {}, {} samples)",
            weekday_name(timing.best_day),
            timing.best_day_score,
            timing.confidence.label(),
            timing.total_samples
        ),
    );
    line(&mut out, format!("Today: {}", weekday_name(timing.current_weekday)));
    if timing.is_best_day_today {
        line(&mut out, "Today is the best day to buy");
    } else {
        line(
            &mut out,
            format!(
                "Next best day: {} ({} day(s), {:.1}h, urgency {})",
                timing.next_best_day.format("%Y-%m-%d %H:%M UTC"),
                timing.days_until_best_day,
                timing.hours_until_best_day,
                timing.urgency.label()
            ),
        );
    }

    let mut ranked = timing.per_day.clone();
    ranked.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
    if !ranked.is_empty() {
        line(&mut out, "");
        line(
            &mut out,
            format!(
                "{:<10} {:>10} {:>9} {:>9} {:>7} {:>9}",
                "Day", "AvgFwdRet", "Positive", "Vol", "N", "Score"
            ),
        );
        for stats in &ranked {
            line(
                &mut out,
                format!(
                    "{:<10} {:>10} {:>8.1}% {:>9.4} {:>7} {:>9.4}",
                    weekday_name(stats.weekday),
                    signed_percent(stats.avg_forward_return),
                    stats.positive_rate * 100.0,
                    stats.volatility,
                    stats.sample_count,
                    stats.combined_score
                ),
            );
        }
    }
    out
}

/// Multi-timeframe decision, per-timeframe outcomes and timing.
pub fn render_market_analysis(analysis: &MarketAnalysis) -> String {
    let mut out = render_timing(&analysis.symbol, &analysis.timing);
    line(&mut out, "");
    header(&mut out, "MULTI-TIMEFRAME ANALYSIS");

    for tf in &analysis.timeframes {
        match &tf.outcome {
            AnalysisOutcome::Computed(a) => {
                let s = &a.snapshot;
                line(
                    &mut out,
                    format!(
                        "[{}] score {:+.3} -> {} (x{:.2})",
                        tf.timeframe.interval(),
                        a.breakdown.final_score,
                        a.decision.recommendation,
                        a.decision.investment_multiplier
                    ),
                );
                line(
                    &mut out,
                    format!(
                        "     price {:.2} | RSI {:.1} | %B {:.2} | Z {:+.2} | vol x{:.2} | MACD hist {:+.4} | ROC {:+.2}%",
                        s.current_price,
                        s.rsi,
                        s.bollinger_percent_b,
                        s.z_score,
                        s.volume_ratio,
                        s.macd_histogram,
                        s.roc
                    ),
                );
            }
            AnalysisOutcome::InsufficientData {
                required,
                available,
            } => line(
                &mut out,
                format!(
                    "[{}] skipped: {} of {} bars",
                    tf.timeframe.interval(),
                    available,
                    required
                ),
            ),
            AnalysisOutcome::ProviderError { message } => line(
                &mut out,
                format!("[{}] skipped: {}", tf.timeframe.interval(), message),
            ),
        }
    }

    let decision = &analysis.combined.decision;
    line(&mut out, "");
    line(
        &mut out,
        format!(
            "Combined score {:+.3}: {} - invest {} (x{:.2})",
            decision.final_score,
            decision.recommendation,
            money(decision.investment_amount),
            decision.investment_multiplier
        ),
    );
    line(
        &mut out,
        format!(
            "Next Monday session: {} ({:.1}h, urgency {})",
            analysis.session.next_session.format("%Y-%m-%d %H:%M UTC"),
            analysis.session.hours_until,
            analysis.session.urgency.label()
        ),
    );
    out
}

/// Backtest totals, regular-DCA comparison and best/worst trades.
pub fn render_backtest(result: &BacktestResult, comparison: &StrategyComparison) -> String {
    let mut out = String::new();
    header(
        &mut out,
        &format!("DCA BACKTEST - {}", weekday_name(result.weekday).to_uppercase()),
    );

    let m = &result.metrics;
    let regular = &m.regular_dca_comparison;
    line(
        &mut out,
        format!(
            "Purchases: {} over {:.1} years (base {})",
            result.trades.len(),
            comparison.period_years,
            money(result.base_investment)
        ),
    );
    line(
        &mut out,
        format!(
            "Scored DCA:  invested {}, value {}, return {}",
            money(result.total_invested),
            money(result.final_value),
            signed_percent(result.total_return)
        ),
    );
    line(
        &mut out,
        format!(
            "Regular DCA: invested {}, value {}, return {}",
            money(regular.regular_invested),
            money(regular.regular_value),
            signed_percent(regular.regular_return)
        ),
    );
    line(
        &mut out,
        format!(
            "Improvement {:+.2}% | capital difference {} | capital efficiency {:+.3}",
            comparison.return_improvement,
            money(comparison.capital_difference),
            comparison.capital_efficiency
        ),
    );
    line(
        &mut out,
        format!(
            "Average purchase price {:.2}, final price {:.2}",
            result.avg_purchase_price(),
            result.final_price
        ),
    );
    line(
        &mut out,
        format!(
            "Investment min/avg/max: {} / {} / {}, multiplier {:.2} / {:.2} / {:.2}",
            money(m.min_investment),
            money(m.avg_investment),
            money(m.max_investment),
            m.min_multiplier,
            m.avg_multiplier,
            m.max_multiplier
        ),
    );

    line(&mut out, "");
    line(&mut out, "Recommendations:");
    for entry in &m.recommendation_distribution {
        line(
            &mut out,
            format!(
                "  {:<20} {:>5} ({:.1}%)",
                entry.recommendation,
                entry.count,
                entry.percentage
            ),
        );
    }

    let ranked = result.ranked_trades();
    let trade_line = |t: &crate::types::TradeRecord| {
        format!(
            "  {} @ {:.2}: {} x{:.2} -> {}",
            t.date.format("%Y-%m-%d"),
            t.price,
            money(t.investment_amount),
            t.multiplier,
            signed_percent(t.roi(result.final_price) / 100.0)
        )
    };
    line(&mut out, "");
    line(&mut out, "Best trades:");
    for trade in ranked.iter().take(5) {
        line(&mut out, trade_line(trade));
    }
    line(&mut out, "Worst trades:");
    for trade in ranked.iter().rev().take(5) {
        line(&mut out, trade_line(trade));
    }
    out
}

/// Plain DCA per weekday, best return first.
pub fn render_weekday_comparison(results: &[WeekdayDcaResult]) -> String {
    let mut out = String::new();
    header(&mut out, "REGULAR DCA BY WEEKDAY");

    let mut ranked: Vec<&WeekdayDcaResult> = results.iter().collect();
    ranked.sort_by(|a, b| b.total_return.total_cmp(&a.total_return));
    for (rank, r) in ranked.iter().enumerate() {
        line(
            &mut out,
            format!(
                "{}. {:<10} {:>4} buys, invested {:>12}, value {:>12}, return {}",
                rank + 1,
                weekday_name(r.weekday),
                r.operations,
                money(r.total_invested),
                money(r.final_value),
                signed_percent(r.total_return)
            ),
        );
    }
    out
}

/// Scored DCA against the best plain weekday, with a recommendation.
pub fn render_best_weekday(cmp: &BestWeekdayComparison) -> String {
    let mut out = String::new();
    header(&mut out, "SCORED DCA VS BEST PLAIN WEEKDAY");

    let scored = weekday_name(cmp.scored_weekday);
    let best = weekday_name(cmp.best_regular_day);
    line(
        &mut out,
        format!(
            "Plain {}: {} | scored {}: {} ({:+.2}%)",
            scored,
            signed_percent(cmp.same_day_regular_return),
            scored,
            signed_percent(cmp.scored_return),
            cmp.improvement_vs_same_day
        ),
    );
    line(
        &mut out,
        format!(
            "Best plain weekday: {} {} | scored vs best {:+.2}%",
            best,
            signed_percent(cmp.best_regular_return),
            cmp.improvement_vs_best
        ),
    );
    line(&mut out, format!("Capital factor: {:.2}x", cmp.capital_factor));
    let advice = match cmp.verdict {
        WeekdayVerdict::Marginal => format!(
            "Differences are small; scored {} keeps sizing flexible",
            scored
        ),
        WeekdayVerdict::UseScored => format!("Use scored {} DCA", scored),
        WeekdayVerdict::UseRegular => format!("Consider plain DCA on {}", best),
    };
    line(&mut out, format!("Recommendation: {}", advice));
    out
}

fn pattern_line(bucket: &PatternBucket) -> String {
    let mut text = format!(
        "  {:<24} {:+.3} ({} samples)",
        bucket.label, bucket.forward_4.mean, bucket.forward_4.count
    );
    if let Some(long) = bucket.forward_12 {
        text.push_str(&format!(", 12 bars {:+.3}", long.mean));
    }
    if let Some(rsi) = bucket.avg_rsi {
        text.push_str(&format!(", RSI {:.1}", rsi));
    }
    text
}

fn ranked_section(out: &mut String, title: &str, buckets: &[PatternBucket]) {
    let mut ranked: Vec<&PatternBucket> = buckets.iter().collect();
    ranked.sort_by(|a, b| b.forward_4.mean.total_cmp(&a.forward_4.mean));
    line(out, "");
    line(out, title);
    for bucket in ranked {
        line(out, pattern_line(bucket));
    }
}

/// Calendar and entry-point patterns of 4-bar forward returns.
pub fn render_patterns(timing: &TimingPatterns, entries: &EntryPointAnalysis) -> String {
    let mut out = String::new();
    header(&mut out, "HISTORICAL DCA PATTERNS (mean 4-bar forward return)");

    ranked_section(&mut out, "Months:", &timing.by_month);
    ranked_section(&mut out, "Quarters:", &timing.by_quarter);
    line(&mut out, "");
    line(&mut out, "Best weeks of the year:");
    for bucket in &timing.best_weeks {
        line(&mut out, pattern_line(bucket));
    }
    line(&mut out, "Worst weeks of the year:");
    for bucket in &timing.worst_weeks {
        line(&mut out, pattern_line(bucket));
    }

    ranked_section(&mut out, "By RSI at entry:", &entries.rsi);
    ranked_section(&mut out, "By Bollinger %B at entry:", &entries.percent_b);
    ranked_section(&mut out, "By Z-Score at entry:", &entries.z_score);
    out
}

/// Conditional DCA strategies on weekly bars.
pub fn render_strategies(results: &[StrategyResult]) -> String {
    let mut out = String::new();
    header(&mut out, "WEEKLY DCA STRATEGIES");

    for r in results {
        line(
            &mut out,
            format!(
                "{:<26} {:>4} buys, invested {:>12}, value {:>12}, return {}",
                r.kind.name(),
                r.purchases,
                money(r.total_invested),
                money(r.final_value),
                signed_percent(r.total_return)
            ),
        );
    }
    out
}
