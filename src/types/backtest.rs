use crate::types::{InvestmentDecision, Recommendation};
use chrono::{DateTime, Utc, Weekday};
use serde::{Serialize, Serializer};

fn serialize_weekday<S: Serializer>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(crate::types::weekday_name(*day))
}

/// What drove the size of a backtested purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TradeRecommendation {
    /// The scorer produced a decision.
    Scored(Recommendation),
    /// Not enough context bars; bought the base amount.
    InsufficientData,
    /// Context could not be fetched; bought the base amount.
    ProviderError,
}

impl TradeRecommendation {
    pub fn label(&self) -> &'static str {
        match self {
            TradeRecommendation::Scored(r) => r.label(),
            TradeRecommendation::InsufficientData => "NEUTRAL",
            TradeRecommendation::ProviderError => "ERROR - DCA NORMAL",
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, TradeRecommendation::Scored(_))
    }
}

impl Serialize for TradeRecommendation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One simulated purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub date: DateTime<Utc>,
    pub price: f64,
    pub investment_amount: f64,
    pub coins_bought: f64,
    pub multiplier: f64,
    pub score: f64,
    pub recommendation: TradeRecommendation,
    /// Indicator values when the scorer ran.
    pub indicators: Option<crate::types::IndicatorSnapshot>,
}

impl TradeRecord {
    /// Purchase sized by a scorer decision.
    pub fn scored(
        date: DateTime<Utc>,
        price: f64,
        decision: &InvestmentDecision,
        indicators: crate::types::IndicatorSnapshot,
    ) -> Self {
        Self {
            date,
            price,
            investment_amount: decision.investment_amount,
            coins_bought: decision.investment_amount / price,
            multiplier: decision.investment_multiplier,
            score: decision.final_score,
            recommendation: TradeRecommendation::Scored(decision.recommendation),
            indicators: Some(indicators),
        }
    }

    /// Base-amount purchase used when no decision could be computed.
    pub fn fallback(
        date: DateTime<Utc>,
        price: f64,
        base_investment: f64,
        recommendation: TradeRecommendation,
    ) -> Self {
        Self {
            date,
            price,
            investment_amount: base_investment,
            coins_bought: base_investment / price,
            multiplier: 1.0,
            score: 0.0,
            recommendation,
            indicators: None,
        }
    }

    /// Value of this purchase at `final_price`.
    pub fn current_value(&self, final_price: f64) -> f64 {
        self.coins_bought * final_price
    }

    /// Return on this purchase at `final_price`, in percent.
    pub fn roi(&self, final_price: f64) -> f64 {
        (self.current_value(final_price) - self.investment_amount) / self.investment_amount * 100.0
    }
}

/// Number of trades that received a recommendation label.
///
/// Trades are grouped by label, so base-amount fallbacks for short history
/// share the NEUTRAL row with scored NEUTRAL trades.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationCount {
    pub recommendation: &'static str,
    pub count: usize,
    pub percentage: f64,
}

/// Same schedule bought with the base amount every time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegularDcaComparison {
    pub regular_invested: f64,
    pub regular_coins: f64,
    pub regular_value: f64,
    pub regular_return: f64,
    /// Relative return improvement over regular DCA, in percent.
    pub improvement_percentage: f64,
}

/// Aggregate statistics over a backtest's trades.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub avg_investment: f64,
    pub max_investment: f64,
    pub min_investment: f64,
    pub avg_multiplier: f64,
    pub max_multiplier: f64,
    pub min_multiplier: f64,
    pub recommendation_distribution: Vec<RecommendationCount>,
    pub regular_dca_comparison: RegularDcaComparison,
}

/// Result of a fixed-weekday DCA backtest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    #[serde(serialize_with = "serialize_weekday")]
    pub weekday: Weekday,
    pub base_investment: f64,
    pub total_invested: f64,
    pub total_coins: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub final_price: f64,
    pub trades: Vec<TradeRecord>,
    pub metrics: PerformanceMetrics,
}

impl BacktestResult {
    /// Trades sorted by ROI at the final price, best first.
    pub fn ranked_trades(&self) -> Vec<&TradeRecord> {
        let mut ranked: Vec<&TradeRecord> = self.trades.iter().collect();
        ranked.sort_by(|a, b| b.roi(self.final_price).total_cmp(&a.roi(self.final_price)));
        ranked
    }

    /// Mean purchase price over all trades.
    pub fn avg_purchase_price(&self) -> f64 {
        if self.trades.is_empty() {
            return 0.0;
        }
        self.trades.iter().map(|t| t.price).sum::<f64>() / self.trades.len() as f64
    }
}

/// Plain fixed-amount DCA on a single weekday.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayDcaResult {
    #[serde(serialize_with = "serialize_weekday")]
    pub weekday: Weekday,
    pub total_invested: f64,
    pub total_coins: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub operations: usize,
}

/// Scored DCA measured against regular DCA on the same dates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyComparison {
    pub return_difference: f64,
    /// Relative improvement over the regular return, in percent.
    pub return_improvement: f64,
    pub capital_difference: f64,
    pub capital_efficiency: f64,
    pub period_years: f64,
}

/// Which schedule to prefer after comparing against the best plain weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekdayVerdict {
    /// Within 5% of the best plain weekday either way; scored sizing kept for
    /// its flexibility.
    Marginal,
    /// Scored DCA clearly beats the best plain weekday.
    UseScored,
    /// Plain DCA on the best weekday clearly wins.
    UseRegular,
}

impl WeekdayVerdict {
    /// Verdict for a relative improvement in percent.
    pub fn from_improvement(improvement: f64) -> Self {
        if improvement.abs() < 5.0 {
            WeekdayVerdict::Marginal
        } else if improvement > 0.0 {
            WeekdayVerdict::UseScored
        } else {
            WeekdayVerdict::UseRegular
        }
    }
}

/// Scored DCA on one weekday against plain DCA on every weekday.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestWeekdayComparison {
    #[serde(serialize_with = "serialize_weekday")]
    pub scored_weekday: Weekday,
    pub scored_return: f64,
    /// Plain DCA return on the scored weekday.
    pub same_day_regular_return: f64,
    /// Improvement over the same weekday bought plainly, in percent.
    pub improvement_vs_same_day: f64,
    #[serde(serialize_with = "serialize_weekday")]
    pub best_regular_day: Weekday,
    pub best_regular_return: f64,
    /// Improvement over the best plain weekday, in percent.
    pub improvement_vs_best: f64,
    /// Average scored purchase over the base amount.
    pub capital_factor: f64,
    pub beats_best_regular: bool,
    pub verdict: WeekdayVerdict,
}

/// Purchase rule for the conditional strategy simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "threshold")]
pub enum StrategyKind {
    /// Buy every bar.
    Regular,
    RsiBelow(f64),
    ZScoreBelow(f64),
    PercentBBelow(f64),
}

impl StrategyKind {
    pub fn name(&self) -> String {
        match self {
            StrategyKind::Regular => "DCA every bar".to_string(),
            StrategyKind::RsiBelow(t) => format!("DCA when RSI < {}", t),
            StrategyKind::ZScoreBelow(t) => format!("DCA when Z-Score < {}", t),
            StrategyKind::PercentBBelow(t) => format!("DCA when %B < {}", t),
        }
    }
}

/// Outcome of one conditional strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyResult {
    pub kind: StrategyKind,
    pub total_invested: f64,
    pub total_coins: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub purchases: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_fallback_trade_buys_base_amount() {
        let trade = TradeRecord::fallback(date(), 50.0, 250.0, TradeRecommendation::ProviderError);
        assert_eq!(trade.coins_bought, 5.0);
        assert_eq!(trade.multiplier, 1.0);
        assert_eq!(trade.recommendation.label(), "ERROR - DCA NORMAL");
    }

    #[test]
    fn test_trade_roi() {
        let trade = TradeRecord::fallback(date(), 100.0, 200.0, TradeRecommendation::InsufficientData);
        assert!((trade.roi(150.0) - 50.0).abs() < 1e-9);
        assert!((trade.current_value(50.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_trade_recommendation_labels() {
        assert_eq!(TradeRecommendation::InsufficientData.label(), "NEUTRAL");
        assert_eq!(
            TradeRecommendation::Scored(Recommendation::StrongBuy).label(),
            "COMPRA FUERTE"
        );
        assert!(!TradeRecommendation::ProviderError.is_scored());
    }

    #[test]
    fn test_weekday_verdict_thresholds() {
        assert_eq!(WeekdayVerdict::from_improvement(4.9), WeekdayVerdict::Marginal);
        assert_eq!(WeekdayVerdict::from_improvement(-4.9), WeekdayVerdict::Marginal);
        assert_eq!(WeekdayVerdict::from_improvement(5.0), WeekdayVerdict::UseScored);
        assert_eq!(WeekdayVerdict::from_improvement(-12.0), WeekdayVerdict::UseRegular);
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(StrategyKind::RsiBelow(50.0).name(), "DCA when RSI < 50");
        assert_eq!(StrategyKind::ZScoreBelow(-0.5).name(), "DCA when Z-Score < -0.5");
    }
}
