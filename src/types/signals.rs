use crate::types::Timeframe;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound of the investment multiplier.
pub const MIN_INVESTMENT_MULTIPLIER: f64 = 0.5;
/// Upper bound of the investment multiplier.
pub const MAX_INVESTMENT_MULTIPLIER: f64 = 2.0;

/// Category of a technical indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Trend,
    Momentum,
    Volatility,
    Volume,
}

impl SignalCategory {
    /// Get display name for this category.
    pub fn name(&self) -> &'static str {
        match self {
            SignalCategory::Trend => "Trend",
            SignalCategory::Momentum => "Momentum",
            SignalCategory::Volatility => "Volatility",
            SignalCategory::Volume => "Volume",
        }
    }
}

/// Indicator values as of the last bar of a series window.
///
/// Values may be NaN where the underlying arithmetic is undefined (flat
/// prices for Bollinger %B, no movement at all for RSI); they are never
/// silently replaced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub bollinger_upper: f64,
    pub bollinger_middle: f64,
    pub bollinger_lower: f64,
    pub bollinger_percent_b: f64,
    pub z_score: f64,
    pub current_volume: f64,
    pub avg_volume: f64,
    pub volume_ratio: f64,
    pub current_buy_pressure: f64,
    pub avg_buy_pressure: f64,
    pub buy_pressure_ratio: f64,
    pub macd_line: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub roc: f64,
    pub current_price: f64,
    /// Open time of the last bar (Unix milliseconds).
    pub timestamp: i64,
}

/// Categorical buy recommendation derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "COMPRA FUERTE")]
    StrongBuy,
    #[serde(rename = "COMPRA MODERADA")]
    ModerateBuy,
    #[serde(rename = "NEUTRAL")]
    Neutral,
    #[serde(rename = "PRECAUCIÓN")]
    Caution,
    #[serde(rename = "EVITAR COMPRA")]
    AvoidBuying,
}

impl Recommendation {
    /// Map a final score onto the five recommendation bands.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.5 {
            Recommendation::StrongBuy
        } else if score >= 0.2 {
            Recommendation::ModerateBuy
        } else if score >= -0.2 {
            Recommendation::Neutral
        } else if score >= -0.5 {
            Recommendation::Caution
        } else {
            Recommendation::AvoidBuying
        }
    }

    /// User-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "COMPRA FUERTE",
            Recommendation::ModerateBuy => "COMPRA MODERADA",
            Recommendation::Neutral => "NEUTRAL",
            Recommendation::Caution => "PRECAUCIÓN",
            Recommendation::AvoidBuying => "EVITAR COMPRA",
        }
    }

    /// All recommendations, strongest first.
    pub fn all() -> [Recommendation; 5] {
        [
            Recommendation::StrongBuy,
            Recommendation::ModerateBuy,
            Recommendation::Neutral,
            Recommendation::Caution,
            Recommendation::AvoidBuying,
        ]
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-indicator sub-scores and the weighted final score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub rsi_score: f64,
    pub bb_score: f64,
    pub zscore_score: f64,
    /// Only scored by profiles that weigh volume.
    pub volume_score: Option<f64>,
    pub macd_score: f64,
    pub roc_score: f64,
    /// Only scored by profiles that weigh the weekday pattern.
    pub best_day_score: Option<f64>,
    /// Flat additive term (best-day timing bonus or fixed weekday bonus).
    pub timing_bonus: f64,
    pub final_score: f64,
}

/// Sizing decision for one purchase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentDecision {
    pub final_score: f64,
    /// Always within [0.5, 2.0].
    pub investment_multiplier: f64,
    pub investment_amount: f64,
    pub recommendation: Recommendation,
}

impl InvestmentDecision {
    /// Build a decision from a final score and the base investment.
    pub fn from_score(final_score: f64, base_investment: f64) -> Self {
        let investment_multiplier = clamp_multiplier(1.0 + final_score);
        Self {
            final_score,
            investment_multiplier,
            investment_amount: base_investment * investment_multiplier,
            recommendation: Recommendation::from_score(final_score),
        }
    }
}

/// Final score of one timeframe in a multi-timeframe analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeScore {
    pub timeframe: Timeframe,
    pub final_score: f64,
    pub weight: f64,
}

/// Weighted combination of per-timeframe scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiTimeframeDecision {
    /// Timeframes that produced a score.
    pub timeframes: Vec<TimeframeScore>,
    /// Timeframes that could not be scored.
    pub skipped: Vec<Timeframe>,
    pub decision: InvestmentDecision,
}

/// Clamp a raw multiplier into the allowed range.
///
/// NaN maps to the neutral multiplier so the bound holds unconditionally.
pub fn clamp_multiplier(raw: f64) -> f64 {
    if raw.is_nan() {
        return 1.0;
    }
    raw.clamp(MIN_INVESTMENT_MULTIPLIER, MAX_INVESTMENT_MULTIPLIER)
}
