use chrono::{DateTime, Utc, Weekday};
use serde::{Serialize, Serializer};

/// Weekdays in Monday-first order.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Full English name of a weekday.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parse a weekday from an English name or abbreviation ("thursday", "Thu").
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    s.trim().parse::<Weekday>().ok()
}

fn serialize_weekday<S: Serializer>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(weekday_name(*day))
}

/// Confidence attached to a best-weekday pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn label(&self) -> &'static str {
        match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
        }
    }
}

/// Forward-return statistics for one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayStats {
    #[serde(serialize_with = "serialize_weekday")]
    pub weekday: Weekday,
    pub avg_forward_return: f64,
    /// Fraction of samples with a positive forward return.
    pub positive_rate: f64,
    /// Sample standard deviation of the forward returns.
    pub volatility: f64,
    pub sample_count: usize,
    pub combined_score: f64,
}

/// Outcome of the weekday pattern analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestDayResult {
    #[serde(serialize_with = "serialize_weekday")]
    pub best_day: Weekday,
    pub best_day_score: f64,
    pub confidence: Confidence,
    pub total_samples: usize,
    /// Eligible weekdays only, Monday first.
    pub per_day: Vec<WeekdayStats>,
}

impl BestDayResult {
    /// Placeholder returned when history is too short to rank weekdays.
    pub fn degenerate() -> Self {
        Self {
            best_day: Weekday::Mon,
            best_day_score: 0.0,
            confidence: Confidence::Low,
            total_samples: 0,
            per_day: Vec::new(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.per_day.is_empty()
    }

    pub fn stats_for(&self, day: Weekday) -> Option<&WeekdayStats> {
        self.per_day.iter().find(|s| s.weekday == day)
    }

    /// Per-day stats sorted by combined score, best first.
    pub fn ranked(&self) -> Vec<WeekdayStats> {
        let mut ranked = self.per_day.clone();
        ranked.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
        ranked
    }
}

/// How favourable the best weekday's own recent behaviour is for buying.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPatternScore {
    #[serde(serialize_with = "serialize_weekday")]
    pub best_day: Weekday,
    /// Sub-score consumed by the composite scorer.
    pub best_day_score: f64,
    /// |best-day mean return - other-days mean return|.
    pub pattern_strength: f64,
    pub avg_best_day_return: f64,
    pub best_day_volatility: f64,
    pub best_day_positive_rate: f64,
    /// Best-day volatility over other-days volatility.
    pub volatility_ratio: f64,
}

impl DayPatternScore {
    /// Zeroed score used when the window is too short.
    pub fn neutral(best_day: Weekday) -> Self {
        Self {
            best_day,
            best_day_score: 0.0,
            pattern_strength: 0.0,
            avg_best_day_return: 0.0,
            best_day_volatility: 0.0,
            best_day_positive_rate: 0.0,
            volatility_ratio: 1.0,
        }
    }
}

/// How soon a target moment is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Inmediata,
    Alta,
    Media,
    Baja,
}

impl Urgency {
    /// Classify by hours remaining.
    pub fn from_hours(hours: f64) -> Self {
        if hours < 12.0 {
            Urgency::Inmediata
        } else if hours < 24.0 {
            Urgency::Alta
        } else if hours < 48.0 {
            Urgency::Media
        } else {
            Urgency::Baja
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Urgency::Inmediata => "INMEDIATA",
            Urgency::Alta => "ALTA",
            Urgency::Media => "MEDIA",
            Urgency::Baja => "BAJA",
        }
    }
}

/// Wall-clock framing of a best-day result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingInfo {
    pub now: DateTime<Utc>,
    #[serde(serialize_with = "serialize_weekday")]
    pub current_weekday: Weekday,
    #[serde(serialize_with = "serialize_weekday")]
    pub best_day: Weekday,
    pub best_day_score: f64,
    pub confidence: Confidence,
    pub is_best_day_today: bool,
    pub days_until_best_day: u32,
    pub hours_until_best_day: f64,
    pub next_best_day: DateTime<Utc>,
    pub urgency: Urgency,
    pub total_samples: usize,
    pub per_day: Vec<WeekdayStats>,
}

/// Time until the next weekly session opening (09:00 UTC on a weekday).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTiming {
    pub next_session: DateTime<Utc>,
    pub hours_until: f64,
    pub urgency: Urgency,
    pub timing_score: f64,
    pub is_session_day_today: bool,
}
