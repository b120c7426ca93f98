use serde::Serialize;

/// Summary statistics of a set of forward returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnStats {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation. NaN below two samples.
    pub std_dev: f64,
    pub count: usize,
}

/// Forward-return and indicator averages for one group of bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternBucket {
    pub label: String,
    /// Returns 4 bars ahead.
    pub forward_4: ReturnStats,
    /// Returns 12 bars ahead; `None` when no bar in the group has one.
    pub forward_12: Option<ReturnStats>,
    pub avg_rsi: Option<f64>,
    pub avg_percent_b: Option<f64>,
    pub avg_z_score: Option<f64>,
}

/// Calendar seasonality of forward returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingPatterns {
    /// ISO week of the year, ascending.
    pub by_week_of_year: Vec<PatternBucket>,
    pub by_month: Vec<PatternBucket>,
    pub by_quarter: Vec<PatternBucket>,
    /// Weeks with the highest mean 4-bar return, best first.
    pub best_weeks: Vec<PatternBucket>,
    /// Weeks with the lowest mean 4-bar return, worst first.
    pub worst_weeks: Vec<PatternBucket>,
}

/// Forward returns grouped by the indicator reading at entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPointAnalysis {
    pub rsi: Vec<PatternBucket>,
    pub percent_b: Vec<PatternBucket>,
    pub z_score: Vec<PatternBucket>,
}
