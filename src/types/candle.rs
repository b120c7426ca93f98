use chrono::{DateTime, Datelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Milliseconds in one day.
pub const MS_PER_DAY: i64 = 86_400_000;

/// OHLCV candle as delivered by the exchange, plus taker-buy volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
    /// Bar open time (Unix milliseconds).
    pub timestamp: i64,
    /// Bar close time (Unix milliseconds).
    pub close_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Base-asset volume bought by takers.
    pub taker_buy_volume: f64,
}

impl PriceBar {
    /// Open time as a UTC datetime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }

    /// UTC weekday of the bar open.
    pub fn weekday(&self) -> Weekday {
        self.datetime().weekday()
    }
}

/// Chronological, de-duplicated sequence of bars.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, sorting by open time and dropping duplicate timestamps.
    pub fn new(mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        Self { bars }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Closing prices in chronological order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// The latest `limit` bars in `[timestamp - days, timestamp]`.
    ///
    /// A bar opening at `timestamp` is always the last one in the window.
    pub fn window_ending_at(&self, timestamp: i64, days: i64, limit: usize) -> &[PriceBar] {
        let cutoff = timestamp - days * MS_PER_DAY;
        let start = self.bars.partition_point(|b| b.timestamp < cutoff);
        let end = self.bars.partition_point(|b| b.timestamp <= timestamp);
        if start >= end {
            return &[];
        }
        &self.bars[start.max(end.saturating_sub(limit))..end]
    }

    /// Bars whose open falls on the given weekday.
    pub fn on_weekday(&self, weekday: Weekday) -> impl Iterator<Item = &PriceBar> {
        self.bars.iter().filter(move |b| b.weekday() == weekday)
    }
}

impl From<Vec<PriceBar>> for PriceSeries {
    fn from(bars: Vec<PriceBar>) -> Self {
        Self::new(bars)
    }
}

/// Trailing slice of `bars` dated within `days` of the last bar.
pub fn trailing_days(bars: &[PriceBar], days: i64) -> &[PriceBar] {
    let Some(last) = bars.last() else {
        return bars;
    };
    let cutoff = last.timestamp - days * MS_PER_DAY;
    let start = bars.partition_point(|b| b.timestamp < cutoff);
    &bars[start..]
}

/// Candle interval used for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1d")]
    Daily,
    #[serde(rename = "4h")]
    FourHour,
    #[serde(rename = "1w")]
    Weekly,
}

impl Timeframe {
    /// Parse from an exchange interval string.
    pub fn from_interval(s: &str) -> Option<Self> {
        match s {
            "1d" => Some(Timeframe::Daily),
            "4h" => Some(Timeframe::FourHour),
            "1w" => Some(Timeframe::Weekly),
            _ => None,
        }
    }

    /// Exchange interval string.
    pub fn interval(&self) -> &'static str {
        match self {
            Timeframe::Daily => "1d",
            Timeframe::FourHour => "4h",
            Timeframe::Weekly => "1w",
        }
    }

    /// Weight of this timeframe in the multi-timeframe average.
    pub fn weight(&self) -> f64 {
        match self {
            Timeframe::Daily => 0.5,
            Timeframe::FourHour => 0.3,
            Timeframe::Weekly => 0.2,
        }
    }

    /// All timeframes in evaluation order.
    pub fn all() -> [Timeframe; 3] {
        [Timeframe::Daily, Timeframe::FourHour, Timeframe::Weekly]
    }
}
