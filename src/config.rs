use crate::error::{AppError, Result};
use chrono::NaiveDate;
use std::env;

/// Scoring and backtest window settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Bars requested per timeframe for a live score.
    pub kline_limit: usize,
    /// Bars required before a comprehensive score is attempted.
    pub min_bars: usize,
    /// Calendar days of history behind each backtested trade.
    pub context_days: i64,
    /// Refetch context from the provider for every backtested trade.
    pub refetch_context: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            kline_limit: 200,
            min_bars: 50,
            context_days: 200,
            refetch_context: false,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Trading pair, e.g. BTCUSDT.
    pub symbol: String,
    /// Base amount per purchase before the multiplier.
    pub base_investment: f64,
    /// Binance REST base URL.
    pub binance_api_url: String,
    /// Binance API key (optional, public endpoints work without).
    pub binance_api_key: Option<String>,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// First day of backtest history (YYYY-MM-DD).
    pub start_date: String,
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AnalysisConfig::default();

        Self {
            symbol: lookup("DCA_SYMBOL")
                .map(|s| s.trim().to_uppercase())
                .unwrap_or_else(|| "BTCUSDT".to_string()),
            base_investment: lookup("DCA_BASE_INVESTMENT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(250.0),
            binance_api_url: lookup("BINANCE_API_URL")
                .unwrap_or_else(|| crate::sources::binance::BINANCE_API_URL.to_string()),
            binance_api_key: lookup("BINANCE_API_KEY").filter(|k| !k.is_empty()),
            request_timeout_secs: lookup("DCA_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            start_date: lookup("DCA_START_DATE").unwrap_or_else(|| "2020-01-01".to_string()),
            analysis: AnalysisConfig {
                kline_limit: lookup("DCA_KLINE_LIMIT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.kline_limit),
                min_bars: lookup("DCA_MIN_BARS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.min_bars),
                context_days: lookup("DCA_CONTEXT_DAYS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.context_days),
                refetch_context: lookup("DCA_REFETCH_CONTEXT")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(defaults.refetch_context),
            },
        }
    }

    /// Reject values the analysis cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() {
            return Err(AppError::InvalidConfig("symbol must not be empty".to_string()));
        }
        if !(self.base_investment.is_finite() && self.base_investment > 0.0) {
            return Err(AppError::InvalidConfig(format!(
                "base investment must be positive, got {}",
                self.base_investment
            )));
        }
        if self.analysis.kline_limit == 0 || self.analysis.min_bars == 0 {
            return Err(AppError::InvalidConfig(
                "kline limit and minimum bars must be positive".to_string(),
            ));
        }
        if self.analysis.context_days <= 0 {
            return Err(AppError::InvalidConfig(format!(
                "context days must be positive, got {}",
                self.analysis.context_days
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::InvalidConfig(
                "request timeout must be positive".to_string(),
            ));
        }
        self.start_timestamp().map(|_| ())
    }

    /// Start date as Unix milliseconds at 00:00 UTC.
    pub fn start_timestamp(&self) -> Result<i64> {
        parse_date_millis(&self.start_date)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Parse `YYYY-MM-DD` to Unix milliseconds at 00:00 UTC.
pub fn parse_date_millis(date: &str) -> Result<i64> {
    let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| AppError::InvalidConfig(format!("invalid start date {:?}: {}", date, e)))?;
    Ok(parsed
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default())
}
