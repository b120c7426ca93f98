use crate::services::backtester::BacktestError;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Insufficient data: need {required} bars, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("No historical data returned for {0}")]
    EmptyHistory(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Backtest(#[from] BacktestError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
