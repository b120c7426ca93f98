//! dca-scout - indicator-scored dollar-cost averaging for crypto pairs

pub mod config;
pub mod error;
pub mod report;
pub mod services;
pub mod sources;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use types::*;
