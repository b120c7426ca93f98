//! Technical indicator implementations.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod roc;
pub mod rsi;
pub mod volume;
pub mod zscore;

pub use bollinger::{BollingerBands, BollingerOutput};
pub use ema::Ema;
pub use macd::{Macd, MacdOutput};
pub use roc::Roc;
pub use rsi::Rsi;
pub use volume::{VolumeOutput, VolumeProfile};
pub use zscore::ZScore;
