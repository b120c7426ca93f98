pub mod backtest;
pub mod candle;
pub mod patterns;
pub mod signals;
pub mod weekday;

pub use backtest::*;
pub use candle::*;
pub use patterns::*;
pub use signals::*;
pub use weekday::*;
