//! Market data sources.
//!
//! The scoring core never talks to the network itself; it consumes bars
//! through [`MarketDataProvider`].

pub mod binance;

pub use binance::BinanceClient;

use crate::error::{AppError, Result};
use crate::types::{PriceBar, PriceSeries, Timeframe};
use async_trait::async_trait;
use tracing::{debug, info};

/// Page size used when downloading full history.
pub const HISTORY_PAGE_LIMIT: usize = 1000;

/// Candle query against a market data provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlineRequest {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Earliest bar open time (Unix milliseconds).
    pub start_time: Option<i64>,
    /// Latest bar open time (Unix milliseconds).
    pub end_time: Option<i64>,
    pub limit: usize,
}

impl KlineRequest {
    /// Most recent `limit` bars.
    pub fn latest(symbol: &str, timeframe: Timeframe, limit: usize) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe,
            start_time: None,
            end_time: None,
            limit,
        }
    }

    /// Up to `limit` bars from `start_time`, optionally bounded by `end_time`.
    pub fn range(
        symbol: &str,
        timeframe: Timeframe,
        start_time: i64,
        end_time: Option<i64>,
        limit: usize,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe,
            start_time: Some(start_time),
            end_time,
            limit,
        }
    }
}

/// Source of historical candles.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch bars matching `request`, oldest first.
    async fn fetch_klines(&self, request: &KlineRequest) -> Result<Vec<PriceBar>>;
}

/// Download all bars from `start_time` up to `end_time`.
///
/// Pages of [`HISTORY_PAGE_LIMIT`] bars are requested with the cursor moved
/// past the last bar's close time. An empty first page is
/// [`AppError::EmptyHistory`]; any failed page aborts the download.
pub async fn fetch_history<P: MarketDataProvider + ?Sized>(
    provider: &P,
    symbol: &str,
    timeframe: Timeframe,
    start_time: i64,
    end_time: i64,
) -> Result<PriceSeries> {
    let mut cursor = start_time;
    let mut bars: Vec<PriceBar> = Vec::new();
    let mut pages = 0usize;

    while cursor < end_time {
        let request = KlineRequest::range(
            symbol,
            timeframe,
            cursor,
            Some(end_time),
            HISTORY_PAGE_LIMIT,
        );
        let page = provider.fetch_klines(&request).await?;
        pages += 1;

        let Some(last) = page.last() else {
            break;
        };
        cursor = last.close_time + 1;
        let page_len = page.len();
        bars.extend(page);
        debug!(
            "{} {}: page {} with {} bars ({} total)",
            symbol,
            timeframe.interval(),
            pages,
            page_len,
            bars.len()
        );

        if page_len < HISTORY_PAGE_LIMIT {
            break;
        }
    }

    if bars.is_empty() {
        return Err(AppError::EmptyHistory(symbol.to_string()));
    }

    let series = PriceSeries::new(bars);
    info!(
        "Downloaded {} {} bars for {} in {} page(s)",
        series.len(),
        timeframe.interval(),
        symbol,
        pages
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MS_PER_DAY;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const START: i64 = 1_704_067_200_000;

    fn day_bar(day: i64) -> PriceBar {
        PriceBar {
            timestamp: START + day * MS_PER_DAY,
            close_time: START + (day + 1) * MS_PER_DAY - 1,
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0 + day as f64,
            volume: 10.0,
            taker_buy_volume: 5.0,
        }
    }

    /// Serves a fixed daily history, honouring start/end/limit.
    struct FixedProvider {
        bars: Vec<PriceBar>,
        calls: AtomicUsize,
        fail_on_call: Option<usize>,
    }

    impl FixedProvider {
        fn new(days: i64) -> Self {
            Self {
                bars: (0..days).map(day_bar).collect(),
                calls: AtomicUsize::new(0),
                fail_on_call: None,
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for FixedProvider {
        async fn fetch_klines(&self, request: &KlineRequest) -> Result<Vec<PriceBar>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_call == Some(call) {
                return Err(AppError::ExternalApi("503 Service Unavailable".to_string()));
            }
            Ok(self
                .bars
                .iter()
                .filter(|b| request.start_time.map_or(true, |s| b.timestamp >= s))
                .filter(|b| request.end_time.map_or(true, |e| b.timestamp <= e))
                .take(request.limit)
                .copied()
                .collect())
        }
    }

    #[tokio::test]
    async fn test_fetch_history_paginates() {
        let provider = FixedProvider::new(2500);
        let end = START + 3000 * MS_PER_DAY;
        let series = fetch_history(&provider, "BTCUSDT", Timeframe::Daily, START, end)
            .await
            .unwrap();
        assert_eq!(series.len(), 2500);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(series.last().map(|b| b.close), Some(2599.0));
    }

    #[tokio::test]
    async fn test_fetch_history_exact_page_boundary() {
        let provider = FixedProvider::new(1000);
        let end = START + 3000 * MS_PER_DAY;
        let series = fetch_history(&provider, "BTCUSDT", Timeframe::Daily, START, end)
            .await
            .unwrap();
        assert_eq!(series.len(), 1000);
        // Second request comes back empty
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_history_empty_first_page() {
        let provider = FixedProvider::new(0);
        let result = fetch_history(&provider, "BTCUSDT", Timeframe::Daily, START, START + MS_PER_DAY).await;
        assert!(matches!(result, Err(AppError::EmptyHistory(s)) if s == "BTCUSDT"));
    }

    #[tokio::test]
    async fn test_fetch_history_failed_page_aborts() {
        let mut provider = FixedProvider::new(2500);
        provider.fail_on_call = Some(1);
        let end = START + 3000 * MS_PER_DAY;
        let result = fetch_history(&provider, "BTCUSDT", Timeframe::Daily, START, end).await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[test]
    fn test_kline_request_builders() {
        let latest = KlineRequest::latest("ETHUSDT", Timeframe::Weekly, 200);
        assert_eq!(latest.start_time, None);
        assert_eq!(latest.limit, 200);

        let range = KlineRequest::range("ETHUSDT", Timeframe::Daily, 5, Some(10), 1000);
        assert_eq!(range.start_time, Some(5));
        assert_eq!(range.end_time, Some(10));
    }
}
