//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use dca_scout::error::{AppError, Result};
use dca_scout::sources::{KlineRequest, MarketDataProvider};
use dca_scout::types::{PriceBar, Timeframe, MS_PER_DAY};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 2024-01-01 00:00 UTC, a Monday.
pub const START: i64 = 1_704_067_200_000;

pub const MS_PER_4H: i64 = 4 * 3_600_000;

pub fn bar_at(timestamp: i64, span: i64, close: f64, volume: f64, taker_buy_volume: f64) -> PriceBar {
    PriceBar {
        timestamp,
        close_time: timestamp + span - 1,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume,
        taker_buy_volume,
    }
}

/// Consecutive bars of `span` milliseconds starting at [`START`].
pub fn bars_from_closes(closes: &[f64], span: i64) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| bar_at(START + i as i64 * span, span, *c, 1000.0, 500.0))
        .collect()
}

pub fn daily_bars(closes: &[f64]) -> Vec<PriceBar> {
    bars_from_closes(closes, MS_PER_DAY)
}

/// Alternating swings around a slow drift.
pub fn choppy_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 100.0 + i as f64 * 0.05 + if i % 2 == 0 { 2.0 } else { -2.0 } + (i % 5) as f64 * 0.4)
        .collect()
}

/// In-memory candles keyed by timeframe.
#[derive(Default)]
pub struct InMemoryProvider {
    bars: HashMap<Timeframe, Vec<PriceBar>>,
    calls: AtomicUsize,
    fail: bool,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, timeframe: Timeframe, bars: Vec<PriceBar>) -> Self {
        self.bars.insert(timeframe, bars);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for InMemoryProvider {
    async fn fetch_klines(&self, request: &KlineRequest) -> Result<Vec<PriceBar>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::ExternalApi("HTTP 503: unavailable".to_string()));
        }

        let bars = self.bars.get(&request.timeframe).cloned().unwrap_or_default();
        let selected: Vec<PriceBar> = match request.start_time {
            // Latest bars, like the exchange without a start time
            None => {
                let skip = bars.len().saturating_sub(request.limit);
                bars.into_iter().skip(skip).collect()
            }
            Some(start) => {
                let end = request.end_time.unwrap_or(i64::MAX);
                bars.into_iter()
                    .filter(|b| b.timestamp >= start && b.timestamp <= end)
                    .take(request.limit)
                    .collect()
            }
        };
        Ok(selected)
    }
}
