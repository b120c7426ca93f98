use crate::config::Config;
use crate::error::{AppError, Result};
use crate::sources::{KlineRequest, MarketDataProvider};
use crate::types::PriceBar;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const BINANCE_API_URL: &str = "https://api.binance.com/api/v3";

/// Binance kline row.
///
/// `[open_time, open, high, low, close, volume, close_time, quote_volume,
/// trades, taker_buy_base_volume, taker_buy_quote_volume, ignore]` with the
/// decimal fields string-encoded.
#[derive(Debug, Deserialize)]
struct RawKline(
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    IgnoredAny,
    IgnoredAny,
    String,
    IgnoredAny,
    IgnoredAny,
);

fn parse_decimal(value: &str, field: &str) -> Result<f64> {
    value
        .parse()
        .map_err(|_| AppError::ExternalApi(format!("invalid {} in kline: {:?}", field, value)))
}

impl RawKline {
    fn into_bar(self) -> Result<PriceBar> {
        Ok(PriceBar {
            timestamp: self.0,
            open: parse_decimal(&self.1, "open")?,
            high: parse_decimal(&self.2, "high")?,
            low: parse_decimal(&self.3, "low")?,
            close: parse_decimal(&self.4, "close")?,
            volume: parse_decimal(&self.5, "volume")?,
            close_time: self.6,
            taker_buy_volume: parse_decimal(&self.9, "taker buy volume")?,
        })
    }
}

/// Binance REST client.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl BinanceClient {
    /// Create a new Binance client.
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent("dca-scout/0.1")
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.binance_api_url,
            config.binance_api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn query(request: &KlineRequest) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("symbol", request.symbol.clone()),
            ("interval", request.timeframe.interval().to_string()),
            ("limit", request.limit.to_string()),
        ];
        if let Some(start) = request.start_time {
            query.push(("startTime", start.to_string()));
        }
        if let Some(end) = request.end_time {
            query.push(("endTime", end.to_string()));
        }
        query
    }
}

/// Decode a klines response body.
fn parse_klines(body: &str) -> Result<Vec<PriceBar>> {
    let rows: Vec<RawKline> = serde_json::from_str(body)?;
    let mut bars = rows
        .into_iter()
        .map(RawKline::into_bar)
        .collect::<Result<Vec<_>>>()?;
    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

#[async_trait]
impl MarketDataProvider for BinanceClient {
    async fn fetch_klines(&self, request: &KlineRequest) -> Result<Vec<PriceBar>> {
        let url = format!("{}/klines", self.base_url);

        let mut http = self.client.get(&url).query(&Self::query(request));
        if let Some(ref key) = self.api_key {
            http = http.header("X-MBX-APIKEY", key);
        }

        let response = http.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            warn!("Binance API returned {}: {}", status, snippet);
            return Err(AppError::ExternalApi(format!(
                "Binance API error {}: {}",
                status, snippet
            )));
        }

        let body = response.text().await?;
        let bars = parse_klines(&body)?;
        debug!(
            "Binance klines {} {}: {} bars",
            request.symbol,
            request.timeframe.interval(),
            bars.len()
        );
        Ok(bars)
    }
}
