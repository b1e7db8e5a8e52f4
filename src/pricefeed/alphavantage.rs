//! Alpha Vantage price feed client.

use super::{PriceFeed, PriceFeedError};
use crate::domain::{Decimal, Symbol};
use crate::valuation::PriceObservation;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Price feed backed by the Alpha Vantage TIME_SERIES_DAILY endpoint.
#[derive(Debug, Clone)]
pub struct AlphaVantageFeed {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageFeed {
    /// Create a new feed against the given base URL.
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    /// Create with the public Alpha Vantage URL.
    pub fn default_url(api_key: String) -> Self {
        Self::new("https://www.alphavantage.co".to_string(), api_key)
    }

    async fn get_daily_series(
        &self,
        symbol: &Symbol,
    ) -> Result<serde_json::Value, PriceFeedError> {
        let url = format!(
            "{}/query?function=TIME_SERIES_DAILY&symbol={}&apikey={}",
            self.base_url,
            symbol.as_str(),
            self.api_key
        );
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self.client.get(&url).send().await.map_err(|e| {
                backoff::Error::transient(PriceFeedError::Network(e.to_string()))
            })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(PriceFeedError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(PriceFeedError::Http {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(PriceFeedError::Http {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(PriceFeedError::Parse(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl PriceFeed for AlphaVantageFeed {
    async fn latest_close(&self, symbol: &Symbol) -> Result<PriceObservation, PriceFeedError> {
        debug!(symbol = %symbol, "fetching latest close");
        let response = self.get_daily_series(symbol).await?;
        parse_latest_close(&response, symbol)
    }
}

/// Pick the newest date in the daily series and read its close value.
fn parse_latest_close(
    response: &serde_json::Value,
    symbol: &Symbol,
) -> Result<PriceObservation, PriceFeedError> {
    // Alpha Vantage reports request throttling as a 200 with a "Note".
    if response.get("Note").is_some() || response.get("Information").is_some() {
        return Err(PriceFeedError::RateLimited);
    }
    if let Some(message) = response.get("Error Message").and_then(|v| v.as_str()) {
        return Err(PriceFeedError::Parse(message.to_string()));
    }

    let series = response
        .get("Time Series (Daily)")
        .and_then(|v| v.as_object())
        .ok_or_else(|| PriceFeedError::Parse("missing Time Series (Daily)".to_string()))?;

    // ISO dates sort lexicographically, so the maximum key is the latest day.
    let latest_date = series
        .keys()
        .max()
        .ok_or_else(|| PriceFeedError::Parse("empty time series".to_string()))?;

    let close_str = series[latest_date]
        .get("4. close")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PriceFeedError::Parse(format!("missing close for {}", latest_date)))?;

    let close_value = Decimal::from_str_canonical(close_str)
        .map_err(|e| PriceFeedError::Parse(format!("invalid close {}: {}", close_str, e)))?;

    let as_of = NaiveDate::parse_from_str(latest_date, "%Y-%m-%d")
        .map_err(|e| PriceFeedError::Parse(format!("invalid date {}: {}", latest_date, e)))?;

    Ok(PriceObservation {
        symbol: symbol.clone(),
        close_value,
        as_of,
    })
}
