//! Price feed abstraction: map held symbols to latest close prices.
//!
//! One request per symbol, fanned out in parallel; a failure for one
//! symbol never blocks the others. Callers render missing entries as
//! "N/A" and only treat the feed as down when no symbol succeeds.

use crate::domain::Symbol;
use crate::valuation::PriceObservation;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub mod alphavantage;
pub mod mock;

pub use alphavantage::AlphaVantageFeed;
pub use mock::MockPriceFeed;

/// Source of latest end-of-day closes, one symbol per request.
///
/// Implementations handle retry/backoff and rate limiting internally;
/// errors come back per symbol, never for the batch as a whole.
#[async_trait]
pub trait PriceFeed: Send + Sync + fmt::Debug {
    /// Fetch the latest close for a single symbol.
    async fn latest_close(&self, symbol: &Symbol) -> Result<PriceObservation, PriceFeedError>;
}

/// Per-symbol outcome of one fan-out round.
#[derive(Debug, Clone, Default)]
pub struct PriceSurvey {
    pub quotes: HashMap<Symbol, PriceObservation>,
    pub failures: HashMap<Symbol, PriceFeedError>,
}

impl PriceSurvey {
    /// True when symbols were requested and not one resolved.
    pub fn all_failed(&self) -> bool {
        self.quotes.is_empty() && !self.failures.is_empty()
    }
}

/// Fan out one request per symbol and gather the per-symbol outcomes.
pub async fn fetch_latest_close(feed: &dyn PriceFeed, symbols: &[Symbol]) -> PriceSurvey {
    let requests = symbols.iter().map(|symbol| async move {
        let outcome = feed.latest_close(symbol).await;
        (symbol.clone(), outcome)
    });

    let mut survey = PriceSurvey::default();
    for (symbol, outcome) in futures::future::join_all(requests).await {
        match outcome {
            Ok(observation) => {
                survey.quotes.insert(symbol, observation);
            }
            Err(error) => {
                tracing::warn!(symbol = %symbol, error = %error, "price lookup failed");
                survey.failures.insert(symbol, error);
            }
        }
    }

    survey
}

/// Error type for price feed operations.
#[derive(Debug, Clone, Error)]
pub enum PriceFeedError {
    /// Network error (connection timeout, DNS failure).
    #[error("network error: {0}")]
    Network(String),
    /// HTTP error (4xx client error, 5xx server error).
    #[error("http error {status}: {message}")]
    Http { status: u16, message: String },
    /// Invalid JSON or a response missing the expected series.
    #[error("parse error: {0}")]
    Parse(String),
    /// Rate limit exceeded after retries.
    #[error("rate limited")]
    RateLimited,
    /// Other error.
    #[error("{0}")]
    Other(String),
}
