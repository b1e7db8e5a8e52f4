//! Mock price feed for testing without network calls.

use super::{PriceFeed, PriceFeedError};
use crate::domain::Symbol;
use crate::valuation::PriceObservation;
use async_trait::async_trait;
use std::collections::HashMap;

/// Mock price feed that returns predefined quotes and failures.
#[derive(Debug, Clone, Default)]
pub struct MockPriceFeed {
    quotes: HashMap<Symbol, PriceObservation>,
    failures: HashMap<Symbol, PriceFeedError>,
}

impl MockPriceFeed {
    /// Create a new mock feed with no quotes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a quote for the observation's symbol.
    pub fn with_quote(mut self, observation: PriceObservation) -> Self {
        self.quotes.insert(observation.symbol.clone(), observation);
        self
    }

    /// Make lookups for `symbol` fail with `error`.
    pub fn with_failure(mut self, symbol: Symbol, error: PriceFeedError) -> Self {
        self.failures.insert(symbol, error);
        self
    }
}

#[async_trait]
impl PriceFeed for MockPriceFeed {
    async fn latest_close(&self, symbol: &Symbol) -> Result<PriceObservation, PriceFeedError> {
        if let Some(error) = self.failures.get(symbol) {
            return Err(error.clone());
        }
        self.quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| PriceFeedError::Other(format!("no quote configured for {}", symbol)))
    }
}
