//! Domain primitives: Symbol, TxnKind.

use serde::{Deserialize, Serialize};

/// Instrument ticker symbol (e.g., "AAPL", "MSFT").
///
/// Unique per position, immutable once the position exists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    /// Create a Symbol from a string.
    pub fn new(symbol: impl Into<String>) -> Self {
        Symbol(symbol.into())
    }

    /// Get the symbol as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction kind: Buy or Sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxnKind {
    /// Acquisition; opens a new lot.
    Buy,
    /// Disposal; consumes open lots FIFO.
    Sell,
}

impl TxnKind {
    /// Stable storage tag for the `Transactions.type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnKind::Buy => "Buy",
            TxnKind::Sell => "Sell",
        }
    }

    /// Parse the storage tag back into a kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Buy" => Some(TxnKind::Buy),
            "Sell" => Some(TxnKind::Sell),
            _ => None,
        }
    }
}

impl std::fmt::Display for TxnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txn_kind_storage_tag_roundtrip() {
        assert_eq!(TxnKind::parse(TxnKind::Buy.as_str()), Some(TxnKind::Buy));
        assert_eq!(TxnKind::parse(TxnKind::Sell.as_str()), Some(TxnKind::Sell));
        assert_eq!(TxnKind::parse("Dividend"), None);
    }

    #[test]
    fn test_symbol_display() {
        let symbol = Symbol::new("AAPL");
        assert_eq!(symbol.to_string(), "AAPL");
        assert_eq!(symbol.as_str(), "AAPL");
    }
}
