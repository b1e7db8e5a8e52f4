//! Position: the running holding for one instrument.

use super::{Decimal, Symbol};
use serde::{Deserialize, Serialize};

/// One row per instrument: quantity held and weighted-average cost.
///
/// Both fields are always recomputed in full from the open Buy rows
/// after a mutation, never adjusted incrementally. A position whose
/// quantity has reached zero is retained (avg_cost reset to zero) so
/// its transaction history stays queryable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Storage row id (`Stock.id`).
    pub id: i64,
    pub symbol: Symbol,
    /// Display name, set on the first Buy.
    pub name: String,
    /// Sum of open buy-lot quantities; never negative.
    pub quantity: i64,
    /// Quantity-weighted average acquisition cost, fees amortized in.
    /// Zero when quantity is zero.
    pub avg_cost: Decimal,
}

impl Position {
    /// Quantity as a Decimal for money math.
    pub fn quantity_dec(&self) -> Decimal {
        Decimal::from_i64(self.quantity)
    }

    /// Total acquisition cost of the open holding.
    pub fn cost_basis(&self) -> Decimal {
        self.avg_cost * self.quantity_dec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_basis() {
        let position = Position {
            id: 1,
            symbol: Symbol::new("AAPL"),
            name: "Apple".to_string(),
            quantity: 10,
            avg_cost: Decimal::from_str_canonical("160").unwrap(),
        };
        assert_eq!(position.cost_basis().to_canonical_string(), "1600");
    }
}
