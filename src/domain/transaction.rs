//! Transaction rows, open buy lots, and validated candidates.

use super::{Decimal, Symbol, TxnKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One committed row of the append-only transaction log.
///
/// Immutable after commit except that a partially-consumed Buy row's
/// `quantity` and `total_amount` shrink monotonically as later Sells
/// consume it. `kind`, `date`, and `id` never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    /// Owning position row (`Stock.id`).
    pub stock_id: i64,
    pub kind: TxnKind,
    pub date: NaiveDate,
    pub quantity: i64,
    /// For Buy: acquisition cost per share with fees amortized in.
    /// For Sell: the submitted unit price, retained for audit only.
    pub unit_cost: Decimal,
    pub fees: Decimal,
    /// price * quantity + fees, denormalized for display.
    pub total_amount: Decimal,
}

/// The open remainder of a historical Buy row: the unit of FIFO matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyLot {
    /// Row id of the underlying Buy transaction.
    pub id: i64,
    pub date: NaiveDate,
    /// Remaining unconsumed quantity; > 0 for any listed lot.
    pub quantity: i64,
    pub unit_cost: Decimal,
    pub total_amount: Decimal,
}

impl BuyLot {
    /// Cost contribution of the remaining quantity.
    pub fn open_cost(&self) -> Decimal {
        self.unit_cost * Decimal::from_i64(self.quantity)
    }
}

/// A transaction candidate that has passed field validation.
///
/// Quantity, price, and fees carry their parsed values; the ledger
/// trusts the numeric forms and only re-checks business invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCandidate {
    pub symbol: Symbol,
    /// Display name for the position; used on first Buy of a symbol.
    pub name: String,
    pub kind: TxnKind,
    pub date: NaiveDate,
    pub quantity: i64,
    /// Submitted unit price, fees not included.
    pub price: Decimal,
    pub fees: Decimal,
}

impl ValidCandidate {
    /// price * quantity + fees.
    pub fn total_amount(&self) -> Decimal {
        self.price * Decimal::from_i64(self.quantity) + self.fees
    }

    /// Per-share acquisition cost with fees amortized across the lot.
    ///
    /// Only meaningful for Buy candidates.
    pub fn amortized_unit_cost(&self) -> Decimal {
        self.total_amount() / Decimal::from_i64(self.quantity)
    }
}
