//! Pure FIFO lot matching.
//!
//! Given the open Buy lots for a symbol (date ASC, id ASC) and a sell
//! quantity, produce the list of row mutations that consume the oldest
//! lots first. No storage access here; the repository executes the plan
//! inside its transaction.

use crate::domain::{BuyLot, Decimal};

/// One storage mutation produced by the FIFO walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LotStep {
    /// The lot is fully consumed; its Buy row is deleted.
    Deplete { id: i64 },
    /// The lot is partially consumed; quantity shrinks and the row's
    /// total_amount drops by `consumed * unit_cost`. unit_cost is untouched.
    Reduce {
        id: i64,
        new_quantity: i64,
        new_total_amount: Decimal,
    },
}

/// Ordered mutations satisfying one sell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellPlan {
    pub steps: Vec<LotStep>,
}

/// The open lots cannot cover the requested quantity.
///
/// The validator rejects oversells before they reach the ledger, so
/// hitting this during a walk means stored state is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("open lots cover only {available} of {requested} requested")]
pub struct InsufficientLots {
    pub requested: i64,
    pub available: i64,
}

/// Walk `lots` oldest-first and plan the consumption of `sell_quantity`.
///
/// `lots` must already be ordered by date ascending, ties by id
/// ascending, with every quantity > 0.
pub fn plan_sell(lots: &[BuyLot], sell_quantity: i64) -> Result<SellPlan, InsufficientLots> {
    let mut steps = Vec::new();
    let mut remaining = sell_quantity;

    for lot in lots {
        if remaining == 0 {
            break;
        }

        if lot.quantity <= remaining {
            steps.push(LotStep::Deplete { id: lot.id });
            remaining -= lot.quantity;
        } else {
            let consumed = Decimal::from_i64(remaining);
            steps.push(LotStep::Reduce {
                id: lot.id,
                new_quantity: lot.quantity - remaining,
                new_total_amount: lot.total_amount - consumed * lot.unit_cost,
            });
            remaining = 0;
        }
    }

    if remaining > 0 {
        return Err(InsufficientLots {
            requested: sell_quantity,
            available: sell_quantity - remaining,
        });
    }

    Ok(SellPlan { steps })
}

/// Recompute (quantity, avg_cost) in full from the open Buy lots.
///
/// Always derived from raw rows after a mutation rather than adjusted
/// incrementally, so the stored position cannot drift from its lots.
/// An empty lot list yields (0, 0).
pub fn recompute_position(lots: &[BuyLot]) -> (i64, Decimal) {
    let quantity: i64 = lots.iter().map(|lot| lot.quantity).sum();
    if quantity == 0 {
        return (0, Decimal::zero());
    }

    let open_cost = lots
        .iter()
        .fold(Decimal::zero(), |acc, lot| acc + lot.open_cost());

    (quantity, open_cost / Decimal::from_i64(quantity))
}
