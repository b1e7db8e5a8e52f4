//! Lot ledger: FIFO matching and the errors a mutation can produce.
//!
//! The pure matching lives in `fifo`; the repository drives it inside a
//! single storage transaction (see `db::repo::Repository::apply_transaction`).

pub mod fifo;

pub use fifo::{plan_sell, recompute_position, InsufficientLots, LotStep, SellPlan};

use thiserror::Error;

/// Failure modes of applying a candidate transaction.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The FIFO walk ran out of lots. The validator excludes oversells
    /// before they get here, so this is an internal consistency fault,
    /// not a user error.
    #[error("insufficient holdings for {symbol}: {source}")]
    InsufficientHoldings {
        symbol: String,
        source: InsufficientLots,
    },

    /// A required field was missing or inconsistent at the storage boundary.
    #[error("malformed candidate: {0}")]
    MalformedCandidate(String),

    /// The storage collaborator failed; the whole unit of work was
    /// rolled back and nothing is visible.
    #[error("storage failure")]
    Storage(#[from] sqlx::Error),
}
