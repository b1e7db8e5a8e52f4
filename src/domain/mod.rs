//! Core domain types for the position ledger.
//!
//! - `decimal` - lossless money arithmetic
//! - `primitives` - Symbol, TxnKind
//! - `position` - running per-instrument holding
//! - `transaction` - log rows, open lots, validated candidates

pub mod decimal;
pub mod position;
pub mod primitives;
pub mod transaction;

pub use decimal::Decimal;
pub use position::Position;
pub use primitives::{Symbol, TxnKind};
pub use transaction::{BuyLot, Transaction, ValidCandidate};
