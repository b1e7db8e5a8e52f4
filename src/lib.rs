pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod pricefeed;
pub mod validation;
pub mod valuation;

pub use config::Config;
pub use db::{init_db, Repository, TransactionRecord};
pub use domain::{BuyLot, Decimal, Position, Symbol, Transaction, TxnKind, ValidCandidate};
pub use error::AppError;
pub use ledger::{plan_sell, recompute_position, LedgerError};
pub use pricefeed::{AlphaVantageFeed, MockPriceFeed, PriceFeed, PriceFeedError, PriceSurvey};
pub use validation::{validate_candidate, FieldErrors, TransactionForm};
pub use valuation::{portfolio_total, value_position, PriceObservation, Valuation};
