//! SQLite storage: schema migrations and the ledger repository.

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::{Repository, TransactionRecord};
