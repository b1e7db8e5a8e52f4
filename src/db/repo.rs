//! Repository layer for the position ledger.
//!
//! All SQL lives here. `apply_transaction` is the single mutation entry
//! point: the lot walk, the audit row, and the position recomputation
//! run inside one SQLite transaction, so a failure anywhere rolls the
//! whole unit of work back and no partial state is ever visible.

use crate::domain::{BuyLot, Decimal, Position, Symbol, Transaction, TxnKind, ValidCandidate};
use crate::ledger::{plan_sell, recompute_position, LedgerError, LotStep};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

/// One audit-log entry joined with its position's symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub symbol: Symbol,
    pub transaction: Transaction,
}

/// Repository for ledger storage operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// List all positions, zero-quantity rows included, ordered by symbol.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_positions(&self) -> Result<Vec<Position>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, symbol, name, avgPrice, quantity
            FROM Stock
            ORDER BY symbol ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(position_from_row).collect())
    }

    /// Fetch one position by symbol.
    pub async fn get_position(&self, symbol: &Symbol) -> Result<Option<Position>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, symbol, name, avgPrice, quantity
            FROM Stock
            WHERE symbol = ?
            "#,
        )
        .bind(symbol.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(position_from_row))
    }

    /// List committed transactions, optionally restricted to one symbol,
    /// newest first (ties broken by id descending).
    pub async fn list_transactions(
        &self,
        symbol: Option<&Symbol>,
    ) -> Result<Vec<TransactionRecord>, sqlx::Error> {
        let base = r#"
            SELECT t.id, t.type, t.date, t.quantity, t.price, t.fees, t.totalAmount,
                   t.stockId, s.symbol
            FROM Transactions t
            JOIN Stock s ON s.id = t.stockId
        "#;

        let rows = if let Some(symbol) = symbol {
            sqlx::query(&format!(
                "{} WHERE s.symbol = ? ORDER BY t.date DESC, t.id DESC",
                base
            ))
            .bind(symbol.as_str())
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(&format!("{} ORDER BY t.date DESC, t.id DESC", base))
                .fetch_all(&self.pool)
                .await?
        };

        Ok(rows
            .iter()
            .map(|row| TransactionRecord {
                symbol: Symbol::new(row.get::<String, _>("symbol")),
                transaction: transaction_from_row(row),
            })
            .collect())
    }

    /// List the open Buy lots for a symbol, date ascending, ties by id.
    ///
    /// Read-only counterpart of the query the mutation path runs inside
    /// its transaction.
    pub async fn list_open_buy_lots(&self, symbol: &Symbol) -> Result<Vec<BuyLot>, sqlx::Error> {
        let Some(position) = self.get_position(symbol).await? else {
            return Ok(Vec::new());
        };

        let mut conn = self.pool.acquire().await?;
        open_buy_lots(&mut conn, position.id).await
    }

    /// Apply a validated candidate transaction as one atomic unit.
    ///
    /// Buys insert a new lot (creating the Stock row on first contact
    /// with a symbol); Sells walk the open lots FIFO and record an audit
    /// row. Either way the position's quantity and average cost are then
    /// recomputed in full from the surviving lots before commit.
    ///
    /// # Errors
    /// `InsufficientHoldings` if the lots cannot cover a sell (internal
    /// fault; the validator screens this), `Storage` on any SQLite
    /// failure. Nothing is committed on error.
    pub async fn apply_transaction(
        &self,
        candidate: &ValidCandidate,
    ) -> Result<Position, LedgerError> {
        if candidate.quantity < 1 {
            return Err(LedgerError::MalformedCandidate(
                "quantity must be at least 1".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id, name FROM Stock WHERE symbol = ?")
            .bind(candidate.symbol.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let (stock_id, name) = match existing {
            Some(row) => (row.get::<i64, _>("id"), row.get::<String, _>("name")),
            None => {
                if candidate.kind == TxnKind::Sell {
                    // No position at all; the validator should have
                    // rejected this sell against a held quantity of 0.
                    return Err(LedgerError::InsufficientHoldings {
                        symbol: candidate.symbol.as_str().to_string(),
                        source: crate::ledger::InsufficientLots {
                            requested: candidate.quantity,
                            available: 0,
                        },
                    });
                }
                let result = sqlx::query(
                    "INSERT INTO Stock (symbol, name, avgPrice, quantity) VALUES (?, ?, '0', 0)",
                )
                .bind(candidate.symbol.as_str())
                .bind(&candidate.name)
                .execute(&mut *tx)
                .await?;
                (result.last_insert_rowid(), candidate.name.clone())
            }
        };

        if candidate.kind == TxnKind::Sell {
            let lots = open_buy_lots(&mut tx, stock_id).await?;
            let plan = plan_sell(&lots, candidate.quantity).map_err(|source| {
                LedgerError::InsufficientHoldings {
                    symbol: candidate.symbol.as_str().to_string(),
                    source,
                }
            })?;

            for step in &plan.steps {
                match step {
                    LotStep::Deplete { id } => delete_transaction(&mut tx, *id).await?,
                    LotStep::Reduce {
                        id,
                        new_quantity,
                        new_total_amount,
                    } => {
                        update_transaction_quantity(&mut tx, *id, *new_quantity, *new_total_amount)
                            .await?
                    }
                }
            }
        }

        // The audit row. Buys record the amortized per-share cost so the
        // row doubles as an open lot; Sells keep the submitted price.
        let unit_cost = match candidate.kind {
            TxnKind::Buy => candidate.amortized_unit_cost(),
            TxnKind::Sell => candidate.price,
        };
        insert_transaction(
            &mut tx,
            stock_id,
            candidate.kind,
            candidate.date,
            candidate.quantity,
            unit_cost,
            candidate.fees,
            candidate.total_amount(),
        )
        .await?;

        // Full recomputation from raw rows; never incremental.
        let lots = open_buy_lots(&mut tx, stock_id).await?;
        let (quantity, avg_cost) = recompute_position(&lots);
        upsert_position(&mut tx, stock_id, quantity, avg_cost).await?;

        tx.commit().await?;

        Ok(Position {
            id: stock_id,
            symbol: candidate.symbol.clone(),
            name,
            quantity,
            avg_cost,
        })
    }
}

/// Open Buy lots for a stock row: remaining quantity > 0, oldest first.
async fn open_buy_lots(
    conn: &mut SqliteConnection,
    stock_id: i64,
) -> Result<Vec<BuyLot>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, date, quantity, price, totalAmount
        FROM Transactions
        WHERE stockId = ? AND type = 'Buy' AND quantity > 0
        ORDER BY date ASC, id ASC
        "#,
    )
    .bind(stock_id)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .iter()
        .map(|row| BuyLot {
            id: row.get::<i64, _>("id"),
            date: date_from_column(row.get::<String, _>("date")),
            quantity: row.get::<i64, _>("quantity"),
            unit_cost: decimal_from_column(row.get::<String, _>("price"), "price"),
            total_amount: decimal_from_column(row.get::<String, _>("totalAmount"), "totalAmount"),
        })
        .collect())
}

async fn insert_transaction(
    conn: &mut SqliteConnection,
    stock_id: i64,
    kind: TxnKind,
    date: NaiveDate,
    quantity: i64,
    unit_cost: Decimal,
    fees: Decimal,
    total_amount: Decimal,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO Transactions (type, date, quantity, price, fees, totalAmount, stockId)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(kind.as_str())
    .bind(date.format("%Y-%m-%d").to_string())
    .bind(quantity)
    .bind(unit_cost.to_canonical_string())
    .bind(fees.to_canonical_string())
    .bind(total_amount.to_canonical_string())
    .bind(stock_id)
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Shrink a partially-consumed Buy lot. Quantity only ever decreases.
async fn update_transaction_quantity(
    conn: &mut SqliteConnection,
    id: i64,
    new_quantity: i64,
    new_total_amount: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE Transactions SET quantity = ?, totalAmount = ? WHERE id = ?")
        .bind(new_quantity)
        .bind(new_total_amount.to_canonical_string())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

async fn delete_transaction(conn: &mut SqliteConnection, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM Transactions WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Write the recomputed quantity/avgPrice back to the Stock row.
///
/// The row is retained at quantity 0 rather than pruned so the symbol's
/// history stays reachable.
async fn upsert_position(
    conn: &mut SqliteConnection,
    stock_id: i64,
    quantity: i64,
    avg_cost: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE Stock SET quantity = ?, avgPrice = ? WHERE id = ?")
        .bind(quantity)
        .bind(avg_cost.to_canonical_string())
        .bind(stock_id)
        .execute(conn)
        .await?;
    Ok(())
}

fn position_from_row(row: &sqlx::sqlite::SqliteRow) -> Position {
    Position {
        id: row.get::<i64, _>("id"),
        symbol: Symbol::new(row.get::<String, _>("symbol")),
        name: row.get::<String, _>("name"),
        quantity: row.get::<i64, _>("quantity"),
        avg_cost: decimal_from_column(row.get::<String, _>("avgPrice"), "avgPrice"),
    }
}

fn transaction_from_row(row: &sqlx::sqlite::SqliteRow) -> Transaction {
    let kind_str = row.get::<String, _>("type");
    let kind = TxnKind::parse(&kind_str).unwrap_or_else(|| {
        warn!(kind = %kind_str, "unknown transaction type in storage, assuming Buy");
        TxnKind::Buy
    });

    Transaction {
        id: row.get::<i64, _>("id"),
        stock_id: row.get::<i64, _>("stockId"),
        kind,
        date: date_from_column(row.get::<String, _>("date")),
        quantity: row.get::<i64, _>("quantity"),
        unit_cost: decimal_from_column(row.get::<String, _>("price"), "price"),
        fees: decimal_from_column(row.get::<String, _>("fees"), "fees"),
        total_amount: decimal_from_column(row.get::<String, _>("totalAmount"), "totalAmount"),
    }
}

fn decimal_from_column(value: String, column: &str) -> Decimal {
    Decimal::from_str(&value).unwrap_or_else(|e| {
        warn!(column = column, value = %value, error = %e, "failed to parse stored decimal, using 0");
        Decimal::default()
    })
}

fn date_from_column(value: String) -> NaiveDate {
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").unwrap_or_else(|e| {
        warn!(value = %value, error = %e, "failed to parse stored date, using epoch");
        NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch date is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    fn candidate(kind: TxnKind, day: u32, quantity: i64, price: &str, fees: &str) -> ValidCandidate {
        ValidCandidate {
            symbol: Symbol::new("AAPL"),
            name: "Apple".to_string(),
            kind,
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            quantity,
            price: Decimal::from_str_canonical(price).unwrap(),
            fees: Decimal::from_str_canonical(fees).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_first_buy_creates_position() {
        let (repo, _temp) = setup_test_db().await;

        let position = repo
            .apply_transaction(&candidate(TxnKind::Buy, 2, 10, "160", "5"))
            .await
            .unwrap();

        assert_eq!(position.symbol, Symbol::new("AAPL"));
        assert_eq!(position.name, "Apple");
        assert_eq!(position.quantity, 10);
        assert_eq!(position.avg_cost.to_canonical_string(), "160.5");

        let listed = repo.list_positions().await.unwrap();
        assert_eq!(listed, vec![position]);
    }

    #[tokio::test]
    async fn test_repeat_buys_weighted_average() {
        let (repo, _temp) = setup_test_db().await;

        repo.apply_transaction(&candidate(TxnKind::Buy, 2, 10, "100", "0"))
            .await
            .unwrap();
        let position = repo
            .apply_transaction(&candidate(TxnKind::Buy, 3, 5, "130", "0"))
            .await
            .unwrap();

        assert_eq!(position.quantity, 15);
        assert_eq!(position.avg_cost.to_canonical_string(), "110");
    }

    #[tokio::test]
    async fn test_sell_exact_lot_removes_it() {
        let (repo, _temp) = setup_test_db().await;

        repo.apply_transaction(&candidate(TxnKind::Buy, 2, 10, "100", "0"))
            .await
            .unwrap();
        repo.apply_transaction(&candidate(TxnKind::Buy, 3, 5, "130", "0"))
            .await
            .unwrap();

        let position = repo
            .apply_transaction(&candidate(TxnKind::Sell, 4, 10, "140", "0"))
            .await
            .unwrap();

        assert_eq!(position.quantity, 5);
        assert_eq!(position.avg_cost.to_canonical_string(), "130");

        let lots = repo.list_open_buy_lots(&Symbol::new("AAPL")).await.unwrap();
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].quantity, 5);
        assert_eq!(lots[0].unit_cost.to_canonical_string(), "130");
    }

    #[tokio::test]
    async fn test_sell_spanning_lots_leaves_remainder_on_last() {
        let (repo, _temp) = setup_test_db().await;

        repo.apply_transaction(&candidate(TxnKind::Buy, 2, 10, "100", "0"))
            .await
            .unwrap();
        repo.apply_transaction(&candidate(TxnKind::Buy, 3, 5, "110", "0"))
            .await
            .unwrap();
        repo.apply_transaction(&candidate(TxnKind::Buy, 4, 8, "90", "0"))
            .await
            .unwrap();

        let position = repo
            .apply_transaction(&candidate(TxnKind::Sell, 5, 17, "120", "0"))
            .await
            .unwrap();

        assert_eq!(position.quantity, 6);
        assert_eq!(position.avg_cost.to_canonical_string(), "90");

        let lots = repo.list_open_buy_lots(&Symbol::new("AAPL")).await.unwrap();
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].quantity, 6);
        assert_eq!(lots[0].total_amount.to_canonical_string(), "540");
    }

    #[tokio::test]
    async fn test_partial_sell_reduces_total_amount_not_unit_cost() {
        let (repo, _temp) = setup_test_db().await;

        // 10 @ 160 with 5 in fees: unit cost 160.5, total 1605.
        repo.apply_transaction(&candidate(TxnKind::Buy, 2, 10, "160", "5"))
            .await
            .unwrap();
        repo.apply_transaction(&candidate(TxnKind::Sell, 3, 4, "170", "0"))
            .await
            .unwrap();

        let lots = repo.list_open_buy_lots(&Symbol::new("AAPL")).await.unwrap();
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].quantity, 6);
        assert_eq!(lots[0].unit_cost.to_canonical_string(), "160.5");
        assert_eq!(lots[0].total_amount.to_canonical_string(), "963");
    }

    #[tokio::test]
    async fn test_buy_then_equal_sell_round_trips_to_zero() {
        let (repo, _temp) = setup_test_db().await;

        repo.apply_transaction(&candidate(TxnKind::Buy, 2, 10, "100", "0"))
            .await
            .unwrap();
        let position = repo
            .apply_transaction(&candidate(TxnKind::Sell, 3, 10, "120", "0"))
            .await
            .unwrap();

        // Position retained at zero, not pruned.
        assert_eq!(position.quantity, 0);
        assert!(position.avg_cost.is_zero());
        assert_eq!(repo.list_positions().await.unwrap().len(), 1);

        // No open lots; only the audit Sell row survives.
        let lots = repo.list_open_buy_lots(&Symbol::new("AAPL")).await.unwrap();
        assert!(lots.is_empty());
        let records = repo.list_transactions(None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].transaction.kind, TxnKind::Sell);
        assert_eq!(records[0].transaction.quantity, 10);
    }

    #[tokio::test]
    async fn test_oversell_rolls_back_entirely() {
        let (repo, _temp) = setup_test_db().await;

        repo.apply_transaction(&candidate(TxnKind::Buy, 2, 3, "100", "0"))
            .await
            .unwrap();

        let err = repo
            .apply_transaction(&candidate(TxnKind::Sell, 3, 5, "120", "0"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientHoldings { .. }));

        // Storage untouched: lot intact, no audit row for the sell.
        let lots = repo.list_open_buy_lots(&Symbol::new("AAPL")).await.unwrap();
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].quantity, 3);
        let records = repo.list_transactions(None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].transaction.kind, TxnKind::Buy);
    }

    #[tokio::test]
    async fn test_sell_against_unknown_symbol_is_insufficient() {
        let (repo, _temp) = setup_test_db().await;

        let err = repo
            .apply_transaction(&candidate(TxnKind::Sell, 2, 1, "100", "0"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientHoldings { .. }));
        assert!(repo.list_positions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_day_lots_consumed_in_insertion_order() {
        let (repo, _temp) = setup_test_db().await;

        repo.apply_transaction(&candidate(TxnKind::Buy, 2, 2, "100", "0"))
            .await
            .unwrap();
        repo.apply_transaction(&candidate(TxnKind::Buy, 2, 2, "120", "0"))
            .await
            .unwrap();

        repo.apply_transaction(&candidate(TxnKind::Sell, 3, 3, "130", "0"))
            .await
            .unwrap();

        let lots = repo.list_open_buy_lots(&Symbol::new("AAPL")).await.unwrap();
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].quantity, 1);
        assert_eq!(lots[0].unit_cost.to_canonical_string(), "120");
    }

    #[tokio::test]
    async fn test_list_transactions_filters_by_symbol() {
        let (repo, _temp) = setup_test_db().await;

        repo.apply_transaction(&candidate(TxnKind::Buy, 2, 10, "100", "0"))
            .await
            .unwrap();
        let msft = ValidCandidate {
            symbol: Symbol::new("MSFT"),
            name: "Microsoft".to_string(),
            ..candidate(TxnKind::Buy, 3, 2, "400", "0")
        };
        repo.apply_transaction(&msft).await.unwrap();

        let all = repo.list_transactions(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let only_msft = repo
            .list_transactions(Some(&Symbol::new("MSFT")))
            .await
            .unwrap();
        assert_eq!(only_msft.len(), 1);
        assert_eq!(only_msft[0].symbol, Symbol::new("MSFT"));
        assert_eq!(
            only_msft[0].transaction.total_amount.to_canonical_string(),
            "800"
        );
    }

    #[tokio::test]
    async fn test_position_name_fixed_at_creation() {
        let (repo, _temp) = setup_test_db().await;

        repo.apply_transaction(&candidate(TxnKind::Buy, 2, 1, "100", "0"))
            .await
            .unwrap();
        let renamed = ValidCandidate {
            name: "Apple Computer".to_string(),
            ..candidate(TxnKind::Buy, 3, 1, "100", "0")
        };
        let position = repo.apply_transaction(&renamed).await.unwrap();

        assert_eq!(position.name, "Apple");
    }
}
