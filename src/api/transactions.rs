use crate::api::AppState;
use crate::db::TransactionRecord;
use crate::domain::{Position, Symbol};
use crate::error::AppError;
use crate::validation::{validate_candidate, TransactionForm};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDto {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    pub quantity: i64,
    pub avg_price: String,
}

impl From<Position> for PositionDto {
    fn from(position: Position) -> Self {
        PositionDto {
            id: position.id,
            symbol: position.symbol.as_str().to_string(),
            name: position.name,
            quantity: position.quantity,
            avg_price: position.avg_cost.to_canonical_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub id: i64,
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
    pub quantity: i64,
    pub price: String,
    pub fees: String,
    pub total_amount: String,
}

impl From<TransactionRecord> for TransactionDto {
    fn from(record: TransactionRecord) -> Self {
        let t = record.transaction;
        TransactionDto {
            id: t.id,
            symbol: record.symbol.as_str().to_string(),
            kind: t.kind.as_str().to_string(),
            date: t.date.format("%Y-%m-%d").to_string(),
            quantity: t.quantity,
            price: t.unit_cost.to_canonical_string(),
            fees: t.fees.to_canonical_string(),
            total_amount: t.total_amount.to_canonical_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub symbol: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionDto>,
}

/// Validate a submitted transaction and apply it to the ledger.
///
/// Validation happens against the position as currently stored; the
/// ledger re-checks sell sufficiency inside its own transaction, so a
/// concurrent writer cannot slip an oversell through.
pub async fn post_transaction(
    State(state): State<AppState>,
    Json(form): Json<TransactionForm>,
) -> Result<(StatusCode, Json<PositionDto>), AppError> {
    let symbol = Symbol::new(form.symbol.trim());
    let held = state
        .repo
        .get_position(&symbol)
        .await?
        .map(|p| p.quantity)
        .unwrap_or(0);

    let today = chrono::Local::now().date_naive();
    let candidate = validate_candidate(&form, held, today).map_err(AppError::Validation)?;

    let position = state.repo.apply_transaction(&candidate).await?;

    Ok((StatusCode::CREATED, Json(position.into())))
}

/// List committed transactions, newest first, optionally for one symbol.
pub async fn get_transactions(
    Query(params): Query<TransactionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<TransactionsResponse>, AppError> {
    let symbol = params
        .symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Symbol::new);

    let records = state.repo.list_transactions(symbol.as_ref()).await?;

    Ok(Json(TransactionsResponse {
        transactions: records.into_iter().map(TransactionDto::from).collect(),
    }))
}
