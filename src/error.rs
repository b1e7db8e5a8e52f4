use crate::ledger::LedgerError;
use crate::validation::FieldErrors;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(FieldErrors),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Price feed unavailable: {0}")]
    PriceFeedUnavailable(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            // The validator screens sell quantities against holdings, so
            // reaching this here means request state went stale mid-flight.
            LedgerError::InsufficientHoldings { .. } => {
                let mut errors = FieldErrors::default();
                errors.insert("quantity", "Not enough stocks to sell".to_string());
                AppError::Validation(errors)
            }
            LedgerError::MalformedCandidate(msg) => AppError::BadRequest(msg),
            LedgerError::Storage(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                let body = Json(json!({ "errors": errors }));
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            AppError::BadRequest(msg) => {
                let body = Json(json!({ "error": msg }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            AppError::NotFound(msg) => {
                let body = Json(json!({ "error": msg }));
                (StatusCode::NOT_FOUND, body).into_response()
            }
            AppError::PriceFeedUnavailable(msg) => {
                let body = Json(json!({ "error": msg }));
                (StatusCode::BAD_GATEWAY, body).into_response()
            }
            AppError::Internal(msg) => {
                // Internals go to the log, not the client.
                error!("internal error: {}", msg);
                let body = Json(json!({ "error": "operation failed" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
