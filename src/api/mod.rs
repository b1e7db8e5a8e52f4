pub mod health;
pub mod portfolio;
pub mod transactions;

use crate::db::Repository;
use crate::pricefeed::PriceFeed;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub feed: Arc<dyn PriceFeed>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, feed: Arc<dyn PriceFeed>) -> Self {
        Self { repo, feed }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/v1/transactions",
            post(transactions::post_transaction).get(transactions::get_transactions),
        )
        .route("/v1/portfolio", get(portfolio::get_portfolio))
        .route("/v1/portfolio/valuation", get(portfolio::get_valuation))
        .layer(cors)
        .with_state(state)
}
