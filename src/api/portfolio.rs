use crate::api::transactions::PositionDto;
use crate::api::AppState;
use crate::domain::Position;
use crate::error::AppError;
use crate::pricefeed::fetch_latest_close;
use crate::valuation::{portfolio_total, value_position, ChangeDirection, Valuation};
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PortfolioResponse {
    pub positions: Vec<PositionDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationRowDto {
    pub symbol: String,
    pub name: String,
    pub quantity: i64,
    pub avg_price: String,
    /// Market value as a decimal string, or "N/A" when no quote resolved.
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_change: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<ChangeDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationTotalDto {
    pub market_value: String,
    pub cost_basis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_change: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<ChangeDirection>,
    pub priced_positions: usize,
    pub unpriced_positions: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationResponse {
    pub positions: Vec<ValuationRowDto>,
    /// Absent when not a single holding could be priced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<ValuationTotalDto>,
}

/// List all positions as stored, zero-quantity rows included.
pub async fn get_portfolio(
    State(state): State<AppState>,
) -> Result<Json<PortfolioResponse>, AppError> {
    let positions = state.repo.list_positions().await?;

    Ok(Json(PortfolioResponse {
        positions: positions.into_iter().map(PositionDto::from).collect(),
    }))
}

/// Value the held positions against the latest closes.
///
/// One price request per held symbol, fanned out in parallel. Symbols
/// whose lookup failed come back with value "N/A"; only when every
/// lookup failed is the feed reported as unavailable.
pub async fn get_valuation(
    State(state): State<AppState>,
) -> Result<Json<ValuationResponse>, AppError> {
    let positions = state.repo.list_positions().await?;
    let held: Vec<Position> = positions.into_iter().filter(|p| p.quantity > 0).collect();

    let symbols: Vec<_> = held.iter().map(|p| p.symbol.clone()).collect();
    let survey = fetch_latest_close(state.feed.as_ref(), &symbols).await;

    if !held.is_empty() && survey.all_failed() {
        return Err(AppError::PriceFeedUnavailable(
            "no price available for any held symbol".to_string(),
        ));
    }

    let rows = held
        .iter()
        .map(|position| {
            let valuation = value_position(position, &survey.quotes);
            let as_of = survey
                .quotes
                .get(&position.symbol)
                .map(|q| q.as_of.format("%Y-%m-%d").to_string());

            let (value, percent_change) = match &valuation {
                Valuation::Priced {
                    market_value,
                    percent_change,
                    ..
                } => (
                    market_value.to_canonical_string(),
                    percent_change.map(|c| c.round_dp(2).to_canonical_string()),
                ),
                Valuation::Unavailable => ("N/A".to_string(), None),
            };

            ValuationRowDto {
                symbol: position.symbol.as_str().to_string(),
                name: position.name.clone(),
                quantity: position.quantity,
                avg_price: position.avg_cost.to_canonical_string(),
                value,
                percent_change,
                direction: valuation.direction(),
                as_of,
            }
        })
        .collect();

    let total = portfolio_total(&held, &survey.quotes).map(|total| ValuationTotalDto {
        market_value: total.market_value.to_canonical_string(),
        cost_basis: total.cost_basis.to_canonical_string(),
        percent_change: total
            .percent_change
            .map(|c| c.round_dp(2).to_canonical_string()),
        direction: total.direction(),
        priced_positions: total.priced_positions,
        unpriced_positions: total.unpriced_positions,
    });

    Ok(Json(ValuationResponse {
        positions: rows,
        total,
    }))
}
