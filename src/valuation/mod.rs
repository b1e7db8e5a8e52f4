//! Valuation calculator: market value and percentage change against the
//! latest observed close prices.
//!
//! Pure functions over positions and a quote map; missing quotes degrade
//! to `Unavailable`, never to an error.

use crate::domain::{Decimal, Position, Symbol};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Latest end-of-day close for one symbol. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub symbol: Symbol,
    pub close_value: Decimal,
    pub as_of: NaiveDate,
}

/// Presentation classification of a percentage change; zero counts as
/// positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    Positive,
    Negative,
}

/// Outcome of valuing one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Valuation {
    /// No price observation for the symbol; displayed as "N/A".
    Unavailable,
    Priced {
        /// close * quantity.
        market_value: Decimal,
        /// avg_cost * quantity.
        cost_basis: Decimal,
        /// (market_value - cost_basis) / cost_basis * 100.
        /// None when cost_basis is zero.
        percent_change: Option<Decimal>,
    },
}

impl Valuation {
    /// Direction of the change, when there is one.
    pub fn direction(&self) -> Option<ChangeDirection> {
        match self {
            Valuation::Priced {
                percent_change: Some(change),
                ..
            } => {
                if change.is_negative() {
                    Some(ChangeDirection::Negative)
                } else {
                    Some(ChangeDirection::Positive)
                }
            }
            _ => None,
        }
    }
}

/// Portfolio-level aggregate over all priced holdings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioTotal {
    pub market_value: Decimal,
    pub cost_basis: Decimal,
    pub percent_change: Option<Decimal>,
    /// Positions counted into the totals.
    pub priced_positions: usize,
    /// Held positions left out for lack of a quote.
    pub unpriced_positions: usize,
}

impl PortfolioTotal {
    pub fn direction(&self) -> Option<ChangeDirection> {
        self.percent_change.map(|change| {
            if change.is_negative() {
                ChangeDirection::Negative
            } else {
                ChangeDirection::Positive
            }
        })
    }
}

/// Value one position against the quote map.
pub fn value_position(
    position: &Position,
    quotes: &HashMap<Symbol, PriceObservation>,
) -> Valuation {
    let Some(observation) = quotes.get(&position.symbol) else {
        return Valuation::Unavailable;
    };

    let market_value = observation.close_value * position.quantity_dec();
    let cost_basis = position.cost_basis();

    let percent_change = if cost_basis.is_zero() {
        None
    } else {
        Some((market_value - cost_basis) / cost_basis * Decimal::hundred())
    };

    Valuation::Priced {
        market_value,
        cost_basis,
        percent_change,
    }
}

/// Aggregate market value and cost basis across all held positions.
///
/// Policy: a position with no matching quote is excluded from both sums
/// entirely, not treated as zero; mixing priced market values with
/// unpriced cost bases would skew the overall change. Positions with
/// quantity 0 never contribute. Returns None when no position at all
/// could be priced.
pub fn portfolio_total(
    positions: &[Position],
    quotes: &HashMap<Symbol, PriceObservation>,
) -> Option<PortfolioTotal> {
    let mut market_value = Decimal::zero();
    let mut cost_basis = Decimal::zero();
    let mut priced = 0usize;
    let mut unpriced = 0usize;

    for position in positions.iter().filter(|p| p.quantity > 0) {
        match value_position(position, quotes) {
            Valuation::Priced {
                market_value: value,
                cost_basis: basis,
                ..
            } => {
                market_value = market_value + value;
                cost_basis = cost_basis + basis;
                priced += 1;
            }
            Valuation::Unavailable => unpriced += 1,
        }
    }

    if priced == 0 {
        return None;
    }

    let percent_change = if cost_basis.is_zero() {
        None
    } else {
        Some((market_value - cost_basis) / cost_basis * Decimal::hundred())
    };

    Some(PortfolioTotal {
        market_value,
        cost_basis,
        percent_change,
        priced_positions: priced,
        unpriced_positions: unpriced,
    })
}
