//! Field validation for candidate transactions.
//!
//! Pure functions: each checks one raw text field and returns the parsed
//! value or a message for that field. `validate_candidate` runs them all
//! and collects failures into a field-keyed map; nothing here touches
//! storage, so the ledger only re-checks business invariants at commit.

use crate::domain::{Decimal, Symbol, TxnKind, ValidCandidate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw form input for one transaction, all fields as submitted text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    /// "Buy" or "Sell".
    #[serde(rename = "type")]
    pub kind: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub quantity: String,
    pub price: String,
    pub fees: String,
}

/// Field-keyed validation failures, surfaced to the caller as a map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &'static str, message: String) {
        self.0.insert(field, message);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Validate a share count.
///
/// Rejects blank input, any non-digit character (both decimal
/// separators included), leading-zero forms, and counts below 1.
/// For a Sell, the count must not exceed the currently held quantity.
pub fn validate_quantity(text: &str, kind: TxnKind, held: i64) -> Result<i64, String> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err("Please enter quantity".to_string());
    }

    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err("Please enter a valid integer quantity".to_string());
    }

    if trimmed.len() > 1 && trimmed.starts_with('0') {
        return Err("Please enter a valid integer quantity".to_string());
    }

    let quantity: i64 = trimmed
        .parse()
        .map_err(|_| "Please enter a valid integer quantity".to_string())?;

    if quantity < 1 {
        return Err("Please enter a valid integer quantity".to_string());
    }

    if kind == TxnKind::Sell && quantity > held {
        return Err("Not enough stocks to sell".to_string());
    }

    Ok(quantity)
}

/// Validate a unit price; must parse as a strict decimal and be > 0.
pub fn validate_price(text: &str) -> Result<Decimal, String> {
    let price = parse_money_text(text)
        .ok_or_else(|| "Please enter a number greater than 0".to_string())?;

    if !price.is_positive() {
        return Err("Please enter a number greater than 0".to_string());
    }

    Ok(price)
}

/// Validate a fee; must parse as a strict decimal and be >= 0.
pub fn validate_fee(text: &str) -> Result<Decimal, String> {
    let fee = parse_money_text(text).ok_or_else(|| "Please enter a number".to_string())?;

    if fee.is_negative() {
        return Err("Fee must not be negative".to_string());
    }

    Ok(fee)
}

/// Validate a transaction date; `YYYY-MM-DD`, not in the future.
pub fn validate_date(text: &str, today: NaiveDate) -> Result<NaiveDate, String> {
    let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| "Please enter a valid date".to_string())?;

    if date > today {
        return Err("Date must not be in the future".to_string());
    }

    Ok(date)
}

/// Run every field check against the form and collect failures.
///
/// `held` is the current quantity for the form's symbol (0 when the
/// position does not exist yet); only the Sell sufficiency rule uses it.
pub fn validate_candidate(
    form: &TransactionForm,
    held: i64,
    today: NaiveDate,
) -> Result<ValidCandidate, FieldErrors> {
    let mut errors = FieldErrors::default();

    let symbol = form.symbol.trim();
    if symbol.is_empty() {
        errors.insert("symbol", "Please select a company".to_string());
    }

    let kind = match TxnKind::parse(form.kind.trim()) {
        Some(kind) => kind,
        None => {
            errors.insert("type", "Transaction type must be Buy or Sell".to_string());
            // Quantity sufficiency needs a kind; default keeps the check lenient.
            TxnKind::Buy
        }
    };

    let date = match validate_date(&form.date, today) {
        Ok(date) => Some(date),
        Err(message) => {
            errors.insert("date", message);
            None
        }
    };

    let quantity = match validate_quantity(&form.quantity, kind, held) {
        Ok(quantity) => Some(quantity),
        Err(message) => {
            errors.insert("quantity", message);
            None
        }
    };

    let price = match validate_price(&form.price) {
        Ok(price) => Some(price),
        Err(message) => {
            errors.insert("price", message);
            None
        }
    };

    let fees = match validate_fee(&form.fees) {
        Ok(fees) => Some(fees),
        Err(message) => {
            errors.insert("fee", message);
            None
        }
    };

    match (date, quantity, price, fees) {
        (Some(date), Some(quantity), Some(price), Some(fees)) if errors.is_empty() => {
            let name = form.name.trim();
            Ok(ValidCandidate {
                symbol: Symbol::new(symbol),
                name: if name.is_empty() {
                    symbol.to_string()
                } else {
                    name.to_string()
                },
                kind,
                date,
                quantity,
                price,
                fees,
            })
        }
        _ => Err(errors),
    }
}

/// Strict decimal parse for money fields.
///
/// Accepts both `.` and `,` as the decimal separator, an optional
/// leading minus, and at most one separator with digits on both sides.
/// Leading-zero integer parts ("007", "05.2") are rejected.
fn parse_money_text(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = trimmed.replace(',', ".");
    let unsigned = normalized.strip_prefix('-').unwrap_or(&normalized);

    let mut parts = unsigned.split('.');
    let int_part = parts.next()?;
    let frac_part = parts.next();
    if parts.next().is_some() {
        return None;
    }

    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if int_part.len() > 1 && int_part.starts_with('0') {
        return None;
    }
    if let Some(frac) = frac_part {
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    Decimal::from_str_canonical(&normalized).ok()
}
