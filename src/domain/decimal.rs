//! Lossless decimal numeric type backed by rust_decimal.
//!
//! All money math in the ledger (cost basis, fees, valuation) goes through
//! this type; SQLite rows store its canonical string form.

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lossless decimal numeric type for money amounts.
///
/// Backed by rust_decimal to avoid binary rounding artifacts at the
/// cent level. Serializes to a JSON number by default.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Decimal {
    /// Create a Decimal from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Decimal)
    }

    /// Format the Decimal as a canonical string (no exponent notation,
    /// no trailing zeros).
    pub fn to_canonical_string(&self) -> String {
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// Convert an integer share count into a Decimal.
    pub fn from_i64(value: i64) -> Self {
        Decimal(RustDecimal::from(value))
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    /// Returns the value 100, the percentage scale factor.
    pub fn hundred() -> Self {
        Decimal(RustDecimal::ONE_HUNDRED)
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Round to `dp` decimal places (banker-free, half away from zero).
    ///
    /// Display-level helper; ledger math never rounds.
    pub fn round_dp(&self, dp: u32) -> Self {
        Decimal(
            self.0
                .round_dp_with_strategy(dp, rust_decimal::RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

impl std::ops::Div for Decimal {
    type Output = Decimal;

    fn div(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 / rhs.0)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_parse_roundtrip() {
        let test_cases = vec!["160", "20.50", "0.0001", "-6.25", "0", "999999999.999999999"];

        for s in test_cases {
            let decimal = Decimal::from_str_canonical(s).expect("parse failed");
            let formatted = decimal.to_canonical_string();
            let reparsed = Decimal::from_str_canonical(&formatted).expect("reparse failed");
            assert_eq!(decimal, reparsed, "roundtrip failed for {}", s);
        }
    }

    #[test]
    fn test_decimal_canonical_no_exponent_no_trailing_zeros() {
        let decimal = Decimal::from_str_canonical("20.50").expect("parse failed");
        let formatted = decimal.to_canonical_string();
        assert!(!formatted.contains('e'));
        assert_eq!(formatted, "20.5");
    }

    #[test]
    fn test_decimal_arithmetic_is_exact_at_cent_level() {
        // 0.1 + 0.2 is exactly 0.3 here, unlike f64.
        let a = Decimal::from_str_canonical("0.1").unwrap();
        let b = Decimal::from_str_canonical("0.2").unwrap();
        assert_eq!((a + b).to_canonical_string(), "0.3");

        let price = Decimal::from_str_canonical("160").unwrap();
        let qty = Decimal::from_i64(10);
        assert_eq!((price * qty).to_canonical_string(), "1600");
    }

    #[test]
    fn test_decimal_division() {
        let total = Decimal::from_str_canonical("1610").unwrap();
        let qty = Decimal::from_i64(10);
        assert_eq!((total / qty).to_canonical_string(), "161");
    }

    #[test]
    fn test_decimal_json_serializes_as_number() {
        let decimal = Decimal::from_str_canonical("123.456").unwrap();
        let json = serde_json::to_value(decimal).unwrap();
        assert!(json.is_number());
        assert_eq!(json.to_string(), "123.456");
    }

    #[test]
    fn test_decimal_round_dp() {
        let pct = Decimal::from_str_canonical("-6.254999").unwrap();
        assert_eq!(pct.round_dp(2).to_canonical_string(), "-6.25");
        let up = Decimal::from_str_canonical("7.145").unwrap();
        assert_eq!(up.round_dp(2).to_canonical_string(), "7.15");
    }

    #[test]
    fn test_decimal_sign_helpers() {
        assert!(Decimal::from_str_canonical("1").unwrap().is_positive());
        assert!(Decimal::from_str_canonical("-1").unwrap().is_negative());
        assert!(Decimal::zero().is_zero());
        assert!(!Decimal::zero().is_positive());
        assert!(!Decimal::zero().is_negative());
    }
}
