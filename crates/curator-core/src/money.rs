//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The platform sends prices as decimal strings ("12.00") while stored   │
//! │  rows may carry numbers (12.0). Comparing those as floats invites      │
//! │  0.1 + 0.2 = 0.30000000000000004 class bugs and phantom diffs.         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    "12.00" → 1200      12.0 → 1200      12 → 1200                      │
//! │    All three coerce to the same Money and compare equal.               │
//! │    null / absent stays None, never collapsed into 0.                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use curator_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // 10.99
//!
//! // Parse a platform decimal string exactly (no float round-trip)
//! let parsed = Money::parse("10.99").unwrap();
//! assert_eq!(price, parsed);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::error::CoreError;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for margin math (price − cost)
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parses a decimal currency string ("12", "12.5", "12.00") exactly.
    ///
    /// ## Rules
    /// - Optional leading `-`
    /// - At most two significant fraction digits; extra digits must be zeros
    ///   ("12.500" is fine, "12.505" is rejected)
    /// - No grouping separators, no currency symbols
    ///
    /// ## Why Not f64::parse?
    /// String prices must compare bit-exact against numeric prices after
    /// coercion. Parsing digits directly into cents avoids any float
    /// representation on this path.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let s = input.trim();

        let invalid = |reason: &str| CoreError::InvalidMoney {
            value: input.to_string(),
            reason: reason.to_string(),
        };

        if s.is_empty() {
            return Err(invalid("empty string"));
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("no digits"));
        }
        if !int_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("unexpected character in integer part"));
        }
        if !frac_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("unexpected character in fraction part"));
        }
        // Beyond two fraction digits only zeros are representable in cents.
        if frac_part.len() > 2 && frac_part[2..].chars().any(|c| c != '0') {
            return Err(invalid("more than two significant fraction digits"));
        }

        let whole: i64 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| invalid("integer part out of range"))?
        };

        let mut frac = frac_part.chars().take(2).collect::<String>();
        while frac.len() < 2 {
            frac.push('0');
        }
        // Two ASCII digits always parse.
        let frac: i64 = frac.parse().unwrap_or(0);

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .ok_or_else(|| invalid("value out of range"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Converts a float amount (currency units, not cents) by rounding.
    ///
    /// Only used for values that already arrived as JSON numbers; string
    /// prices go through [`Money::parse`].
    #[inline]
    pub fn from_f64(amount: f64) -> Self {
        Money((amount * 100.0).round() as i64)
    }

    /// Renders the platform wire format: two fraction digits, no symbol.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal_string())
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

// =============================================================================
// Numeric Coercion
// =============================================================================

/// Coerces a loosely typed JSON value into `Option<Money>`.
///
/// ## Coercion Table
/// ```text
/// null / absent          → None
/// ""                     → None
/// "12.00"                → Some(1200)
/// "0"                    → Some(0)       ← distinct from None
/// 12   (integer)         → Some(1200)
/// 12.0 (float)           → Some(1200)
/// ```
///
/// The local store and the live fetch disagree on representation for the
/// same value; every price comparison in the differ goes through this
/// single function so "12.00" vs 12.0 never reports a phantom change.
pub fn coerce_money(value: Option<&Value>) -> Result<Option<Money>, CoreError> {
    let value = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };

    match value {
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Money::parse(s).map(Some),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                let cents = i.checked_mul(100).ok_or_else(|| CoreError::InvalidMoney {
                    value: i.to_string(),
                    reason: "amount overflows cents".to_string(),
                })?;
                Ok(Some(Money::from_cents(cents)))
            } else if let Some(f) = n.as_f64() {
                Ok(Some(Money::from_f64(f)))
            } else {
                Err(CoreError::InvalidMoney {
                    value: n.to_string(),
                    reason: "unrepresentable number".to_string(),
                })
            }
        }
        other => Err(CoreError::InvalidMoney {
            value: other.to_string(),
            reason: "expected string, number, or null".to_string(),
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_two_fraction_digits() {
        assert_eq!(Money::parse("12.00").unwrap(), Money::from_cents(1200));
        assert_eq!(Money::parse("12.5").unwrap(), Money::from_cents(1250));
        assert_eq!(Money::parse("12").unwrap(), Money::from_cents(1200));
        assert_eq!(Money::parse("0.07").unwrap(), Money::from_cents(7));
        assert_eq!(Money::parse("-3.25").unwrap(), Money::from_cents(-325));
    }

    #[test]
    fn test_parse_trailing_zeros_allowed() {
        assert_eq!(Money::parse("12.500").unwrap(), Money::from_cents(1250));
        assert!(Money::parse("12.505").is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Money::parse("").is_err());
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("12,00").is_err());
        assert!(Money::parse("$12.00").is_err());
        assert!(Money::parse("-").is_err());
    }

    #[test]
    fn test_string_and_number_coerce_equal() {
        let from_string = coerce_money(Some(&json!("12.00"))).unwrap();
        let from_float = coerce_money(Some(&json!(12.0))).unwrap();
        let from_int = coerce_money(Some(&json!(12))).unwrap();
        assert_eq!(from_string, Some(Money::from_cents(1200)));
        assert_eq!(from_string, from_float);
        assert_eq!(from_string, from_int);
    }

    #[test]
    fn test_null_distinct_from_zero() {
        let null = coerce_money(Some(&Value::Null)).unwrap();
        let absent = coerce_money(None).unwrap();
        let zero = coerce_money(Some(&json!("0"))).unwrap();
        assert_eq!(null, None);
        assert_eq!(absent, None);
        assert_eq!(zero, Some(Money::zero()));
        assert_ne!(null, zero);
    }

    #[test]
    fn test_huge_integer_is_an_error_not_a_panic() {
        let result = coerce_money(Some(&json!(i64::MAX)));
        assert!(matches!(result, Err(CoreError::InvalidMoney { .. })));
    }

    #[test]
    fn test_decimal_string_rendering() {
        assert_eq!(Money::from_cents(1200).to_decimal_string(), "12.00");
        assert_eq!(Money::from_cents(7).to_decimal_string(), "0.07");
        assert_eq!(Money::from_cents(-325).to_decimal_string(), "-3.25");
    }

    #[test]
    fn test_arithmetic() {
        let price = Money::from_cents(1099);
        let cost = Money::from_cents(600);
        assert_eq!((price - cost).cents(), 499);
        assert_eq!((price + cost).cents(), 1699);
    }
}
