//! Money Conversion Module
//!
//! Every amount in the ledger is a `rust_decimal::Decimal` at scale 2.
//! Client strings enter through [`parse_amount`], engine inputs are fixed to
//! scale 2 through [`to_scale`], and everything leaving the service goes
//! through [`format_amount`]. Binary floating point is never involved.
//!
//! ```rust
//! use fund_transfer::money::{format_amount, parse_amount};
//!
//! let amount = parse_amount("100.5").unwrap();
//! assert_eq!(format_amount(amount), "100.50");
//! ```

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Decimal places carried by balances and amounts
pub const SCALE: u32 = 2;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount too large, would overflow")]
    Overflow,
}

// ============================================================================
// Parse: Client → Decimal
// ============================================================================

/// Parse a client amount string.
///
/// Accepts `digits` or `digits.d` / `digits.dd` only: no sign, no exponent,
/// no leading or trailing dot. The result is rescaled to [`SCALE`].
/// Zero is a valid parse; positivity is checked by the caller.
pub fn parse_amount(amount_str: &str) -> Result<Decimal, MoneyError> {
    let amount_str = amount_str.trim();
    if amount_str.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }

    if amount_str.starts_with('-') {
        return Err(MoneyError::InvalidAmount);
    }

    let (whole, frac) = match amount_str.split_once('.') {
        None => (amount_str, ""),
        Some((whole, frac)) => {
            if frac.is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing fractional part (e.g., use 5.0 instead of 5.)".into(),
                ));
            }
            (whole, frac)
        }
    };

    if whole.is_empty() {
        return Err(MoneyError::InvalidFormat(
            "missing leading zero (e.g., use 0.5 instead of .5)".into(),
        ));
    }

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return Err(MoneyError::InvalidFormat(format!(
            "not a decimal number: {}",
            amount_str
        )));
    }

    if frac.len() > SCALE as usize {
        return Err(MoneyError::PrecisionOverflow {
            provided: frac.len() as u32,
            max: SCALE,
        });
    }

    let mut amount = Decimal::from_str(amount_str).map_err(|_| MoneyError::Overflow)?;
    amount.rescale(SCALE);
    Ok(amount)
}

/// Fix an arbitrary decimal to [`SCALE`] without rounding.
///
/// Fails with `PrecisionOverflow` when non-zero digits exist beyond scale 2.
pub fn to_scale(amount: Decimal) -> Result<Decimal, MoneyError> {
    let mut scaled = amount.trunc_with_scale(SCALE);
    if scaled != amount {
        return Err(MoneyError::PrecisionOverflow {
            provided: amount.normalize().scale(),
            max: SCALE,
        });
    }
    scaled.rescale(SCALE);
    Ok(scaled)
}

// ============================================================================
// Format: Decimal → Client
// ============================================================================

/// Render an amount with exactly two decimal places ("100.50", "0.00")
pub fn format_amount(amount: Decimal) -> String {
    let mut display = amount;
    display.rescale(SCALE);
    display.to_string()
}

/// Largest balance representable by the `NUMERIC(15, 2)` balance column
pub fn max_balance() -> Decimal {
    Decimal::new(999_999_999_999_999, SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount_valid() {
        assert_eq!(parse_amount("100").unwrap(), dec("100.00"));
        assert_eq!(parse_amount("100.5").unwrap(), dec("100.50"));
        assert_eq!(parse_amount(" 75.25 ").unwrap(), dec("75.25"));
        assert_eq!(parse_amount("0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_amount_keeps_scale() {
        assert_eq!(parse_amount("100").unwrap().scale(), SCALE);
        assert_eq!(parse_amount("100.5").unwrap().to_string(), "100.50");
    }

    #[test]
    fn test_parse_amount_rejects_bad_formats() {
        assert!(matches!(
            parse_amount(""),
            Err(MoneyError::InvalidFormat(_))
        ));
        assert!(matches!(parse_amount("-50.00"), Err(MoneyError::InvalidAmount)));
        assert!(matches!(
            parse_amount("+5"),
            Err(MoneyError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_amount(".5"),
            Err(MoneyError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_amount("5."),
            Err(MoneyError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_amount("1.2.3"),
            Err(MoneyError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_amount("invalid"),
            Err(MoneyError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_amount("1e5"),
            Err(MoneyError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_amount_precision_overflow() {
        assert_eq!(
            parse_amount("1.005"),
            Err(MoneyError::PrecisionOverflow {
                provided: 3,
                max: 2
            })
        );
    }

    #[test]
    fn test_parse_amount_overflow() {
        assert_eq!(
            parse_amount("99999999999999999999999999999999"),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn test_to_scale() {
        assert_eq!(to_scale(dec("1.5")).unwrap().to_string(), "1.50");
        assert_eq!(to_scale(dec("1.500")).unwrap().to_string(), "1.50");
        assert!(matches!(
            to_scale(dec("1.501")),
            Err(MoneyError::PrecisionOverflow { provided: 3, .. })
        ));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec("100.5")), "100.50");
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
        assert_eq!(format_amount(dec("9899.50")), "9899.50");
    }

    #[test]
    fn test_max_balance() {
        assert_eq!(format_amount(max_balance()), "9999999999999.99");
    }
}
