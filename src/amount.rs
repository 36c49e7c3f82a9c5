//! Decimal amount conversion between human-readable strings and a token's
//! smallest integer unit.
//!
//! Quote requests carry amounts as base-unit integers, so the conversion has
//! to be exact: the parsing path is pure string math with no floating point.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("'{0}' is not a valid decimal number")]
    Malformed(String),
    #[error("amount has {got} decimal places but the token supports {max}")]
    TooManyDecimals { got: usize, max: u8 },
    #[error("amount is too large")]
    Overflow,
}

/// Convert a human-readable decimal string to base units.
///
/// Fails on malformed input, on more fractional digits than the token's
/// decimals, and on overflow. Negative amounts are malformed by construction
/// (the sign is not a digit).
pub fn to_base_units(human: &str, decimals: u8) -> Result<u128, AmountError> {
    let trimmed = human.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::Malformed(human.to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(AmountError::Malformed(human.to_string()));
    }
    if frac.len() > decimals as usize {
        return Err(AmountError::TooManyDecimals {
            got: frac.len(),
            max: decimals,
        });
    }

    let mut value: u128 = 0;
    for c in whole.chars() {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((c as u8 - b'0') as u128))
            .ok_or(AmountError::Overflow)?;
    }
    for i in 0..decimals as usize {
        let digit = frac.as_bytes().get(i).map(|&b| (b - b'0') as u128).unwrap_or(0);
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(digit))
            .ok_or(AmountError::Overflow)?;
    }

    Ok(value)
}

/// Format a base-unit amount back to a human-readable string, trimming
/// trailing zeros from the fractional part.
pub fn from_base_units(amount: u128, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let divisor = 10u128.pow(decimals as u32);
    let whole = amount / divisor;
    let fractional = amount % divisor;

    let fractional_str = format!("{:0>width$}", fractional, width = decimals as usize);
    let trimmed = fractional_str.trim_end_matches('0');

    if trimmed.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, trimmed)
    }
}

/// Format a base-unit decimal string (as carried on route objects) back to a
/// human-readable string. Returns `None` if the string is not an integer.
pub fn format_base_units(amount: &str, decimals: u8) -> Option<String> {
    amount.parse::<u128>().ok().map(|v| from_base_units(v, decimals))
}

/// Lossy conversion of a base-unit decimal string to `f64`, for display math
/// (rates, USD values, quote-to-quote comparisons).
pub fn base_units_to_f64(amount: &str, decimals: u8) -> Option<f64> {
    let value = amount.parse::<u128>().ok()?;
    Some(value as f64 / 10f64.powi(decimals as i32))
}
