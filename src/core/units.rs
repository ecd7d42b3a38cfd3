//! Smallest-unit <-> decimal conversion
//!
//! Balances arrive as integers in the chain's smallest unit (wei for 18
//! decimals). Display truncates toward zero so a shown balance never exceeds
//! the real one.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("empty amount")]
    Empty,
    #[error("not a decimal number: {0}")]
    NotDecimal(String),
    #[error("too many fractional digits (max {0})")]
    TooPrecise(u32),
    #[error("amount out of range")]
    Overflow,
}

fn pow10(exp: u32) -> Result<u128, UnitsError> {
    10u128.checked_pow(exp).ok_or(UnitsError::Overflow)
}

/// Parse a plain decimal string ("1", "0.25", ".5") into smallest units.
///
/// Signs, exponents and anything non-numeric are rejected.
pub fn parse_units(amount: &str, decimals: u32) -> Result<u128, UnitsError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, frac) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !is_digits(whole) || !is_digits(frac) {
        return Err(UnitsError::NotDecimal(amount.to_string()));
    }
    if frac.len() as u32 > decimals {
        return Err(UnitsError::TooPrecise(decimals));
    }

    let scale = pow10(decimals)?;
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| UnitsError::Overflow)?
    };
    let frac_units = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = decimals as usize);
        padded.parse::<u128>().map_err(|_| UnitsError::Overflow)?
    };

    whole_units
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_units))
        .ok_or(UnitsError::Overflow)
}

/// Format smallest units as a decimal string cut (not rounded) to `places`
/// fractional digits. Trailing zeros are dropped: `1_500_000_000_000_000_000`
/// at 18 decimals renders as `1.5`, zero renders as `0`.
pub fn format_units_truncated(value: u128, decimals: u32, places: u32) -> String {
    let Ok(scale) = pow10(decimals) else {
        return "0".to_string();
    };
    let whole = value / scale;
    let remainder = value % scale;

    let keep = places.min(decimals);
    let frac = match pow10(decimals - keep) {
        Ok(cut) => remainder / cut,
        Err(_) => 0,
    };
    if keep == 0 || frac == 0 {
        return whole.to_string();
    }

    let digits = format!("{:0>width$}", frac, width = keep as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Parse a JSON-RPC hex quantity ("0x1bc16d674ec80000").
pub fn parse_quantity(hex: &str) -> Result<u128, UnitsError> {
    let digits = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .ok_or_else(|| UnitsError::NotDecimal(hex.to_string()))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16).map_err(|e| match e.kind() {
        std::num::IntErrorKind::PosOverflow => UnitsError::Overflow,
        _ => UnitsError::NotDecimal(hex.to_string()),
    })
}

/// Encode an integer as a JSON-RPC hex quantity.
pub fn to_quantity(value: u128) -> String {
    format!("0x{:x}", value)
}
