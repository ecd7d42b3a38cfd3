//! Account address validation (20-byte hex, EIP-55 checksum for mixed case)

use once_cell::sync::Lazy;
use regex::Regex;
use sha3::{Digest, Keccak256};

static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static address regex")
});

/// True for a `0x`-prefixed 40-hex-digit address. All-lowercase and
/// all-uppercase forms carry no checksum and are accepted as-is; mixed case
/// must match the EIP-55 checksum.
pub fn is_valid_address(candidate: &str) -> bool {
    if !ADDRESS_RE.is_match(candidate) {
        return false;
    }
    let body = &candidate[2..];
    let has_lower = body.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = body.bytes().any(|b| b.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }
    to_checksum_address(candidate).as_deref() == Some(candidate)
}

/// EIP-55 mixed-case checksum encoding, `None` if not an address.
pub fn to_checksum_address(candidate: &str) -> Option<String> {
    if !ADDRESS_RE.is_match(candidate) {
        return None;
    }
    let lower = candidate[2..].to_ascii_lowercase();
    let hash = hex::encode(Keccak256::digest(lower.as_bytes()));

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (c, h) in lower.chars().zip(hash.chars()) {
        if c.is_ascii_alphabetic() && h.to_digit(16).unwrap_or(0) >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Case-insensitive address comparison.
pub fn same_address(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
