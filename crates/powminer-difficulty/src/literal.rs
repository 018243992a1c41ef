//! Unsigned integer literals in `0x` hex or decimal form

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("`{0}` is not an integer")]
    NotAnInteger(String),
    #[error("`{literal}` does not fit in {bits} bits")]
    TooWide { literal: String, bits: u64 },
}

/// Parse an unsigned literal that must fit in `bits` bits.
///
/// `0x`-prefixed input is read as hexadecimal, anything else as decimal.
pub fn parse_literal(text: &str, bits: u64) -> Result<BigUint, LiteralError> {
    let not_an_integer = || LiteralError::NotAnInteger(text.to_string());

    let (digits, radix) = match text.strip_prefix("0x") {
        Some(hex) => (hex, 16),
        None => (text, 10),
    };

    let valid = !digits.is_empty()
        && digits.chars().all(|c| {
            if radix == 16 {
                c.is_ascii_hexdigit()
            } else {
                c.is_ascii_digit()
            }
        });
    if !valid {
        return Err(not_an_integer());
    }

    let value = BigUint::parse_bytes(digits.as_bytes(), radix).ok_or_else(not_an_integer)?;
    if value.bits() > bits {
        return Err(LiteralError::TooWide {
            literal: text.to_string(),
            bits,
        });
    }
    Ok(value)
}

/// Big-endian, zero-padded fixed-width form of `value`, if it fits
pub fn to_be_array<const N: usize>(value: &BigUint) -> Option<[u8; N]> {
    let mut out = [0u8; N];
    if value.is_zero() {
        return Some(out);
    }
    let raw = value.to_bytes_be();
    if raw.len() > N {
        return None;
    }
    out[N - raw.len()..].copy_from_slice(&raw);
    Some(out)
}

/// Parse a 64-bit unsigned literal, clamping it into the non-negative `i64` range.
pub fn parse_u64_saturating_i64(text: &str) -> Result<i64, LiteralError> {
    let value = parse_literal(text, 64)?;
    let value = value.to_u64().ok_or_else(|| LiteralError::TooWide {
        literal: text.to_string(),
        bits: 64,
    })?;
    Ok(value.min(i64::MAX as u64) as i64)
}
