//! Expected work for a 256-bit difficulty target

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use thiserror::Error;

use crate::literal::to_be_array;

/// Targets must stay strictly below `2^TARGET_LIMIT_BITS`.
pub const TARGET_LIMIT_BITS: u64 = 256 - 62;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DifficultyError {
    #[error("difficulty target must be non-zero")]
    Zero,
    #[error("difficulty target must be below 2^194 (got {bits} bits)")]
    OutOfRange { bits: u64 },
}

/// Reject targets outside `0 < D < 2^194`.
pub fn validate_target(target: &BigUint) -> Result<(), DifficultyError> {
    if target.is_zero() {
        return Err(DifficultyError::Zero);
    }
    let bits = target.bits();
    if bits > TARGET_LIMIT_BITS {
        return Err(DifficultyError::OutOfRange { bits });
    }
    Ok(())
}

/// Expected number of attempts before success: `floor(2^256 / D)`.
///
/// A single attempt succeeds with probability `D / 2^256`, so this is the
/// mean of the geometric distribution. It is informational only.
pub fn expected_attempts(target: &BigUint) -> Result<BigUint, DifficultyError> {
    if target.is_zero() {
        return Err(DifficultyError::Zero);
    }
    Ok((BigUint::one() << 256u32) / target)
}

/// Same as [`expected_attempts`] but as a float, for probability estimates.
pub fn expected_attempts_f64(target: &BigUint) -> Result<f64, DifficultyError> {
    let attempts = expected_attempts(target)?;
    Ok(attempts.to_f64().unwrap_or(f64::INFINITY))
}

/// Big-endian, zero-padded 32-byte form of the target.
pub fn target_bytes(target: &BigUint) -> Result<[u8; 32], DifficultyError> {
    to_be_array(target).ok_or(DifficultyError::OutOfRange {
        bits: target.bits(),
    })
}

/// Format an attempt count as human-readable string
pub fn format_attempts(attempts: f64) -> String {
    if attempts >= 1e15 {
        format!("{:.2}P", attempts / 1e15)
    } else if attempts >= 1e12 {
        format!("{:.2}T", attempts / 1e12)
    } else if attempts >= 1e9 {
        format!("{:.2}G", attempts / 1e9)
    } else if attempts >= 1e6 {
        format!("{:.2}M", attempts / 1e6)
    } else if attempts >= 1e3 {
        format!("{:.2}K", attempts / 1e3)
    } else {
        format!("{:.0}", attempts)
    }
}
