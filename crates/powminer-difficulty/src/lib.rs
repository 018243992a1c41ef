//! Powminer Difficulty Arithmetic
//!
//! Numeric literal parsing and expected-work estimates for difficulty targets.

mod difficulty;
mod literal;

pub use difficulty::{
    expected_attempts, expected_attempts_f64, format_attempts, target_bytes, validate_target,
    DifficultyError, TARGET_LIMIT_BITS,
};
pub use literal::{parse_literal, parse_u64_saturating_i64, to_be_array, LiteralError};

pub use num_bigint::BigUint;
