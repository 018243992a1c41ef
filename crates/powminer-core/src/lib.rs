//! Powminer Core Engine
//!
//! Races hash-trial workers for a proof-of-work value, benchmarks boost
//! factors and encodes the winner into an external message.

mod benchmark;
mod encoder;
mod search;
mod stats;

pub use benchmark::{run_benchmark, sweep, BenchmarkReport, BenchmarkSample, BOOST_EXPONENTS};
pub use encoder::{encode_and_persist, EncodeError, EnvelopeTarget, ResultEncoder};
pub use search::{AcceptHandler, SearchCoordinator, SearchError, SearchOutcome};
pub use stats::{throughput, RunState, StatsSnapshot};

// Re-exports for convenience
pub use powminer_backend::{
    is_available, open_backend, BackendError, BackendKind, CancellationSignal, DeviceSelector,
    HashTrial, SearchConfig, TrialContext,
};
pub use powminer_difficulty::{
    expected_attempts, expected_attempts_f64, format_attempts, parse_literal,
    parse_u64_saturating_i64, target_bytes, to_be_array, validate_target, BigUint,
    DifficultyError, LiteralError,
};
pub use powminer_ledger::{parse_mining_address, AddressError, StdAddress};
