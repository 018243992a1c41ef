//! Boost factor benchmark
//!
//! Every run uses an all-zero target, which no hash can beat, so each
//! sweep step measures raw throughput until its deadline.

use std::fmt;
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use powminer_backend::SearchConfig;

use crate::encoder::EncodeError;
use crate::search::{SearchCoordinator, SearchError};

/// Boost factors `2^0 ..= 2^14`
pub const BOOST_EXPONENTS: RangeInclusive<u32> = 0..=14;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSample {
    pub boost_factor: u32,
    pub attempts_per_second: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub best_factor: u32,
    pub best_speed: f64,
    pub samples: Vec<BenchmarkSample>,
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "*".repeat(49);
        writeln!(f, "{}", rule)?;
        writeln!(f, "***")?;
        writeln!(f, "***   best boost factor: {}", self.best_factor)?;
        writeln!(f, "***   best speed:        {:.1e} hps", self.best_speed)?;
        writeln!(f, "***")?;
        write!(f, "{}", rule)
    }
}

/// Measure every boost factor and keep the fastest (earliest wins ties).
pub fn sweep<F>(mut measure: F) -> Result<BenchmarkReport, SearchError>
where
    F: FnMut(u32) -> Result<f64, SearchError>,
{
    let mut samples = Vec::with_capacity(BOOST_EXPONENTS.count());
    let mut best: Option<BenchmarkSample> = None;

    for exponent in BOOST_EXPONENTS {
        let boost_factor = 1u32 << exponent;
        let sample = BenchmarkSample {
            boost_factor,
            attempts_per_second: measure(boost_factor)?,
        };
        if best.map_or(true, |b| sample.attempts_per_second > b.attempts_per_second) {
            best = Some(sample);
        }
        samples.push(sample);
    }

    let best = best.unwrap_or(BenchmarkSample {
        boost_factor: 1,
        attempts_per_second: 0.0,
    });
    Ok(BenchmarkReport {
        best_factor: best.boost_factor,
        best_speed: best.attempts_per_second,
        samples,
    })
}

fn discard(_: &[u8]) -> Result<(), EncodeError> {
    Ok(())
}

/// Run the coordinator for `timeout` per boost factor on a private copy of `config`.
pub fn run_benchmark(
    coordinator: &SearchCoordinator,
    config: &SearchConfig,
    timeout: Duration,
) -> Result<BenchmarkReport, SearchError> {
    let mut bench = config.clone();
    bench.target = [0u8; 32];
    bench.max_iterations = i64::MAX;

    sweep(|boost_factor| {
        bench.boost_factor = boost_factor;
        bench.deadline = Some(Instant::now() + timeout);

        let outcome = coordinator.run_search(&bench, &discard)?;
        if outcome.is_found() {
            warn!("benchmark run produced a result with an unreachable target");
        }
        let stats = outcome.stats();
        info!("boost factor {}: {}", boost_factor, stats);
        Ok(stats.attempts_per_second)
    })
}
