//! Per-run search parameters

use std::time::Instant;

use powminer_ledger::StdAddress;

use crate::device::{BackendKind, DeviceSelector};

/// Search configuration
///
/// Built once from validated input. Every worker receives the same value;
/// benchmark sweeps mutate a private clone.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Address that will own the proof, with its bounceable flag
    pub origin: StdAddress,
    /// Giver seed
    pub seed: [u8; 16],
    /// Big-endian difficulty target; a hash strictly below it wins
    pub target: [u8; 32],
    /// Attempt budget per worker (`i64::MAX` = unbounded)
    pub max_iterations: i64,
    /// Absolute deadline
    pub deadline: Option<Instant>,
    /// Number of concurrent workers
    pub threads: usize,
    /// Work partitioning factor handed to the kernel
    pub boost_factor: u32,
    /// GPU selection for device backends
    pub device: Option<DeviceSelector>,
    /// Kernel implementation
    pub backend: BackendKind,
}

impl SearchConfig {
    pub fn new(origin: StdAddress, seed: [u8; 16], target: [u8; 32], max_iterations: i64) -> Self {
        Self {
            origin,
            seed,
            target,
            max_iterations,
            deadline: None,
            threads: 1,
            boost_factor: 16,
            device: None,
            backend: BackendKind::Cpu,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}
