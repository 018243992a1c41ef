//! Hash-trial capability shared by all backends

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::cancel::CancellationSignal;
use crate::config::SearchConfig;
use crate::device::BackendKind;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{0} backend is not available in this build")]
    Unavailable(BackendKind),
    #[error("{0} backend needs a GPU id")]
    DeviceRequired(BackendKind),
    #[error("device failure: {0}")]
    Device(String),
}

/// Shared counters a kernel reports into while it runs
#[derive(Debug, Clone, Copy)]
pub struct TrialContext<'a> {
    attempts: &'a AtomicU64,
    cancel: &'a CancellationSignal,
}

impl<'a> TrialContext<'a> {
    pub fn new(attempts: &'a AtomicU64, cancel: &'a CancellationSignal) -> Self {
        Self { attempts, cancel }
    }

    /// Publish finished attempts
    pub fn record(&self, count: u64) {
        self.attempts.fetch_add(count, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// A proof-of-work kernel.
///
/// `try_search` samples candidates until one beats `config.target`, the
/// iteration budget is spent, the deadline passes, or cancellation is
/// observed. Implementations partition their own search space so that
/// concurrent calls with the same config do not repeat each other.
pub trait HashTrial: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn try_search(
        &self,
        config: &SearchConfig,
        ctx: &TrialContext<'_>,
    ) -> Result<Option<Vec<u8>>, BackendError>;
}
