//! Powminer Hash-Trial Backends
//!
//! The search coordinator drives any [`HashTrial`] implementation; the CPU
//! kernel ships with this crate, device kernels are selected by
//! [`BackendKind`] and reported unavailable when not built in.

mod cancel;
mod config;
mod cpu;
mod device;
mod trial;

use std::sync::Arc;

pub use cancel::CancellationSignal;
pub use config::SearchConfig;
pub use cpu::{pow_hash, CpuTrial, MineBody};
pub use device::{BackendKind, DeviceSelector};
pub use trial::{BackendError, HashTrial, TrialContext};

/// Check whether a backend can be opened in this build
pub fn is_available(kind: BackendKind) -> bool {
    matches!(kind, BackendKind::Cpu)
}

/// Open the hash-trial implementation for `kind`
pub fn open_backend(kind: BackendKind) -> Result<Arc<dyn HashTrial>, BackendError> {
    match kind {
        BackendKind::Cpu => Ok(Arc::new(CpuTrial)),
        other => Err(BackendError::Unavailable(other)),
    }
}
