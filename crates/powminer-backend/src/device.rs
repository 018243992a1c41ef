//! Backend kinds and hardware device selection

use serde::{Deserialize, Serialize};

/// Hash-trial backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    Cpu,
    Cuda,
    OpenCl,
}

impl BackendKind {
    /// Upper bound on concurrent workers.
    ///
    /// Device kernels saturate their GPU from a single host thread.
    pub fn max_threads(self) -> usize {
        match self {
            BackendKind::Cpu => 256,
            BackendKind::Cuda | BackendKind::OpenCl => 1,
        }
    }

    pub fn needs_device(self) -> bool {
        !matches!(self, BackendKind::Cpu)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Cpu => write!(f, "CPU"),
            BackendKind::Cuda => write!(f, "CUDA"),
            BackendKind::OpenCl => write!(f, "OpenCL"),
        }
    }
}

/// Which GPU to run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSelector {
    /// Device index
    pub gpu_id: u32,
    /// OpenCL platform index (ignored by CUDA)
    pub platform_id: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_limits() {
        assert_eq!(BackendKind::Cpu.max_threads(), 256);
        assert_eq!(BackendKind::Cuda.max_threads(), 1);
        assert_eq!(BackendKind::OpenCl.max_threads(), 1);
        assert!(!BackendKind::Cpu.needs_device());
        assert!(BackendKind::OpenCl.needs_device());
    }

    #[test]
    fn test_display() {
        assert_eq!(BackendKind::OpenCl.to_string(), "OpenCL");
    }
}
