//! One-way cancellation flag shared by every worker of a run

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to a single cancellation flag.
///
/// The flag only moves from "running" to "cancelled". Setting it uses
/// `Release` and polling uses `Acquire`, so anything written before a
/// cancel is visible to a worker that observes it.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Returns `true` only for the call that flipped the flag.
    pub fn request_cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::Release)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_one_way_and_idempotent() {
        let signal = CancellationSignal::new();
        assert!(!signal.is_cancelled());
        assert!(signal.request_cancel());
        assert!(!signal.request_cancel());
        assert!(signal.is_cancelled());
    }

    #[test]
    fn test_clones_share_flag() {
        let signal = CancellationSignal::new();
        let other = signal.clone();
        other.request_cancel();
        assert!(signal.is_cancelled());
    }

    #[test]
    fn test_concurrent_cancel_has_single_transition() {
        let signal = CancellationSignal::new();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let s = signal.clone();
                thread::spawn(move || s.request_cancel())
            })
            .collect();

        let transitions = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&flipped| flipped)
            .count();
        assert_eq!(transitions, 1);
        assert!(signal.is_cancelled());
    }
}
