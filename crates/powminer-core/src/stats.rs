//! Run-scoped shared state and statistics

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use powminer_backend::{CancellationSignal, TrialContext};

/// State shared by the workers of one search run.
///
/// Created fresh for every run so sequential runs never see each other's
/// counters. Workers only increment the counter, poll or set the
/// cancellation flag, and race for the accept claim.
#[derive(Debug)]
pub struct RunState {
    /// Total attempts, relaxed increments
    attempts: AtomicU64,
    /// Start time
    start_time: Instant,
    cancel: CancellationSignal,
    /// Times the cancel flag actually flipped; at most one per run
    cancel_transitions: AtomicU32,
    /// Set once by the worker whose result is accepted
    accepted: AtomicBool,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            attempts: AtomicU64::new(0),
            start_time: Instant::now(),
            cancel: CancellationSignal::new(),
            cancel_transitions: AtomicU32::new(0),
            accepted: AtomicBool::new(false),
        }
    }

    /// Context handed to a kernel invocation
    pub fn trial_context(&self) -> TrialContext<'_> {
        TrialContext::new(&self.attempts, &self.cancel)
    }

    pub fn cancel_signal(&self) -> &CancellationSignal {
        &self.cancel
    }

    /// Cancel the run. Returns `true` only for the call that flipped the flag.
    pub fn request_cancel(&self) -> bool {
        let flipped = self.cancel.request_cancel();
        if flipped {
            self.cancel_transitions.fetch_add(1, Ordering::Relaxed);
        }
        flipped
    }

    pub fn cancel_transitions(&self) -> u32 {
        self.cancel_transitions.load(Ordering::Relaxed)
    }

    pub fn total_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Claim the single accept slot. Exactly one caller per run gets `true`.
    pub fn try_accept(&self) -> bool {
        self.accepted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let elapsed_secs = self.elapsed().as_secs_f64();
        let attempts = self.total_attempts();
        StatsSnapshot {
            elapsed_secs,
            attempts,
            attempts_per_second: throughput(attempts, elapsed_secs),
        }
    }

    /// One-line progress with success probability against the expected work
    pub fn format_progress(&self, expected_attempts: Option<f64>) -> String {
        let snap = self.snapshot();
        let mut line = format!(
            "[{:.2} Mh/s][Total {}][{}]",
            snap.attempts_per_second / 1_000_000.0,
            snap.attempts,
            format_duration(snap.elapsed_secs)
        );

        if let Some(expected) = expected_attempts.filter(|e| *e > 0.0) {
            let prob = 1.0 - (-(snap.attempts as f64) / expected).exp();
            let remaining_for_50 = if prob < 0.5 && snap.attempts_per_second > 0.0 {
                (expected * std::f64::consts::LN_2 - snap.attempts as f64) / snap.attempts_per_second
            } else {
                0.0
            };
            line.push_str(&format!(
                "[Prob {:.1}%][50% in {}]",
                prob * 100.0,
                format_duration(remaining_for_50)
            ));
        }
        line
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Attempts per second; elapsed times under a nanosecond count as one second
pub fn throughput(attempts: u64, elapsed_secs: f64) -> f64 {
    let elapsed = if elapsed_secs < 1e-9 { 1.0 } else { elapsed_secs };
    attempts as f64 / elapsed
}

/// Point-in-time statistics of a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub elapsed_secs: f64,
    pub attempts: u64,
    pub attempts_per_second: f64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ passed: {}, hashes computed: {}, speed: {:.1e} hps ]",
            format_duration(self.elapsed_secs),
            self.attempts,
            self.attempts_per_second
        )
    }
}

fn format_duration(seconds: f64) -> String {
    if seconds <= 0.0 {
        return "now".to_string();
    }
    if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else if seconds < 3600.0 {
        format!("{:.1}m", seconds / 60.0)
    } else if seconds < 86400.0 {
        format!("{:.1}h", seconds / 3600.0)
    } else if seconds < 86400.0 * 365.0 {
        format!("{:.1}d", seconds / 86400.0)
    } else {
        format!("{:.1}y", seconds / (86400.0 * 365.0))
    }
}
