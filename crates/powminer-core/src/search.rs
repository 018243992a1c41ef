//! Search coordinator: races workers for the first accepted result

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use powminer_backend::{BackendError, HashTrial, SearchConfig};

use crate::encoder::EncodeError;
use crate::stats::{RunState, StatsSnapshot};

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("thread count {requested} out of range (1..={max} for this backend)")]
    InvalidThreads { requested: usize, max: usize },
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Called exactly once per run, by the worker that wins the accept claim
pub trait AcceptHandler: Sync {
    fn accept(&self, value: &[u8]) -> Result<(), EncodeError>;
}

impl<F> AcceptHandler for F
where
    F: Fn(&[u8]) -> Result<(), EncodeError> + Sync,
{
    fn accept(&self, value: &[u8]) -> Result<(), EncodeError> {
        self(value)
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found { value: Vec<u8>, stats: StatsSnapshot },
    Exhausted { stats: StatsSnapshot },
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found { .. })
    }

    pub fn stats(&self) -> &StatsSnapshot {
        match self {
            SearchOutcome::Found { stats, .. } | SearchOutcome::Exhausted { stats } => stats,
        }
    }
}

/// Proof-of-work search coordinator
pub struct SearchCoordinator {
    backend: Arc<dyn HashTrial>,
    progress_interval: Option<Duration>,
    expected_attempts: Option<f64>,
}

impl SearchCoordinator {
    pub fn new(backend: Arc<dyn HashTrial>) -> Self {
        Self {
            backend,
            progress_interval: None,
            expected_attempts: None,
        }
    }

    /// Log progress every `interval` while a run is active
    pub fn with_progress(mut self, interval: Duration, expected_attempts: Option<f64>) -> Self {
        self.progress_interval = Some(interval);
        self.expected_attempts = expected_attempts;
        self
    }

    pub fn backend(&self) -> &dyn HashTrial {
        self.backend.as_ref()
    }

    fn validate(&self, config: &SearchConfig) -> Result<(), SearchError> {
        let kind = self.backend.kind();
        let max = kind.max_threads();
        if config.threads == 0 || config.threads > max {
            return Err(SearchError::InvalidThreads {
                requested: config.threads,
                max,
            });
        }
        if kind.needs_device() && config.device.is_none() {
            return Err(BackendError::DeviceRequired(kind).into());
        }
        Ok(())
    }

    /// Run the search (blocking until every worker has returned).
    ///
    /// The winner's side effects happen inside `on_accept` as soon as it
    /// claims the result; the remaining workers are cancelled and joined
    /// before the final statistics are taken.
    pub fn run_search(
        &self,
        config: &SearchConfig,
        on_accept: &dyn AcceptHandler,
    ) -> Result<SearchOutcome, SearchError> {
        self.validate(config)?;

        let state = RunState::new();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("pow-worker-{}", i))
            .build()?;

        debug!(
            "starting {} {} worker(s), boost factor {}",
            config.threads,
            self.backend.kind(),
            config.boost_factor
        );

        let results = thread::scope(|scope| {
            let (done_tx, done_rx) = bounded::<()>(0);
            if let Some(interval) = self.progress_interval {
                let state = &state;
                let expected = self.expected_attempts;
                scope.spawn(move || {
                    let ticker = tick(interval);
                    loop {
                        select! {
                            recv(ticker) -> _ => info!("{}", state.format_progress(expected)),
                            recv(done_rx) -> _ => break,
                        }
                    }
                });
            }

            let results = pool.install(|| {
                (0..config.threads)
                    .into_par_iter()
                    .with_max_len(1)
                    .map(|_| self.worker(config, &state, on_accept))
                    .collect::<Result<Vec<_>, SearchError>>()
            });
            drop(done_tx);
            results
        })?;

        let stats = state.snapshot();
        Ok(match results.into_iter().flatten().next() {
            Some(value) => SearchOutcome::Found { value, stats },
            None => SearchOutcome::Exhausted { stats },
        })
    }

    fn worker(
        &self,
        config: &SearchConfig,
        state: &RunState,
        on_accept: &dyn AcceptHandler,
    ) -> Result<Option<Vec<u8>>, SearchError> {
        let found = match self.backend.try_search(config, &state.trial_context()) {
            Ok(found) => found,
            Err(e) => {
                state.request_cancel();
                return Err(e.into());
            }
        };

        let Some(value) = found else {
            return Ok(None);
        };

        if !state.try_accept() {
            debug!("discarding result found after another worker won");
            return Ok(None);
        }

        state.request_cancel();
        on_accept.accept(&value)?;
        Ok(Some(value))
    }
}
