//! Coordinator module
//!
//! Splits the full interval across coarse units, launches them, waits for
//! every one of them to terminate, and turns the quiescent result store into a
//! [`SearchReport`].
//!
//! # Isolation
//!
//! - [`IsolationMode::Thread`]: each unit is a named thread and the store is an
//!   in-process [`SharedResultStore`]. Units report completion over a
//!   completion channel; the coordinator counts down one message per unit.
//! - [`IsolationMode::Process`] (unix): each unit is a forked child writing
//!   into a [`SharedMemoryStore`](crate::store::shm::SharedMemoryStore). The
//!   coordinator waits on every child pid. See [`process`].
//!
//! # Failure
//!
//! A failed unit never cancels its siblings. Once all units are accounted for,
//! any failure aborts the run with [`SearchError::UnitsFailed`] and no results
//! are reported.
//!
//! # Example
//!
//! ```
//! use primesplit::config::Config;
//! use primesplit::coordinator::Coordinator;
//!
//! let config = Config::new(2, 50, 2, 2).with_progress(false);
//! let report = Coordinator::new(config).run()?;
//! assert_eq!(report.sorted_primes(), vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(unix)]
pub mod process;

use crate::config::{Config, IsolationMode};
use crate::oracle::{self, PrimalityTest};
use crate::output::text;
use crate::partition::{partition, IntervalAssignment};
use crate::report::{self, SearchReport, UnitOutcome};
use crate::store::{ResultSink, SharedResultStore, StoreError};
use crate::worker::{self, UnitOptions};
use chrono::{DateTime, Utc};
use crossbeam::channel::{self, Receiver};
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Instant;
use thiserror::Error;

/// Errors that abort a search
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("result store error")]
    Store(#[from] StoreError),

    #[error("coordinator already ran (state {state:?})")]
    AlreadyRun { state: CoordinatorState },

    #[error("failed to launch unit {unit}")]
    SpawnUnit {
        unit: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for unit {unit} (pid {pid})")]
    Wait {
        unit: usize,
        pid: i32,
        #[source]
        source: std::io::Error,
    },

    #[error("lost completion signal from {pending} unit(s)")]
    LostUnits { pending: usize },

    #[error("{} of {total} unit(s) failed: {}", failed_count(.failed), describe_failures(.failed))]
    UnitsFailed {
        total: usize,
        failed: Vec<UnitOutcome>,
    },

    #[error("process isolation is not supported on this platform")]
    Unsupported,
}

fn failed_count(failed: &[UnitOutcome]) -> usize {
    failed.len()
}

fn describe_failures(failed: &[UnitOutcome]) -> String {
    failed
        .iter()
        .map(|outcome| outcome.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Coordinator lifecycle
///
/// `Initializing → Partitioned → Spawned → Waiting → Aggregating → Done`.
/// `pending` only decreases while waiting; there are no back-transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Initializing,
    Partitioned,
    Spawned,
    Waiting { pending: usize },
    Aggregating,
    Done,
}

impl CoordinatorState {
    fn rank(&self) -> u8 {
        match self {
            CoordinatorState::Initializing => 0,
            CoordinatorState::Partitioned => 1,
            CoordinatorState::Spawned => 2,
            CoordinatorState::Waiting { .. } => 3,
            CoordinatorState::Aggregating => 4,
            CoordinatorState::Done => 5,
        }
    }

    /// Whether moving from `self` to `next` is a forward transition
    pub fn can_advance_to(&self, next: &CoordinatorState) -> bool {
        match (self, next) {
            (
                CoordinatorState::Waiting { pending: current },
                CoordinatorState::Waiting { pending: next },
            ) => next < current,
            (CoordinatorState::Waiting { pending }, CoordinatorState::Aggregating) => *pending == 0,
            (_, CoordinatorState::Aggregating) => false,
            _ => next.rank() > self.rank(),
        }
    }
}

/// Top-level search coordinator
#[derive(Debug)]
pub struct Coordinator {
    config: Config,
    oracle: PrimalityTest,
    state: CoordinatorState,
}

impl Coordinator {
    /// Create a coordinator for a validated configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            oracle: oracle::is_prime,
            state: CoordinatorState::Initializing,
        }
    }

    /// Replace the primality oracle
    pub fn with_oracle(mut self, oracle: PrimalityTest) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    fn transition(&mut self, next: CoordinatorState) {
        debug_assert!(
            self.state.can_advance_to(&next),
            "invalid coordinator transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!(from = ?self.state, to = ?next, "coordinator state");
        self.state = next;
    }

    fn unit_options(&self) -> UnitOptions {
        UnitOptions {
            oracle: self.oracle,
            progress: self.config.output.progress_enabled(),
        }
    }

    /// Run the search to completion
    ///
    /// A coordinator runs once; calling `run` again fails with
    /// [`SearchError::AlreadyRun`]. In process isolation the caller must be
    /// the only thread of the process, since every unit is forked from it.
    pub fn run(&mut self) -> Result<SearchReport, SearchError> {
        if self.state != CoordinatorState::Initializing {
            return Err(SearchError::AlreadyRun { state: self.state });
        }

        let started_at = Utc::now();
        let clock = Instant::now();
        let search = self.config.search.clone();

        if self.config.output.progress_enabled() {
            text::print_coordinator_started();
        }
        tracing::debug!(
            range_start = search.range_start,
            range_end = search.range_end,
            units = search.units,
            threads_per_unit = search.threads_per_unit,
            isolation = %self.config.runtime.isolation,
            "search started"
        );

        let assignments = partition(search.range_start, search.range_end, search.units);
        self.transition(CoordinatorState::Partitioned);

        let capacity = self.config.store.capacity;
        match self.config.runtime.isolation {
            IsolationMode::Thread => {
                let store = SharedResultStore::with_capacity(capacity);
                let outcomes = self.run_thread_units(&assignments, &store)?;
                self.aggregate(&store, outcomes, started_at, clock)
            }
            #[cfg(unix)]
            IsolationMode::Process => {
                let store = crate::store::shm::SharedMemoryStore::with_capacity(capacity)?;
                let outcomes = self.run_process_units(&assignments, &store)?;
                self.aggregate(&store, outcomes, started_at, clock)
            }
            #[cfg(not(unix))]
            IsolationMode::Process => Err(SearchError::Unsupported),
        }
    }

    /// Launch one thread per unit and count down their completion messages
    fn run_thread_units(
        &mut self,
        assignments: &[IntervalAssignment],
        store: &SharedResultStore,
    ) -> Result<Vec<UnitOutcome>, SearchError> {
        let threads = self.config.search.threads_per_unit;
        let options = self.unit_options();
        let (tx, rx) = channel::unbounded::<UnitOutcome>();

        thread::scope(|s| {
            let mut launched = 0;
            let mut spawn_error = None;

            for &assignment in assignments {
                let tx = tx.clone();
                let options = &options;
                let spawned = thread::Builder::new()
                    .name(format!("unit-{}", assignment.index))
                    .spawn_scoped(s, move || {
                        let outcome = run_thread_unit(assignment, threads, store, options);
                        // The coordinator only stops listening after an error of its own
                        let _ = tx.send(outcome);
                    });

                match spawned {
                    Ok(_) => launched += 1,
                    Err(source) => {
                        spawn_error = Some(SearchError::SpawnUnit {
                            unit: assignment.index,
                            source,
                        });
                        break;
                    }
                }
            }
            drop(tx);
            self.transition(CoordinatorState::Spawned);

            let outcomes = self.collect_outcomes(&rx, launched)?;
            match spawn_error {
                Some(err) => Err(err),
                None => Ok(outcomes),
            }
        })
    }

    /// Receive exactly `launched` outcomes
    fn collect_outcomes(
        &mut self,
        rx: &Receiver<UnitOutcome>,
        launched: usize,
    ) -> Result<Vec<UnitOutcome>, SearchError> {
        let mut outcomes = Vec::with_capacity(launched);
        let mut pending = launched;
        self.transition(CoordinatorState::Waiting { pending });

        while pending > 0 {
            let outcome = rx
                .recv()
                .map_err(|_| SearchError::LostUnits { pending })?;
            log_outcome(&outcome);
            outcomes.push(outcome);
            pending -= 1;
            self.transition(CoordinatorState::Waiting { pending });
        }

        Ok(outcomes)
    }

    /// Check unit outcomes and read the quiescent store
    fn aggregate<S>(
        &mut self,
        store: &S,
        mut outcomes: Vec<UnitOutcome>,
        started_at: DateTime<Utc>,
        clock: Instant,
    ) -> Result<SearchReport, SearchError>
    where
        S: ResultSink + ?Sized,
    {
        outcomes.sort_by_key(|outcome| outcome.assignment.index);

        let failed: Vec<UnitOutcome> = outcomes
            .iter()
            .filter(|outcome| outcome.status.is_failed())
            .cloned()
            .collect();
        if !failed.is_empty() {
            return Err(SearchError::UnitsFailed {
                total: outcomes.len(),
                failed,
            });
        }

        self.transition(CoordinatorState::Aggregating);
        let primes = store.snapshot()?;
        self.transition(CoordinatorState::Done);

        let search = &self.config.search;
        let report = SearchReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            host: report::local_host(),
            started_at,
            elapsed_secs: clock.elapsed().as_secs_f64(),
            range_start: search.range_start,
            range_end: search.range_end,
            units: search.units,
            threads_per_unit: search.threads_per_unit,
            isolation: self.config.runtime.isolation,
            capacity: store.capacity(),
            primes,
            unit_outcomes: outcomes,
        };
        tracing::debug!(
            count = report.count(),
            elapsed_secs = report.elapsed_secs,
            "search done"
        );

        Ok(report)
    }
}

/// Body of a thread unit; never unwinds
fn run_thread_unit(
    assignment: IntervalAssignment,
    threads: usize,
    store: &SharedResultStore,
    options: &UnitOptions,
) -> UnitOutcome {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        worker::run_unit(assignment, threads, store, options)
    }));

    match result {
        Ok(Ok(report)) => UnitOutcome::completed(assignment, Some(report.primes_found())),
        Ok(Err(err)) => UnitOutcome::failed(assignment, error_chain(&err)),
        Err(_) => UnitOutcome::failed(assignment, "unit panicked"),
    }
}

/// `err` followed by each of its sources, separated by `: `
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn log_outcome(outcome: &UnitOutcome) {
    if outcome.status.is_failed() {
        tracing::error!(unit = outcome.assignment.index, "{}", outcome);
    } else {
        tracing::debug!(unit = outcome.assignment.index, "{}", outcome);
    }
}
