//! Intra-unit thread orchestration
//!
//! A coarse unit owns one interval. [`run_unit`] splits that interval across
//! fine worker threads, each of which scans its own piece with the primality
//! oracle and pushes every prime it finds into the shared result store.
//!
//! # Lifecycle
//!
//! 1. **Partition**: the unit interval is cut into `threads` pieces
//! 2. **Launch**: one named OS thread per piece, scoped to the call so the
//!    store can be borrowed
//! 3. **Join**: every launched worker is joined before returning, even when
//!    one of them failed
//!
//! Any worker failure (creation, panic, or a rejected push) fails the whole
//! unit. Nothing is retried and the unit never continues with fewer workers.
//!
//! # Example
//!
//! ```
//! use primesplit::partition::IntervalAssignment;
//! use primesplit::store::{ResultSink, SharedResultStore};
//! use primesplit::worker::{run_unit, UnitOptions};
//!
//! let store = SharedResultStore::with_capacity(64);
//! let unit = IntervalAssignment::new(2, 30, 1);
//!
//! let report = run_unit(unit, 3, &store, &UnitOptions::default())?;
//! assert_eq!(report.primes_found(), 10);
//! assert_eq!(store.len()?, 10);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::oracle::{self, PrimalityTest};
use crate::output::text;
use crate::partition::{partition, IntervalAssignment};
use crate::store::{ResultSink, StoreError};
use std::thread;
use thiserror::Error;

/// Errors that fail a coarse unit
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("unit {unit}: failed to spawn worker {unit}.{worker}")]
    Spawn {
        unit: usize,
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("unit {unit}: worker {unit}.{worker} panicked")]
    Panicked { unit: usize, worker: usize },

    #[error("unit {unit}: worker {unit}.{worker} could not store a prime")]
    Store {
        unit: usize,
        worker: usize,
        #[source]
        source: StoreError,
    },
}

/// Per-unit execution options
#[derive(Debug, Clone, Copy)]
pub struct UnitOptions {
    /// Primality predicate applied to every scanned value
    pub oracle: PrimalityTest,
    /// Print unit and worker progress lines to stdout
    pub progress: bool,
}

impl Default for UnitOptions {
    fn default() -> Self {
        Self {
            oracle: oracle::is_prime,
            progress: false,
        }
    }
}

/// Result of one fine worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    /// Piece of the unit interval scanned by this worker
    pub assignment: IntervalAssignment,
    /// Number of primes pushed into the store
    pub primes_found: u64,
}

/// Result of one coarse unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub assignment: IntervalAssignment,
    /// Worker reports in worker index order
    pub workers: Vec<WorkerReport>,
}

impl UnitReport {
    /// Primes pushed by all workers of this unit
    pub fn primes_found(&self) -> u64 {
        self.workers.iter().map(|w| w.primes_found).sum()
    }
}

/// Scan `assignment` and push every value accepted by `oracle`
///
/// Returns the number of values pushed. Stops at the first rejected push.
pub fn scan<S>(
    assignment: &IntervalAssignment,
    oracle: PrimalityTest,
    sink: &S,
) -> Result<u64, StoreError>
where
    S: ResultSink + ?Sized,
{
    let mut found = 0;
    for value in assignment.values() {
        if oracle(value) {
            sink.push(value)?;
            found += 1;
        }
    }
    Ok(found)
}

/// Run one coarse unit: partition, launch `threads` workers, join them all
pub fn run_unit<S>(
    assignment: IntervalAssignment,
    threads: usize,
    sink: &S,
    options: &UnitOptions,
) -> Result<UnitReport, UnitError>
where
    S: ResultSink + ?Sized,
{
    let unit = assignment.index;
    if options.progress {
        text::print_unit_started(&assignment);
    }
    tracing::debug!(
        unit,
        start = assignment.start,
        end = assignment.end,
        threads,
        "unit started"
    );

    let pieces = partition(assignment.start, assignment.end, threads);

    let results: Vec<Result<WorkerReport, UnitError>> = thread::scope(|s| {
        let mut handles = Vec::with_capacity(pieces.len());
        let mut spawn_error = None;

        for &piece in &pieces {
            let spawned = thread::Builder::new()
                .name(format!("worker-{}.{}", unit, piece.index))
                .spawn_scoped(s, move || run_worker(unit, piece, sink, options));

            match spawned {
                Ok(handle) => handles.push((piece.index, handle)),
                Err(source) => {
                    spawn_error = Some(UnitError::Spawn {
                        unit,
                        worker: piece.index,
                        source,
                    });
                    break;
                }
            }
        }

        // Join everything that started before surfacing a spawn failure
        let mut results: Vec<_> = handles
            .into_iter()
            .map(|(worker, handle)| {
                handle
                    .join()
                    .unwrap_or(Err(UnitError::Panicked { unit, worker }))
            })
            .collect();
        if let Some(err) = spawn_error {
            results.push(Err(err));
        }
        results
    });

    let mut workers = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(report) => workers.push(report),
            Err(err) => {
                tracing::error!(unit, error = %err, "worker failed");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    let report = UnitReport {
        assignment,
        workers,
    };
    tracing::debug!(unit, primes_found = report.primes_found(), "unit done");
    if options.progress {
        text::print_unit_done(unit);
    }

    Ok(report)
}

fn run_worker<S>(
    unit: usize,
    piece: IntervalAssignment,
    sink: &S,
    options: &UnitOptions,
) -> Result<WorkerReport, UnitError>
where
    S: ResultSink + ?Sized,
{
    if options.progress {
        text::print_worker_started(unit, &piece);
    }

    let primes_found = scan(&piece, options.oracle, sink).map_err(|source| UnitError::Store {
        unit,
        worker: piece.index,
        source,
    })?;

    tracing::debug!(
        unit,
        worker = piece.index,
        start = piece.start,
        end = piece.end,
        primes_found,
        "worker done"
    );

    Ok(WorkerReport {
        assignment: piece,
        primes_found,
    })
}
