//! Search results
//!
//! A [`SearchReport`] is built once, after every unit has terminated and the
//! result store is quiescent. It carries the primes in store order together
//! with the run parameters and the outcome of every coarse unit.

use crate::config::IsolationMode;
use crate::partition::IntervalAssignment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a coarse unit terminated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UnitStatus {
    /// Every worker of the unit finished its scan
    ///
    /// `primes_found` is only known for thread units; a process unit reports
    /// nothing but its exit status.
    Completed { primes_found: Option<u64> },
    /// The unit terminated abnormally
    Failed { reason: String },
}

impl UnitStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, UnitStatus::Failed { .. })
    }
}

/// Termination record of one coarse unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOutcome {
    pub assignment: IntervalAssignment,
    #[serde(flatten)]
    pub status: UnitStatus,
}

impl UnitOutcome {
    pub fn completed(assignment: IntervalAssignment, primes_found: Option<u64>) -> Self {
        Self {
            assignment,
            status: UnitStatus::Completed { primes_found },
        }
    }

    pub fn failed(assignment: IntervalAssignment, reason: impl Into<String>) -> Self {
        Self {
            assignment,
            status: UnitStatus::Failed {
                reason: reason.into(),
            },
        }
    }
}

impl fmt::Display for UnitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            UnitStatus::Completed { .. } => {
                write!(f, "unit {} ({}) completed", self.assignment.index, self.assignment)
            }
            UnitStatus::Failed { reason } => {
                write!(f, "unit {} ({}): {}", self.assignment.index, self.assignment, reason)
            }
        }
    }
}

/// Final, quiescent view of one search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub version: String,
    pub host: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub range_start: i64,
    pub range_end: i64,
    pub units: usize,
    pub threads_per_unit: usize,
    pub isolation: IsolationMode,
    pub capacity: usize,
    /// Primes in the order they reached the store lock
    pub primes: Vec<i64>,
    /// One entry per coarse unit, in unit index order
    pub unit_outcomes: Vec<UnitOutcome>,
}

impl SearchReport {
    /// Number of primes found
    pub fn count(&self) -> usize {
        self.primes.len()
    }

    /// Primes in numeric order
    pub fn sorted_primes(&self) -> Vec<i64> {
        let mut primes = self.primes.clone();
        primes.sort_unstable();
        primes
    }
}

/// Name of the local host, or `"unknown"`
pub fn local_host() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(primes: Vec<i64>) -> SearchReport {
        SearchReport {
            version: "0.0.0".to_string(),
            host: "test".to_string(),
            started_at: Utc::now(),
            elapsed_secs: 0.0,
            range_start: 2,
            range_end: 50,
            units: 1,
            threads_per_unit: 1,
            isolation: IsolationMode::Thread,
            capacity: 16,
            primes,
            unit_outcomes: vec![UnitOutcome::completed(IntervalAssignment::new(2, 50, 1), Some(3))],
        }
    }

    #[test]
    fn test_sorted_primes_keeps_arrival_order() {
        let report = report(vec![29, 2, 13]);
        assert_eq!(report.sorted_primes(), vec![2, 13, 29]);
        assert_eq!(report.primes, vec![29, 2, 13]);
        assert_eq!(report.count(), 3);
    }

    #[test]
    fn test_outcome_display() {
        let ok = UnitOutcome::completed(IntervalAssignment::new(2, 25, 1), None);
        assert_eq!(ok.to_string(), "unit 1 (2-25) completed");

        let failed = UnitOutcome::failed(IntervalAssignment::new(26, 50, 2), "exited with status 1");
        assert_eq!(failed.to_string(), "unit 2 (26-50): exited with status 1");
        assert!(failed.status.is_failed());
        assert!(!ok.status.is_failed());
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let failed = UnitOutcome::failed(IntervalAssignment::new(1, 4, 2), "boom");
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["reason"], "boom");
        assert_eq!(value["assignment"]["index"], 2);
    }

    #[test]
    fn test_local_host_not_empty() {
        assert!(!local_host().is_empty());
    }
}
