//! Human-readable text output
//!
//! Progress lines are written as single `println!` calls so lines from
//! concurrent units and workers never interleave mid-line.

use crate::partition::IntervalAssignment;
use crate::report::SearchReport;

pub fn print_coordinator_started() {
    println!("Coordinator: Started.");
}

pub fn print_unit_started(unit: &IntervalAssignment) {
    println!("Unit {}: Started. Interval {}", unit.index, describe_interval(unit));
}

pub fn print_worker_started(unit: usize, worker: &IntervalAssignment) {
    println!(
        "Worker {}.{}: searching in {}",
        unit,
        worker.index,
        describe_interval(worker)
    );
}

pub fn print_unit_done(unit: usize) {
    println!("Unit {}: Done.", unit);
}

/// Print the final result line
pub fn print_results(report: &SearchReport, sorted: bool) {
    println!("{}", format_results(report, sorted));
}

/// Final result line for `report`
pub fn format_results(report: &SearchReport, sorted: bool) -> String {
    if report.primes.is_empty() {
        return "Coordinator: Done. No prime numbers found.".to_string();
    }

    let primes = if sorted {
        report.sorted_primes()
    } else {
        report.primes.clone()
    };
    format!("Coordinator: Done. Prime numbers are: {}", format_list(&primes))
}

/// Comma-separated list of values
pub fn format_list(values: &[i64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_interval(assignment: &IntervalAssignment) -> String {
    if assignment.is_empty() {
        "nothing (empty interval)".to_string()
    } else {
        assignment.to_string()
    }
}
