//! End-to-end searches through the library and the CLI binary

use primesplit::config::{self, Config};
use primesplit::coordinator::{Coordinator, SearchError};
use primesplit::partition::partition;
use std::collections::BTreeSet;
use std::io::Write;
use std::process::Command;

const PRIMES_BELOW_50: [i64; 15] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47];

fn primesplit() -> Command {
    Command::new(env!("CARGO_BIN_EXE_primesplit"))
}

fn stdout_of(args: &[&str]) -> String {
    let output = primesplit().args(args).output().unwrap();
    assert!(
        output.status.success(),
        "primesplit {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn primes_in_result_line(stdout: &str) -> BTreeSet<i64> {
    let line = stdout
        .lines()
        .find(|l| l.starts_with("Coordinator: Done."))
        .expect("missing result line");
    match line.strip_prefix("Coordinator: Done. Prime numbers are: ") {
        Some(list) => list.split(", ").map(|v| v.parse().unwrap()).collect(),
        None => BTreeSet::new(),
    }
}

#[test]
fn test_library_matches_sequential_scan() {
    for (start, end, units, threads) in [(2, 50, 2, 2), (1, 500, 3, 4), (-50, 50, 5, 1), (90, 97, 4, 4)] {
        let config = Config::new(start, end, units, threads).with_progress(false);
        let report = Coordinator::new(config).run().unwrap();

        let found: BTreeSet<i64> = report.primes.iter().copied().collect();
        let expected: BTreeSet<i64> = (start..=end).filter(|&n| primesplit::oracle::is_prime(n)).collect();
        assert_eq!(found, expected, "[{}, {}] {}x{}", start, end, units, threads);
        assert_eq!(report.primes.len(), expected.len(), "duplicate results");
    }
}

#[test]
fn test_unit_assignments_match_partition() {
    let report = Coordinator::new(Config::new(0, 103, 4, 2).with_progress(false))
        .run()
        .unwrap();
    let assignments: Vec<_> = report.unit_outcomes.iter().map(|o| o.assignment).collect();
    assert_eq!(assignments, partition(0, 103, 4));
}

#[test]
fn test_capacity_exceeded_is_an_error() {
    let config = Config::new(1, 10_000, 4, 4).with_progress(false);
    let err = Coordinator::new(config).run().unwrap_err();
    assert!(matches!(err, SearchError::UnitsFailed { .. }));
}

#[test]
fn test_cli_text_output() {
    let stdout = stdout_of(&["2", "50", "2", "2"]);

    assert!(stdout.starts_with("Coordinator: Started.\n"));
    assert!(stdout.contains("Unit 1: Started. Interval 2-25"));
    assert!(stdout.contains("Unit 2: Started. Interval 26-50"));
    assert!(stdout.contains("Worker 1.1: searching in 2-13"));
    assert!(stdout.contains("Worker 2.2: searching in 38-50"));
    assert!(stdout.contains("Unit 1: Done."));
    assert!(stdout.contains("Unit 2: Done."));
    assert_eq!(primes_in_result_line(&stdout), PRIMES_BELOW_50.into_iter().collect::<BTreeSet<i64>>());
}

#[test]
fn test_cli_sorted_without_progress() {
    let stdout = stdout_of(&["2", "30", "3", "2", "--no-progress", "--sorted"]);
    assert_eq!(
        stdout,
        "Coordinator: Done. Prime numbers are: 2, 3, 5, 7, 11, 13, 17, 19, 23, 29\n"
    );
}

#[test]
fn test_cli_no_primes() {
    let stdout = stdout_of(&["24", "24", "1", "1", "--no-progress"]);
    assert_eq!(stdout, "Coordinator: Done. No prime numbers found.\n");
}

#[cfg(unix)]
#[test]
fn test_cli_process_isolation() {
    let stdout = stdout_of(&["2", "50", "2", "2", "--isolation", "process"]);
    assert!(stdout.contains("Unit 1: Done."));
    assert!(stdout.contains("Unit 2: Done."));
    assert_eq!(primes_in_result_line(&stdout), PRIMES_BELOW_50.into_iter().collect::<BTreeSet<i64>>());
}

#[test]
fn test_cli_json_output() {
    let stdout = stdout_of(&["7", "7", "1", "1", "--format", "json"]);
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(value["primes"], serde_json::json!([7]));
    assert_eq!(value["unit_outcomes"][0]["status"], "completed");
}

#[test]
fn test_cli_rejects_zero_units() {
    let output = primesplit().args(["2", "50", "0", "2"]).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("UNITS must be at least 1"));
}

#[test]
fn test_cli_overflow_prints_no_results() {
    let output = primesplit()
        .args(["2", "50", "2", "2", "--capacity", "4"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Coordinator: Done."));
    assert!(String::from_utf8_lossy(&output.stderr).contains("capacity 4"));
}

#[test]
fn test_cli_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[search]\nrange_start = 10\nrange_end = 20\nunits = 2\nthreads_per_unit = 2\n\n\
         [output]\nprogress = false\nsorted = true"
    )
    .unwrap();

    let path = file.path().to_str().unwrap();
    let stdout = stdout_of(&["--config", path]);
    assert_eq!(stdout, "Coordinator: Done. Prime numbers are: 11, 13, 17, 19\n");

    let loaded = config::toml::parse_toml_file(file.path()).unwrap();
    assert_eq!(loaded.search.units, 2);
}
