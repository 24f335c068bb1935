//! JSON output formatting
//!
//! Serialises the [`SearchReport`] as-is: primes in store order, run
//! parameters, and one outcome per unit.

use crate::report::SearchReport;
use crate::Result;
use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Render `report` as a JSON string
pub fn to_json_string(report: &SearchReport, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    Ok(json)
}

/// Write `report` to `output_path`
pub fn write_json_output(output_path: &Path, report: &SearchReport, pretty: bool) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    if pretty {
        serde_json::to_writer_pretty(&mut writer, report)?;
    } else {
        serde_json::to_writer(&mut writer, report)?;
    }
    writer.write_all(b"\n")?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IsolationMode;
    use crate::partition::IntervalAssignment;
    use crate::report::UnitOutcome;

    fn report() -> SearchReport {
        SearchReport {
            version: "0.1.0".to_string(),
            host: "test".to_string(),
            started_at: chrono::Utc::now(),
            elapsed_secs: 0.5,
            range_start: 2,
            range_end: 10,
            units: 2,
            threads_per_unit: 1,
            isolation: IsolationMode::Process,
            capacity: 8,
            primes: vec![7, 2, 3, 5],
            unit_outcomes: vec![
                UnitOutcome::completed(IntervalAssignment::new(2, 5, 1), None),
                UnitOutcome::completed(IntervalAssignment::new(6, 10, 2), None),
            ],
        }
    }

    #[test]
    fn test_json_fields() {
        let json = to_json_string(&report(), false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["primes"], serde_json::json!([7, 2, 3, 5]));
        assert_eq!(value["isolation"], "process");
        assert_eq!(value["unit_outcomes"][1]["status"], "completed");
        assert_eq!(value["capacity"], 8);
    }

    #[test]
    fn test_write_json_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_json_output(&path, &report(), true).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: SearchReport = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.primes, vec![7, 2, 3, 5]);
        assert_eq!(parsed.unit_outcomes.len(), 2);
    }
}
