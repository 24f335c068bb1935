//! Result output
//!
//! Text output prints the final prime list after the progress lines; JSON
//! output serialises the whole [`SearchReport`] to stdout or a file.

pub mod json;
pub mod text;

use crate::config::{OutputConfig, OutputFormat};
use crate::report::SearchReport;
use crate::Result;

/// Emit `report` in the configured format
pub fn emit(report: &SearchReport, output: &OutputConfig) -> Result<()> {
    match output.format {
        OutputFormat::Text => {
            text::print_results(report, output.sorted);
        }
        OutputFormat::Json => match &output.json_output {
            Some(path) => {
                json::write_json_output(path, report, output.pretty)?;
                text::print_results(report, output.sorted);
                println!("JSON report written to {}", path.display());
            }
            None => {
                println!("{}", json::to_json_string(report, output.pretty)?);
            }
        },
    }

    Ok(())
}
