//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Coarse unit isolation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Isolation {
    /// Units are threads sharing the coordinator's memory (default)
    Thread,
    /// Units are forked processes sharing one memory mapping
    Process,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Progress lines and a comma-separated list of primes
    Text,
    /// Machine-readable search report
    Json,
}

/// primesplit - two-level parallel prime search
#[derive(Parser, Debug)]
#[command(name = "primesplit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// First value of the interval (inclusive)
    #[arg(value_name = "RANGE_START", allow_negative_numbers = true)]
    pub range_start: Option<i64>,

    /// Last value of the interval (inclusive)
    #[arg(value_name = "RANGE_END", allow_negative_numbers = true)]
    pub range_end: Option<i64>,

    /// Number of coarse units
    #[arg(value_name = "UNITS")]
    pub units: Option<usize>,

    /// Number of worker threads per unit
    #[arg(value_name = "THREADS_PER_UNIT")]
    pub threads_per_unit: Option<usize>,

    /// TOML configuration file (command-line values take precedence)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    // === Execution Options ===
    /// How coarse units are isolated from each other
    #[arg(long, value_enum)]
    pub isolation: Option<Isolation>,

    /// Maximum number of primes the result store accepts
    #[arg(long)]
    pub capacity: Option<usize>,

    // === Output Options ===
    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<Format>,

    /// Write the JSON report to a file
    #[arg(long, value_name = "FILE")]
    pub json_output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Suppress unit and worker progress lines
    #[arg(long)]
    pub no_progress: bool,

    /// Print primes in numeric order instead of arrival order
    #[arg(long)]
    pub sorted: bool,

    /// Enable debug diagnostics on stderr
    #[arg(long, env = "PRIMESPLIT_DEBUG")]
    pub debug: bool,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        let positionals = [
            self.range_start.is_some(),
            self.range_end.is_some(),
            self.units.is_some(),
            self.threads_per_unit.is_some(),
        ];

        // Without a config file, the four positionals carry the whole search
        if self.config.is_none() && positionals.iter().any(|given| !given) {
            anyhow::bail!(
                "RANGE_START, RANGE_END, UNITS and THREADS_PER_UNIT are required without --config"
            );
        }

        if self.units == Some(0) {
            anyhow::bail!("UNITS must be at least 1");
        }

        if self.threads_per_unit == Some(0) {
            anyhow::bail!("THREADS_PER_UNIT must be at least 1");
        }

        if let (Some(start), Some(end)) = (self.range_start, self.range_end) {
            if start > end {
                anyhow::bail!("RANGE_START ({}) must not exceed RANGE_END ({})", start, end);
            }
        }

        if self.capacity == Some(0) {
            anyhow::bail!("capacity must be at least 1");
        }

        if self.json_output.is_some() && self.format == Some(Format::Text) {
            anyhow::bail!("--json-output requires --format json");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["primesplit"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_positionals() {
        let cli = parse(&["2", "50", "2", "3"]);
        assert_eq!(cli.range_start, Some(2));
        assert_eq!(cli.range_end, Some(50));
        assert_eq!(cli.units, Some(2));
        assert_eq!(cli.threads_per_unit, Some(3));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_negative_range_start() {
        let cli = parse(&["-10", "10", "1", "1"]);
        assert_eq!(cli.range_start, Some(-10));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_missing_positionals_rejected() {
        let cli = parse(&["2", "50"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_missing_positionals_allowed_with_config() {
        let cli = parse(&["--config", "search.toml"]);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_zero_units_rejected() {
        assert!(parse(&["2", "50", "0", "2"]).validate().is_err());
        assert!(parse(&["2", "50", "2", "0"]).validate().is_err());
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(parse(&["50", "2", "1", "1"]).validate().is_err());
    }

    #[test]
    fn test_options() {
        let cli = parse(&[
            "1", "100", "4", "2", "--isolation", "process", "--capacity", "64", "--format",
            "json", "--pretty", "--no-progress", "--sorted",
        ]);
        assert_eq!(cli.isolation, Some(Isolation::Process));
        assert_eq!(cli.capacity, Some(64));
        assert_eq!(cli.format, Some(Format::Json));
        assert!(cli.pretty);
        assert!(cli.no_progress);
        assert!(cli.sorted);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_json_output_requires_json_format() {
        let cli = parse(&["1", "10", "1", "1", "--format", "text", "--json-output", "r.json"]);
        assert!(cli.validate().is_err());
    }
}
