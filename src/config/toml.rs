//! TOML configuration file parsing

use super::*;
use crate::config::cli::{Cli, Format as CliFormat, Isolation as CliIsolation};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Build configuration from CLI arguments alone
pub fn config_from_cli(cli: &Cli) -> Result<Config> {
    let (Some(start), Some(end), Some(units), Some(threads)) =
        (cli.range_start, cli.range_end, cli.units, cli.threads_per_unit)
    else {
        anyhow::bail!("RANGE_START, RANGE_END, UNITS and THREADS_PER_UNIT are required");
    };

    merge_cli_with_config(cli, Config::new(start, end, units, threads))
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    // Override search parameters
    if let Some(start) = cli.range_start {
        config.search.range_start = start;
    }
    if let Some(end) = cli.range_end {
        config.search.range_end = end;
    }
    if let Some(units) = cli.units {
        config.search.units = units;
    }
    if let Some(threads) = cli.threads_per_unit {
        config.search.threads_per_unit = threads;
    }

    // Override store and runtime
    if let Some(capacity) = cli.capacity {
        config.store.capacity = capacity;
    }
    if let Some(isolation) = cli.isolation {
        config.runtime.isolation = match isolation {
            CliIsolation::Thread => IsolationMode::Thread,
            CliIsolation::Process => IsolationMode::Process,
        };
    }
    if cli.debug {
        config.runtime.debug = true;
    }

    // Override output
    if let Some(format) = cli.format {
        config.output.format = match format {
            CliFormat::Text => OutputFormat::Text,
            CliFormat::Json => OutputFormat::Json,
        };
    }
    if let Some(path) = &cli.json_output {
        config.output.json_output = Some(path.clone());
        config.output.format = OutputFormat::Json;
    }
    if cli.pretty {
        config.output.pretty = true;
    }
    if cli.no_progress {
        config.output.progress = false;
    }
    if cli.sorted {
        config.output.sorted = true;
    }

    Ok(config)
}

/// Load the configuration described by the command line
///
/// Reads `--config` when given, then applies command-line overrides.
pub fn load(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => {
            let config = parse_toml_file(path)?;
            merge_cli_with_config(cli, config)
        }
        None => config_from_cli(cli),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    const FULL: &str = r#"
[search]
range_start = 2
range_end = 50
units = 2
threads_per_unit = 3

[store]
capacity = 32

[runtime]
isolation = "process"

[output]
format = "json"
progress = false
sorted = true
"#;

    #[test]
    fn test_parse_full() {
        let config = parse_toml_string(FULL).unwrap();
        assert_eq!(config.search.range_start, 2);
        assert_eq!(config.search.range_end, 50);
        assert_eq!(config.search.units, 2);
        assert_eq!(config.search.threads_per_unit, 3);
        assert_eq!(config.store.capacity, 32);
        assert_eq!(config.runtime.isolation, IsolationMode::Process);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(!config.output.progress);
        assert!(config.output.sorted);
    }

    #[test]
    fn test_parse_minimal_uses_defaults() {
        let config = parse_toml_string(
            "[search]\nrange_start = 7\nrange_end = 7\nunits = 1\nthreads_per_unit = 1\n",
        )
        .unwrap();
        assert_eq!(config, Config::new(7, 7, 1, 1));
    }

    #[test]
    fn test_parse_missing_search_fails() {
        assert!(parse_toml_string("[store]\ncapacity = 4\n").is_err());
    }

    #[test]
    fn test_unknown_isolation_fails() {
        let toml = "[search]\nrange_start = 1\nrange_end = 2\nunits = 1\nthreads_per_unit = 1\n\
                    [runtime]\nisolation = \"fiber\"\n";
        assert!(parse_toml_string(toml).is_err());
    }

    #[test]
    fn test_parse_file_and_merge() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let path = file.path().to_str().unwrap();
        let cli = Cli::try_parse_from([
            "primesplit", "10", "20", "--config", path, "--isolation", "thread", "--capacity", "8",
        ])
        .unwrap();

        let config = load(&cli).unwrap();
        assert_eq!(config.search.range_start, 10);
        assert_eq!(config.search.range_end, 20);
        assert_eq!(config.search.units, 2);
        assert_eq!(config.search.threads_per_unit, 3);
        assert_eq!(config.store.capacity, 8);
        assert_eq!(config.runtime.isolation, IsolationMode::Thread);
        assert!(config.output.sorted);
    }

    #[test]
    fn test_missing_file() {
        assert!(parse_toml_file(Path::new("/nonexistent/primesplit.toml")).is_err());
    }

    #[test]
    fn test_config_from_cli() {
        let cli = Cli::try_parse_from(["primesplit", "2", "50", "2", "2", "--no-progress"]).unwrap();
        let config = load(&cli).unwrap();
        assert_eq!(config, Config::new(2, 50, 2, 2).with_progress(false));
    }

    #[test]
    fn test_json_output_implies_json_format() {
        let cli = Cli::try_parse_from(["primesplit", "1", "9", "1", "1", "--json-output", "r.json"])
            .unwrap();
        let config = load(&cli).unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.json_output, Some(PathBuf::from("r.json")));
    }
}
