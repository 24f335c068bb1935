//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.

pub mod cli;
pub mod toml;
pub mod validator;

use crate::store::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Complete search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Configuration for scanning `[range_start, range_end]` with defaults elsewhere
    pub fn new(range_start: i64, range_end: i64, units: usize, threads_per_unit: usize) -> Self {
        Self {
            search: SearchConfig {
                range_start,
                range_end,
                units,
                threads_per_unit,
            },
            store: StoreConfig::default(),
            runtime: RuntimeConfig::default(),
            output: OutputConfig::default(),
        }
    }

    pub fn with_isolation(mut self, isolation: IsolationMode) -> Self {
        self.runtime.isolation = isolation;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.store.capacity = capacity;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.output.progress = progress;
        self
    }
}

/// Interval and parallelism of one search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// First value of the inclusive interval
    pub range_start: i64,
    /// Last value of the inclusive interval
    pub range_end: i64,
    /// Number of coarse units
    pub units: usize,
    /// Number of fine workers inside each unit
    pub threads_per_unit: usize,
}

impl SearchConfig {
    /// Number of values in the interval, 0 if inverted
    pub fn interval_len(&self) -> u128 {
        (self.range_end as i128 - self.range_start as i128 + 1).max(0) as u128
    }
}

/// Result store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of primes the store accepts
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// How coarse units are isolated from each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationMode {
    /// Coarse units are threads of the coordinator process
    #[default]
    Thread,
    /// Coarse units are forked child processes sharing a memory mapping
    Process,
}

impl fmt::Display for IsolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsolationMode::Thread => write!(f, "thread"),
            IsolationMode::Process => write!(f, "process"),
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub isolation: IsolationMode,
    /// Debug-level diagnostics on stderr
    #[serde(default)]
    pub debug: bool,
}

/// Result output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Print unit and worker progress lines
    #[serde(default = "default_progress")]
    pub progress: bool,
    /// Print primes in numeric order instead of arrival order
    #[serde(default)]
    pub sorted: bool,
    /// Pretty-print JSON
    #[serde(default)]
    pub pretty: bool,
    /// Write the JSON report to this file instead of stdout
    pub json_output: Option<PathBuf>,
}

fn default_progress() -> bool {
    true
}

impl OutputConfig {
    /// Whether progress lines may go to stdout
    ///
    /// JSON written to stdout must not be mixed with progress lines.
    pub fn progress_enabled(&self) -> bool {
        self.progress && !(self.format == OutputFormat::Json && self.json_output.is_none())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            progress: default_progress(),
            sorted: false,
            pretty: false,
            json_output: None,
        }
    }
}
