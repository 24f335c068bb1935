//! primesplit - two-level parallel prime search
//!
//! primesplit scans an inclusive integer interval for primes with two nested
//! layers of parallelism: coarse units (threads, or forked processes) each own
//! one slice of the interval and split it further across fine worker threads.
//! Every worker pushes into one shared, fixed-capacity result store that the
//! coordinator reads once all units have terminated.
//!
//! # Architecture
//!
//! - **Oracle**: swappable primality predicate ([`oracle`])
//! - **Partitioner**: gap-free, overlap-free interval splitting ([`partition`])
//! - **Result store**: mutex-guarded or shared-memory backed ([`store`])
//! - **Unit orchestration**: fine workers inside one unit ([`worker`])
//! - **Coordinator**: coarse units, completion, failure ([`coordinator`])

pub mod config;
pub mod coordinator;
pub mod oracle;
pub mod output;
pub mod partition;
pub mod report;
pub mod store;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{Coordinator, SearchError};
pub use report::SearchReport;
pub use store::{ResultSink, SharedResultStore};

/// Result type used throughout primesplit
pub type Result<T> = anyhow::Result<T>;
