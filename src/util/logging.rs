//! Diagnostic logging
//!
//! Diagnostics go to stderr through `tracing`; stdout is reserved for
//! progress lines and results.

use tracing::Level;

/// Level used for a given `--debug` setting
pub fn max_level(debug: bool) -> Level {
    if debug {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

/// Install the global stderr subscriber
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init(debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(max_level(debug))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(debug)
        .try_init();
}
