//! Configuration validation

use super::*;
use anyhow::Result;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_search(&config.search)?;
    validate_store(&config.store)?;
    validate_runtime(&config.runtime)?;
    validate_output(&config.output)?;

    warn_degenerate_partition(&config.search);

    Ok(())
}

/// Validate interval and parallelism
pub fn validate_search(search: &SearchConfig) -> Result<()> {
    if search.units == 0 {
        anyhow::bail!("units must be at least 1");
    }

    if search.threads_per_unit == 0 {
        anyhow::bail!("threads_per_unit must be at least 1");
    }

    if search.range_start > search.range_end {
        anyhow::bail!(
            "range_start ({}) must not exceed range_end ({})",
            search.range_start,
            search.range_end
        );
    }

    // Assignment lengths are reported as u64
    if search.interval_len() > u64::MAX as u128 {
        anyhow::bail!(
            "interval [{}, {}] is too large",
            search.range_start,
            search.range_end
        );
    }

    Ok(())
}

/// Validate result store configuration
pub fn validate_store(store: &StoreConfig) -> Result<()> {
    if store.capacity == 0 {
        anyhow::bail!("store capacity must be at least 1");
    }

    Ok(())
}

/// Validate runtime configuration
pub fn validate_runtime(runtime: &RuntimeConfig) -> Result<()> {
    if runtime.isolation == IsolationMode::Process && !cfg!(unix) {
        anyhow::bail!("process isolation is only supported on unix platforms");
    }

    Ok(())
}

/// Validate output configuration
pub fn validate_output(output: &OutputConfig) -> Result<()> {
    if output.json_output.is_some() && output.format != OutputFormat::Json {
        anyhow::bail!("json_output requires output format json");
    }

    Ok(())
}

/// Log when some units or workers would receive an empty interval
///
/// Empty assignments are tolerated: they scan nothing.
fn warn_degenerate_partition(search: &SearchConfig) {
    let len = search.interval_len();
    let units = search.units as u128;
    let workers = units * search.threads_per_unit as u128;

    if units > len {
        tracing::warn!(
            units = search.units,
            interval_len = %len,
            "more units than values in the interval; some units will be idle"
        );
    } else if workers > len {
        tracing::warn!(
            workers = %workers,
            interval_len = %len,
            "more workers than values in the interval; some workers will be idle"
        );
    }

    let cores = num_cpus::get() as u128;
    if workers > cores * 4 {
        tracing::debug!(
            workers = %workers,
            cores = %cores,
            "worker count well above available cores"
        );
    }
}
