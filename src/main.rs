//! primesplit CLI entry point

use anyhow::{Context, Result};
use primesplit::config::{self, cli::Cli};
use primesplit::coordinator::Coordinator;
use primesplit::util::logging;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();
    cli.validate()?;

    let config = config::toml::load(&cli)?;
    logging::init(config.runtime.debug);

    // Validate configuration
    config::validator::validate_config(&config)
        .context("Configuration validation failed")?;

    let output = config.output.clone();
    let mut coordinator = Coordinator::new(config);
    let report = coordinator.run().context("Search failed")?;

    primesplit::output::emit(&report, &output)?;

    Ok(())
}
