// Structured logging setup
//
// Logs go to stderr so the interactive menu on stdout stays readable.
// RUST_LOG, when set, wins over the configured level.

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

pub fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level '{}'", level)),
    }
}

/// Install the global subscriber. Call once, from the binary.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = build_filter(level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {}", e))?;

    Ok(())
}
