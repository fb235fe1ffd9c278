use anyhow::{Context, Result};
use tracing_subscriber::{
    fmt::{self, time::SystemTime},
    prelude::*,
    EnvFilter,
};

/// Installs the global subscriber. Logs go to stderr so that stdout stays a
/// clean stream of metric lines for whoever is scraping it.
pub fn setup_logging(verbose: bool) -> Result<()> {
    let filter = EnvFilter::new(if verbose { "debug" } else { "warn" });

    let stderr_layer = fmt::layer()
        .with_target(verbose)
        .with_level(true)
        .with_timer(SystemTime)
        .with_writer(std::io::stderr);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    tracing::debug!("Logging system initialized");

    Ok(())
}
