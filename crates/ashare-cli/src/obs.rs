//! Logging setup.

use anyhow::{Context, Result};
use clap::ValueEnum;

/// Environment variable holding the log filter.
pub(crate) const ENV_LOG: &str = "ASHARE_LOG";

/// Log line format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Installs the global subscriber. Logs go to stderr so stdout stays clean.
pub(crate) fn init_tracing(default_level: &str, format: LogFormat) -> Result<()> {
    let filter = std::env::var(ENV_LOG).unwrap_or_else(|_| default_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&filter)
        .with_context(|| format!("invalid log filter {filter:?}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}
