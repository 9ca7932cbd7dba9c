//! Logging setup for the throttle binary

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FORMAT_ENV: &str = "THROTTLE_LOG_FORMAT";
const DEFAULT_FILTER: &str = "throttle_core=info,throttle_cli=info";

/// Install the global tracing subscriber
///
/// # Environment Variables
///
/// - `THROTTLE_LOG_FORMAT`: `json` for structured output, anything else for pretty (default)
/// - `RUST_LOG`: filter directives (default: throttle_core=info,throttle_cli=info)
///
/// Logs go to stderr so `--json` output on stdout stays machine-readable.
pub fn init_logging() -> Result<()> {
    let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}
