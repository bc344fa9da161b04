//! Logging initialization for the CLI.
//!
//! Configures the `tracing` subscriber with level filtering via the
//! `PORTAL_LOG` environment variable. Falls back to the configured
//! `[logging] level` when the variable is unset or invalid.
//!
//! ```bash
//! PORTAL_LOG=debug portal-sections move 0 2
//! PORTAL_LOG=portal_sections::engine=trace,warn portal-sections show
//! ```

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogLevel;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "PORTAL_LOG";

/// Builds the filter from `PORTAL_LOG`, or `fallback` if that is unset or
/// does not parse.
pub fn filter(fallback: LogLevel) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback.as_str()))
}

/// Initialize the tracing subscriber, writing to stderr.
///
/// # Panics
///
/// Panics if a global subscriber has already been set (should only be
/// called once, at startup).
pub fn init(fallback: LogLevel) {
    fmt()
        .with_env_filter(filter(fallback))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
