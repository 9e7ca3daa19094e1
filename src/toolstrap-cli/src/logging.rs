//! Log subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Build the filter: `RUST_LOG` when set and valid, otherwise `level`.
pub fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter_str()))
}

/// Install the global subscriber.
///
/// Logs go to stderr; stdout carries only results and CI workflow commands.
pub fn init(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
