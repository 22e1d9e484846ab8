//! Structured logging for the CLI.
//!
//! Logs go to stderr so stdout carries only command output.

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::new(level.as_filter_str())
}

/// Initialise the global subscriber at `level`.
///
/// A subscriber that is already set is left in place.
pub(crate) fn init_logging(level: LogLevel) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        init_logging(LogLevel::Warn);
        init_logging(LogLevel::Debug);
    }

    #[test]
    fn filter_uses_level() {
        assert_eq!(filter_for(LogLevel::Debug).to_string(), "debug");
        assert_eq!(filter_for(LogLevel::default()).to_string(), "warn");
    }
}
