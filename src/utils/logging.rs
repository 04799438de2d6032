//! Logging initialization for hosts embedding the container
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! the host's call. These helpers give hosts a consistent setup that:
//! - Respects the RUST_LOG environment variable
//! - Falls back to a filter from `LoggingConfig`
//! - Defaults to "info"
//!
//! # Usage
//! ```rust,no_run
//! use wireup::utils::init_logging;
//!
//! init_logging(None).ok(); // Uses RUST_LOG or defaults to "info"
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Pick the filter: RUST_LOG first, then the configured filter, then "info"
fn build_filter(filter: Option<&str>) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::new(filter.unwrap_or("info"))
}

/// Initialize human-readable logging
///
/// Fails if a global subscriber is already installed.
///
/// # Arguments
/// * `filter` - Optional log filter (e.g., "info", "wireup=debug").
///   If None, uses RUST_LOG or defaults to "info"
pub fn init_logging(filter: Option<&str>) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(std::env::var("NO_COLOR").is_err()),
        )
        .with(build_filter(filter))
        .try_init()?;
    Ok(())
}

/// Initialize logging with JSON output
///
/// Useful when logs need to be parsed by log aggregation systems.
#[cfg(feature = "json-logging")]
pub fn init_json_logging(filter: Option<&str>) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(build_filter(filter))
        .try_init()?;
    Ok(())
}

/// Initialize logging from a `LoggingConfig`
///
/// RUST_LOG always takes precedence over the configured filter. Without the
/// `json-logging` feature, `json_format` falls back to the plain format.
pub fn init_logging_from_config(config: Option<&LoggingConfig>) -> anyhow::Result<()> {
    let filter = config.and_then(|c| c.filter.as_deref());

    if config.map(|c| c.json_format).unwrap_or(false) {
        #[cfg(feature = "json-logging")]
        {
            return init_json_logging(filter);
        }
    }
    init_logging(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_second_init_fails() {
        // Whichever test installs first wins; a second install must error, not panic
        let _ = init_logging(Some("warn"));
        assert!(init_logging(Some("warn")).is_err());
    }

    #[test]
    #[serial]
    fn test_filter_falls_back_to_config() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let filter = build_filter(Some("wireup=debug"));
        assert_eq!(filter.to_string(), "wireup=debug");
        assert_eq!(build_filter(None).to_string(), "info");
    }
}
