//! Structured logging for Daedalus tools.
//!
//! Logs go to standard error so build scripts and the CLI keep standard
//! output for cargo instructions and generated text.
//!
//! # Example
//!
//! ```rust,no_run
//! use daedalus_config::LoggingConfig;
//! use daedalus_telemetry::init_logging;
//!
//! init_logging(&LoggingConfig::default())?;
//! tracing::info!(files = 12, "Generation complete");
//! # Ok::<(), daedalus_telemetry::TelemetryError>(())
//! ```

use daedalus_config::{LogFormat, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;

/// Initializes the global subscriber.
///
/// `RUST_LOG` wins over the configured level when it is set.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` for a bad level and
/// `TelemetryError::LoggingInit` if a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TelemetryError> {
    if !config.enabled {
        return Ok(());
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => create_env_filter(&config.level)?,
    };

    match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_target(true)
                .with_filter(filter);

            tracing_subscriber::registry()
                .with(fmt_layer)
                .try_init()
                .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_ansi(config.ansi_enabled)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_target(true)
                .with_filter(filter);

            tracing_subscriber::registry()
                .with(fmt_layer)
                .try_init()
                .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
        }
    }

    Ok(())
}

/// Like [`init_logging`], but a subscriber that is already installed is not
/// an error.
///
/// Returns true if this call installed the subscriber.
pub fn try_init_logging(config: &LoggingConfig) -> Result<bool, TelemetryError> {
    match init_logging(config) {
        Ok(()) => Ok(config.enabled),
        Err(TelemetryError::LoggingInit(_)) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Creates an env filter from a string such as `info` or `daedalus_gen=debug`.
///
/// # Errors
///
/// Returns error if the filter string is invalid.
pub fn create_env_filter(filter: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
        filter: filter.to_string(),
        reason: e.to_string(),
    })
}
