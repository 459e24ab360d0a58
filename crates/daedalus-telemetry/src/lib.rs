//! Logging setup for Daedalus tools.
//!
//! The generator, its build script entry point and the CLI all log through
//! `tracing`. This crate installs the subscriber from a
//! [`LoggingConfig`](daedalus_config::LoggingConfig):
//!
//! - `format = "pretty"` for humans, `format = "json"` for CI log collectors
//! - `level` accepts any `EnvFilter` directive; `RUST_LOG` overrides it
//!
//! # Example
//!
//! ```rust,no_run
//! use daedalus_config::DaedalusConfig;
//!
//! let config = DaedalusConfig::load_from_dir(".").unwrap_or_default();
//! daedalus_telemetry::try_init_logging(&config.logging).ok();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, try_init_logging};
