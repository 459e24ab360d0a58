//! Typed configuration for the Daedalus generator.
//!
//! Configuration is built around [`DaedalusConfig`]:
//!
//! - [`GeneratorConfig`] - what to scan and where to write the generated file
//! - [`DiagnosticsConfig`] - suppression and warning policy
//! - [`LoggingConfig`] - log level and format
//!
//! Values are layered: defaults, then `daedalus.toml` next to `Cargo.toml`,
//! then `DAEDALUS__SECTION__KEY` environment variables.
//!
//! # Example
//!
//! ```no_run
//! use daedalus_config::DaedalusConfig;
//!
//! # fn main() -> Result<(), daedalus_config::ConfigError> {
//! let config = DaedalusConfig::load_from_dir(".")?;
//! println!("scanning {}", config.generator.source_root);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [generator]
//! source_root = "src"
//! exclude = ["src/bin/**"]
//! output_file = "daedalus_endpoints.rs"
//! module_name = "generated_endpoints"
//! runtime_path = "::daedalus"
//!
//! [diagnostics]
//! deny_warnings = false
//! suppress = ["DAE008"]
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

mod config;
mod error;
mod loader;
mod schema;
mod watcher;

pub use config::{DaedalusConfig, DaedalusConfigBuilder, CONFIG_FILE_NAME, ENV_PREFIX};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{DiagnosticFormat, DiagnosticsConfig, GeneratorConfig, LogFormat, LoggingConfig};
pub use watcher::{
    ChangeBatch, FileChangeEvent, FileChangeKind, FileWatcher, FileWatcherBuilder, FileWatcherConfig,
};
