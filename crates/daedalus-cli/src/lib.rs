//! Command-line driver for the Daedalus generator.
//!
//! The `daedalus` binary runs the same pipeline as the build script entry
//! point, but against a crate on disk and with human or JSON diagnostics:
//!
//! - one-shot generation (the default)
//! - `--check` for CI, failing when the generated file is stale
//! - `--watch` to regenerate on every source change

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod args;
pub mod error;
pub mod session;
pub mod watch;

pub use args::{Args, Command, HELP};
pub use error::CliError;
pub use session::{Outcome, Session};
pub use watch::watch;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
