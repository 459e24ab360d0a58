//! Error types for the Daedalus CLI.

use std::path::PathBuf;

use daedalus_config::ConfigError;
use daedalus_gen::GeneratorError;
use daedalus_telemetry::TelemetryError;
use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// An argument was not recognized.
    #[error("unknown argument: {0}")]
    UnknownArgument(String),

    /// A flag that takes a value was last on the command line.
    #[error("{flag} requires a value")]
    MissingValue {
        /// The flag.
        flag: &'static str,
    },

    /// Two flags cannot be combined.
    #[error("{first} cannot be combined with {second}")]
    ConflictingFlags {
        /// The first flag.
        first: &'static str,
        /// The second flag.
        second: &'static str,
    },

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generation error.
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    /// Logging could not be set up.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// Writing diagnostics failed.
    #[error("failed to write diagnostics: {0}")]
    Output(#[source] std::io::Error),

    /// A background generation task panicked or was aborted.
    #[error("generation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// `--check` found a generated file that does not match the sources.
    #[error("{} is out of date; rerun daedalus without --check", path.display())]
    OutOfDate {
        /// The generated file.
        path: PathBuf,
    },
}

impl CliError {
    /// Returns true for usage mistakes, which print the help hint.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::UnknownArgument(_) | Self::MissingValue { .. } | Self::ConflictingFlags { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(CliError::UnknownArgument("--x".to_string()).to_string(), "unknown argument: --x");
        assert_eq!(CliError::MissingValue { flag: "--root" }.to_string(), "--root requires a value");
        let err = CliError::OutOfDate {
            path: PathBuf::from("src/daedalus_endpoints.rs"),
        };
        assert!(err.to_string().starts_with("src/daedalus_endpoints.rs is out of date"));
    }

    #[test]
    fn test_usage_errors() {
        assert!(CliError::UnknownArgument("-z".to_string()).is_usage());
        assert!(CliError::ConflictingFlags {
            first: "--check",
            second: "--watch"
        }
        .is_usage());
        assert!(!CliError::Generator(GeneratorError::Cancelled).is_usage());
    }
}
