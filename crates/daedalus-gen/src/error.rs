//! Generator error types.
//!
//! Problems in the analyzed source are never errors: they are
//! [`Diagnostic`](crate::Diagnostic)s carried on the models. A
//! [`GeneratorError`] means the run itself could not complete.

use std::io;
use std::path::PathBuf;

use daedalus_config::ConfigError;
use thiserror::Error;

/// Errors that stop a generator run.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// Walking the source tree failed.
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// An exclude pattern is not a valid glob.
    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidExclude {
        /// The pattern as configured.
        pattern: String,
        /// The underlying error.
        #[source]
        source: globset::Error,
    },

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A required environment variable is missing (build script use).
    #[error("environment variable {var} is not set")]
    Env {
        /// The variable name.
        var: &'static str,
    },

    /// The worker pool could not be created.
    #[error("failed to create worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The run was cancelled before it finished.
    #[error("generation cancelled")]
    Cancelled,
}

impl GeneratorError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the run was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
