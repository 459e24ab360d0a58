//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading `daedalus.toml` or watching sources.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("no configuration file at {}", path.display())]
    NotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The configuration file exists but could not be read.
    #[error("cannot read {}", path.display())]
    Read {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for the configuration schema.
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file is not valid JSON for the configuration schema.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Only TOML and JSON are understood.
    #[error("unsupported configuration format `{format}`")]
    UnsupportedFormat {
        /// Format name or file extension.
        format: String,
    },

    /// A setting failed validation.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted setting name, e.g. `generator.module_name`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `DAEDALUS__*` override could not be applied.
    #[error("cannot apply {var}: {reason}")]
    Env {
        /// The environment variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The `.env` file exists but is malformed.
    #[error("invalid .env file: {0}")]
    Dotenv(String),

    /// A path handed to the watcher does not exist.
    #[error("cannot watch {}: no such file or directory", path.display())]
    MissingPath {
        /// The missing path.
        path: PathBuf,
    },

    /// The file watcher could not be set up.
    #[error("file watcher error: {message}")]
    Watch {
        /// Description of the failure.
        message: String,
    },
}

impl ConfigError {
    /// Creates a [`ConfigError::Read`].
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a [`ConfigError::InvalidValue`].
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a [`ConfigError::Env`].
    pub fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Creates a [`ConfigError::UnsupportedFormat`].
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat { format: format.into() }
    }

    /// Creates a [`ConfigError::Watch`].
    pub fn watch(message: impl Into<String>) -> Self {
        Self::Watch {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let err = ConfigError::NotFound {
            path: PathBuf::from("/srv/app/daedalus.toml"),
        };
        assert_eq!(err.to_string(), "no configuration file at /srv/app/daedalus.toml");

        let err = ConfigError::MissingPath {
            path: PathBuf::from("src"),
        };
        assert_eq!(err.to_string(), "cannot watch src: no such file or directory");
    }

    #[test]
    fn test_invalid_value() {
        let err = ConfigError::invalid_value("generator.module_name", "not an identifier");
        assert_eq!(err.to_string(), "invalid value for generator.module_name: not an identifier");
    }

    #[test]
    fn test_env_override() {
        let err = ConfigError::env("DAEDALUS__GENERATOR__THREADS", "expected integer");
        assert_eq!(err.to_string(), "cannot apply DAEDALUS__GENERATOR__THREADS: expected integer");
    }

    #[test]
    fn test_read_keeps_source() {
        use std::error::Error as _;

        let err = ConfigError::read("daedalus.toml", std::io::Error::other("denied"));
        assert_eq!(err.source().map(ToString::to_string), Some("denied".to_string()));
    }
}
