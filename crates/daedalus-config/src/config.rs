//! Main configuration types.
//!
//! This module provides the top-level [`DaedalusConfig`] struct and its builder.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigLoader, DiagnosticsConfig, GeneratorConfig, LogFormat, LoggingConfig};

/// Name of the configuration file looked up next to `Cargo.toml`.
pub const CONFIG_FILE_NAME: &str = "daedalus.toml";

/// Prefix of environment overrides (`DAEDALUS__SECTION__KEY`).
pub const ENV_PREFIX: &str = "DAEDALUS";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete Daedalus configuration.
///
/// # Example
///
/// ```
/// use daedalus_config::DaedalusConfig;
///
/// let config = DaedalusConfig::default();
/// assert_eq!(config.generator.source_root, "src");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct DaedalusConfig {
    /// Generator configuration.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Diagnostic reporting configuration.
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DaedalusConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use daedalus_config::{DaedalusConfig, GeneratorConfig};
    ///
    /// let config = DaedalusConfig::builder()
    ///     .generator(GeneratorConfig {
    ///         source_root: "app".to_string(),
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert_eq!(config.generator.source_root, "app");
    /// ```
    #[must_use]
    pub fn builder() -> DaedalusConfigBuilder {
        DaedalusConfigBuilder::new()
    }

    /// Loads the configuration for the crate rooted at `dir`.
    ///
    /// Layers, later wins: defaults, `dir/daedalus.toml` if present,
    /// `DAEDALUS__*` environment variables (a `.env` file is honored).
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::new()
            .with_defaults()
            .with_optional_file(dir.as_ref().join(CONFIG_FILE_NAME))?
            .with_dotenv()?
            .with_env_prefix(ENV_PREFIX)
            .load()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `generator.source_root` or `generator.output_file` is empty
    /// - `generator.module_name` is not a Rust identifier
    /// - `generator.runtime_path` is not a Rust path
    /// - a suppressed id is not of the form `DAE000`
    /// - `logging.level` is not a known level
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generator.source_root.trim().is_empty() {
            return Err(ConfigError::invalid_value("generator.source_root", "must not be empty"));
        }

        if self.generator.output_file.trim().is_empty() {
            return Err(ConfigError::invalid_value("generator.output_file", "must not be empty"));
        }

        if !is_identifier(&self.generator.module_name) {
            return Err(ConfigError::invalid_value(
                "generator.module_name",
                format!("not a Rust identifier: {}", self.generator.module_name),
            ));
        }

        let runtime = self.generator.runtime_path.strip_prefix("::").unwrap_or(&self.generator.runtime_path);
        if !runtime.split("::").all(is_identifier) {
            return Err(ConfigError::invalid_value(
                "generator.runtime_path",
                format!("not a Rust path: {}", self.generator.runtime_path),
            ));
        }

        if let Some(id) = self.diagnostics.suppress.iter().find(|id| !is_diagnostic_id(id)) {
            return Err(ConfigError::invalid_value(
                "diagnostics.suppress",
                format!("unknown diagnostic id format: {id}"),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("expected one of {}", LOG_LEVELS.join(", ")),
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty log formatting with ANSI colors
    /// - Debug log level with source locations
    ///
    /// # Example
    ///
    /// ```
    /// use daedalus_config::DaedalusConfig;
    ///
    /// let config = DaedalusConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;

        config
    }

    /// Create a CI configuration preset.
    ///
    /// - JSON log formatting without colors
    /// - Warnings fail the run
    ///
    /// # Example
    ///
    /// ```
    /// use daedalus_config::DaedalusConfig;
    ///
    /// let config = DaedalusConfig::ci();
    /// assert!(config.diagnostics.deny_warnings);
    /// ```
    #[must_use]
    pub fn ci() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;

        config.diagnostics.deny_warnings = true;

        config
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    s != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_diagnostic_id(s: &str) -> bool {
    s.len() == 6 && s[..3].eq_ignore_ascii_case("DAE") && s[3..].bytes().all(|b| b.is_ascii_digit())
}

/// Builder for [`DaedalusConfig`].
#[derive(Debug, Default)]
pub struct DaedalusConfigBuilder {
    generator: Option<GeneratorConfig>,
    diagnostics: Option<DiagnosticsConfig>,
    logging: Option<LoggingConfig>,
}

impl DaedalusConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the generator configuration.
    #[must_use]
    pub fn generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the diagnostics configuration.
    #[must_use]
    pub fn diagnostics(mut self, diagnostics: DiagnosticsConfig) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> DaedalusConfig {
        DaedalusConfig {
            generator: self.generator.unwrap_or_default(),
            diagnostics: self.diagnostics.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    pub fn build_validated(self) -> Result<DaedalusConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
