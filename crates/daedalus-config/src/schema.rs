//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use serde::{Deserialize, Serialize};

/// Generator configuration section.
///
/// Controls what is scanned and where the generated file goes.
///
/// # Example
///
/// ```
/// use daedalus_config::GeneratorConfig;
///
/// let config = GeneratorConfig {
///     source_root: "src".to_string(),
///     exclude: vec!["**/fixtures/**".to_string()],
///     ..Default::default()
/// };
/// assert_eq!(config.output_file, "daedalus_endpoints.rs");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Directory scanned for `.rs` files, relative to the crate root.
    #[serde(default = "default_source_root")]
    pub source_root: String,

    /// Glob patterns (relative to the crate root) of files to skip.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// File name of the generated artifact.
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Name of the module wrapping the generated items.
    #[serde(default = "default_module_name")]
    pub module_name: String,

    /// Path under which generated code reaches the runtime.
    #[serde(default = "default_runtime_path")]
    pub runtime_path: String,

    /// Worker threads for parsing and rendering. 0 uses one per core.
    #[serde(default)]
    pub threads: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            exclude: Vec::new(),
            output_file: default_output_file(),
            module_name: default_module_name(),
            runtime_path: default_runtime_path(),
            threads: 0,
        }
    }
}

fn default_source_root() -> String {
    "src".to_string()
}

fn default_output_file() -> String {
    "daedalus_endpoints.rs".to_string()
}

fn default_module_name() -> String {
    "generated_endpoints".to_string()
}

fn default_runtime_path() -> String {
    "::daedalus".to_string()
}

/// How the CLI prints diagnostics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticFormat {
    /// `file:line:col: severity[ID]: message`.
    #[default]
    Human,
    /// One JSON object per diagnostic.
    Json,
}

/// Diagnostics configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Treat warnings as errors for the exit status.
    #[serde(default)]
    pub deny_warnings: bool,

    /// Diagnostic ids that are not reported (e.g. `"DAE008"`).
    #[serde(default)]
    pub suppress: Vec<String>,

    /// Output format used by the CLI.
    #[serde(default)]
    pub format: DiagnosticFormat,
}

impl DiagnosticsConfig {
    /// Returns true if diagnostics with `id` are suppressed.
    #[must_use]
    pub fn is_suppressed(&self, id: &str) -> bool {
        self.suppress.iter().any(|s| s.eq_ignore_ascii_case(id))
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (CI).
    Json,
    /// Human-readable pretty format.
    #[default]
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_config_default() {
        let config = GeneratorConfig::default();
        assert_eq!(config.source_root, "src");
        assert!(config.exclude.is_empty());
        assert_eq!(config.output_file, "daedalus_endpoints.rs");
        assert_eq!(config.module_name, "generated_endpoints");
        assert_eq!(config.runtime_path, "::daedalus");
        assert_eq!(config.threads, 0);
    }

    #[test]
    fn test_generator_config_deserialize() {
        let toml = r#"
            source_root = "app"
            exclude = ["app/legacy/**"]
        "#;
        let config: GeneratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.source_root, "app");
        assert_eq!(config.exclude, vec!["app/legacy/**"]);
        // Defaults applied
        assert_eq!(config.module_name, "generated_endpoints");
    }

    #[test]
    fn test_generator_config_unknown_field_rejected() {
        let toml = r#"
            source_root = "src"
            unknown_field = "value"
        "#;
        let result: Result<GeneratorConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_diagnostics_suppression_is_case_insensitive() {
        let config = DiagnosticsConfig {
            suppress: vec!["dae008".to_string()],
            ..Default::default()
        };
        assert!(config.is_suppressed("DAE008"));
        assert!(!config.is_suppressed("DAE002"));
    }

    #[test]
    fn test_diagnostic_format_deserialize() {
        let format: DiagnosticFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, DiagnosticFormat::Json);
        let format: DiagnosticFormat = serde_json::from_str(r#""human""#).unwrap();
        assert_eq!(format, DiagnosticFormat::Human);
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);

        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }
}
