//! One configured generator and the runs made with it.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use daedalus_config::{ConfigLoader, DaedalusConfig, DiagnosticFormat, CONFIG_FILE_NAME, ENV_PREFIX};
use daedalus_gen::{report, DiagnosticSink, Generator, HumanSink, JsonSink, ReportSummary};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::args::Args;
use crate::error::CliError;

/// Result of one successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Reported diagnostic counts.
    pub summary: ReportSummary,
    /// Whether the output file was (re)written.
    pub written: bool,
    /// Registrations found.
    pub endpoints: usize,
    /// Registrations that got a generated thunk.
    pub specialized: usize,
    /// Whether the exit status should be non-zero.
    pub failed: bool,
}

/// A loaded configuration plus a generator that keeps its caches between
/// runs.
#[derive(Debug)]
pub struct Session {
    args: Args,
    config: DaedalusConfig,
    generator: Generator,
}

impl Session {
    /// Loads the configuration and creates the generator.
    pub fn new(args: Args) -> Result<Self, CliError> {
        let config = load_config(&args)?;
        let generator = Generator::new(config.generator.clone())?;
        Ok(Self {
            args,
            config,
            generator,
        })
    }

    /// The parsed arguments.
    #[must_use]
    pub fn args(&self) -> &Args {
        &self.args
    }

    /// The loaded configuration.
    #[must_use]
    pub fn config(&self) -> &DaedalusConfig {
        &self.config
    }

    /// Where the artifact is written.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.args
            .out
            .clone()
            .unwrap_or_else(|| self.args.root.join(&self.config.generator.output_file))
    }

    /// The scanned directory.
    #[must_use]
    pub fn source_dir(&self) -> PathBuf {
        self.args.root.join(&self.config.generator.source_root)
    }

    /// The configuration file that is watched for changes.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.args
            .config
            .clone()
            .unwrap_or_else(|| self.args.root.join(CONFIG_FILE_NAME))
    }

    /// Rereads the configuration.
    ///
    /// The generator, and with it every cache, is replaced only when the
    /// `[generator]` section changed.
    pub fn reload(&mut self) -> Result<(), CliError> {
        let config = load_config(&self.args)?;
        if config.generator != self.config.generator {
            info!("Generator settings changed, dropping caches");
            self.generator = Generator::new(config.generator.clone())?;
        }
        self.config = config;
        Ok(())
    }

    /// Uses `cancel` for the following runs.
    pub fn set_cancellation(&mut self, cancel: CancellationToken) {
        self.generator.set_cancellation(cancel);
    }

    /// Runs once, reporting diagnostics to standard error (standard output
    /// for JSON).
    pub fn run(&mut self) -> Result<Outcome, CliError> {
        if self.json() {
            self.run_with(&mut io::stdout().lock())
        } else {
            self.run_with(&mut io::stderr().lock())
        }
    }

    /// Runs once, reporting diagnostics to `out`.
    pub fn run_with(&mut self, out: &mut dyn Write) -> Result<Outcome, CliError> {
        let output = self.generator.run_dir(&self.args.root)?;

        let mut sink: Box<dyn DiagnosticSink + '_> = if self.json() {
            Box::new(JsonSink::new(&mut *out))
        } else {
            Box::new(HumanSink::new(&mut *out))
        };
        let summary = report(&output.diagnostics, sink.as_mut(), &self.config.diagnostics).map_err(CliError::Output)?;
        drop(sink);

        let path = self.output_path();
        let written = if self.args.check {
            let current = fs::read_to_string(&path).ok();
            if current.as_deref() != Some(output.artifact.text.as_str()) {
                return Err(CliError::OutOfDate { path });
            }
            debug!(path = %path.display(), "Generated file is up to date");
            false
        } else {
            output.write_output(&path)?
        };

        let outcome = Outcome {
            summary,
            written,
            endpoints: output.endpoints,
            specialized: output.artifact.thunk_count,
            failed: summary.is_failure(self.config.diagnostics.deny_warnings),
        };
        info!(
            endpoints = outcome.endpoints,
            specialized = outcome.specialized,
            errors = summary.errors,
            warnings = summary.warnings,
            written,
            "Run finished"
        );
        Ok(outcome)
    }

    fn json(&self) -> bool {
        self.args.json || self.config.diagnostics.format == DiagnosticFormat::Json
    }
}

fn load_config(args: &Args) -> Result<DaedalusConfig, CliError> {
    let config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            ConfigLoader::new()
                .with_defaults()
                .with_file(path)?
                .with_dotenv()?
                .with_env_prefix(ENV_PREFIX)
                .load()?
        }
        None => DaedalusConfig::load_from_dir(&args.root)?,
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn krate(lib: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), lib).unwrap();
        dir
    }

    fn session(root: &Path, check: bool) -> Session {
        Session::new(Args {
            root: root.to_path_buf(),
            check,
            ..Args::default()
        })
        .unwrap()
    }

    #[test]
    fn test_run_writes_output_and_reports() {
        let dir = krate("fn f() {\n    app.map_get(\"/a\", || \"a\");\n    app.map_get(\"/b\", |x| x);\n}\n");
        let mut session = session(dir.path(), false);

        let mut out = Vec::new();
        let outcome = session.run_with(&mut out).unwrap();

        assert!(outcome.written);
        assert!(outcome.failed);
        assert_eq!((outcome.endpoints, outcome.specialized), (2, 1));
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("src/lib.rs:3:"), "{out}");
        assert!(out.contains("error[DAE002]"));
        assert!(dir.path().join("daedalus_endpoints.rs").exists());

        let again = session.run_with(&mut Vec::new()).unwrap();
        assert!(!again.written);
    }

    #[test]
    fn test_check_mode() {
        let dir = krate("fn f() { app.map_get(\"/a\", || \"a\"); }\n");

        let err = session(dir.path(), true).run_with(&mut Vec::new()).unwrap_err();
        assert!(matches!(err, CliError::OutOfDate { .. }));

        session(dir.path(), false).run_with(&mut Vec::new()).unwrap();
        let outcome = session(dir.path(), true).run_with(&mut Vec::new()).unwrap();
        assert!(!outcome.written);
        assert!(!outcome.failed);
    }

    #[test]
    fn test_json_diagnostics_and_deny_warnings() {
        let dir = krate("fn f() { app.map_get(\"/users/{id}\", || \"a\"); }\n");
        fs::write(
            dir.path().join("daedalus.toml"),
            "[diagnostics]\ndeny_warnings = true\nformat = \"json\"\n",
        )
        .unwrap();
        let mut session = session(dir.path(), false);

        let mut out = Vec::new();
        let outcome = session.run_with(&mut out).unwrap();

        assert_eq!(outcome.summary.warnings, 1);
        assert!(outcome.failed);
        let line = String::from_utf8(out).unwrap();
        assert!(line.trim_start().starts_with('{'));
        assert!(line.contains("DAE008"));
    }

    #[test]
    fn test_reload_keeps_generator_when_unchanged() {
        let dir = krate("");
        let mut session = session(dir.path(), false);
        session.run_with(&mut Vec::new()).unwrap();

        fs::write(dir.path().join("daedalus.toml"), "[diagnostics]\nsuppress = [\"DAE008\"]\n").unwrap();
        session.reload().unwrap();
        assert_eq!(session.config().diagnostics.suppress, vec!["DAE008"]);

        fs::write(dir.path().join("daedalus.toml"), "[generator]\noutput_file = \"gen.rs\"\n").unwrap();
        session.reload().unwrap();
        assert_eq!(session.output_path(), dir.path().join("gen.rs"));
    }

    #[test]
    fn test_explicit_config_and_out() {
        let dir = krate("");
        let config = dir.path().join("custom.toml");
        fs::write(&config, "[generator]\nmodule_name = \"routes_gen\"\n").unwrap();
        let mut session = Session::new(Args {
            config: Some(config.clone()),
            root: dir.path().to_path_buf(),
            out: Some(dir.path().join("out/gen.rs")),
            ..Args::default()
        })
        .unwrap();

        session.run_with(&mut Vec::new()).unwrap();

        assert_eq!(session.config_path(), config);
        let text = fs::read_to_string(dir.path().join("out/gen.rs")).unwrap();
        assert!(text.contains("pub mod routes_gen {"));
    }
}
