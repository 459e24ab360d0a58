//! The generator pipeline.
//!
//! ```text
//! SourceFile ──parse──▶ FileSyntax ──index──▶ Compilation
//!                                                │
//!                          candidates + resolved symbols (ModelInput)
//!                                                │
//!                                     build ──▶ EndpointModel ──▶ diagnostics
//!                                                │
//!                              render ──▶ ThunkText, OverloadText
//!                                                │
//!                                  aggregate ──▶ Artifact
//! ```
//!
//! Parsing, model building and rendering are cached [`Stage`]s. A
//! [`Generator`] keeps them between runs, so a rerun after an edit only
//! recomputes what the edit affected.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use daedalus_config::GeneratorConfig;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::aggregate::{aggregate, mark_collisions, Artifact, ArtifactOptions};
use crate::analyzer::{BindingAnalyzer, DefaultBindingAnalyzer};
use crate::builder::build_model;
use crate::cache::{Stage, StageStats};
use crate::compilation::{Compilation, ModelInput};
use crate::diagnostics::Diagnostic;
use crate::discover::SourceDiscovery;
use crate::emit::{OverloadText, Renderer, ThunkText};
use crate::error::GeneratorError;
use crate::model::EndpointModel;
use crate::syntax::{parse_file, FileSyntax, SourceFile};

type RenderKey = (EndpointModel, u64);

/// Result of one run.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    /// The generated source unit.
    pub artifact: Artifact,
    /// Every diagnostic, ordered by location.
    pub diagnostics: Vec<Diagnostic>,
    /// Per-stage cache counters.
    pub stats: Vec<StageStats>,
    /// Relative paths of the scanned files.
    pub files: Vec<String>,
    /// Number of registrations found.
    pub endpoints: usize,
}

impl GenerationOutput {
    /// Returns true if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Writes the artifact to `path` unless the file already holds it.
    ///
    /// Returns true if the file was written.
    pub fn write_output(&self, path: impl AsRef<Path>) -> Result<bool, GeneratorError> {
        let path = path.as_ref();
        if fs::read_to_string(path).is_ok_and(|current| current == self.artifact.text) {
            debug!(path = %path.display(), "Generated file unchanged");
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| GeneratorError::io(parent, e))?;
        }
        fs::write(path, &self.artifact.text).map_err(|e| GeneratorError::io(path, e))?;
        info!(path = %path.display(), "Wrote generated file");
        Ok(true)
    }
}

/// Runs the pipeline, keeping caches across runs.
pub struct Generator {
    config: GeneratorConfig,
    analyzer: Arc<dyn BindingAnalyzer>,
    cancel: CancellationToken,
    pool: Option<Arc<ThreadPool>>,
    syntax: Stage<SourceFile, Arc<FileSyntax>>,
    models: Stage<ModelInput, EndpointModel>,
    thunks: Stage<RenderKey, Option<ThunkText>>,
    overloads: Stage<RenderKey, Option<OverloadText>>,
}

impl Generator {
    /// Creates a generator with the default binding rules.
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        let pool = if config.threads > 0 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .thread_name(|index| format!("daedalus-gen-{index}"))
                .build()?;
            Some(Arc::new(pool))
        } else {
            None
        };
        Ok(Self {
            config,
            analyzer: Arc::new(DefaultBindingAnalyzer),
            cancel: CancellationToken::new(),
            pool,
            syntax: Stage::new("FileSyntax"),
            models: Stage::new("EndpointModel"),
            thunks: Stage::new("ThunkText"),
            overloads: Stage::new("OverloadText"),
        })
    }

    /// Replaces the binding analyzer. Cached models are dropped.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn BindingAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self.models.clear();
        self.thunks.clear();
        self.overloads.clear();
        self
    }

    /// Uses `cancel` to abort runs.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replaces the cancellation token for later runs.
    pub fn set_cancellation(&mut self, cancel: CancellationToken) {
        self.cancel = cancel;
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Discovers the sources under `root` and runs the pipeline on them.
    pub fn run_dir(&mut self, root: impl AsRef<Path>) -> Result<GenerationOutput, GeneratorError> {
        let root = root.as_ref();
        let files = SourceDiscovery::new(root, &self.config.source_root, &self.config.exclude)?
            .skip(root.join(&self.config.output_file))
            .load()?;
        self.run(&files)
    }

    /// Runs the pipeline on `files`.
    pub fn run(&mut self, files: &[SourceFile]) -> Result<GenerationOutput, GeneratorError> {
        match self.pool.clone() {
            Some(pool) => pool.install(|| self.run_stages(files)),
            None => self.run_stages(files),
        }
    }

    fn run_stages(&mut self, files: &[SourceFile]) -> Result<GenerationOutput, GeneratorError> {
        let started = Instant::now();
        let cancel = self.cancel.clone();
        let check = || {
            if cancel.is_cancelled() {
                Err(GeneratorError::Cancelled)
            } else {
                Ok(())
            }
        };
        check()?;

        let source_root = self.config.source_root.clone();
        let (syntax, syntax_stats) = self
            .syntax
            .run(files, &cancel, |file| Arc::new(parse_file(file, &source_root)))?;
        let compilation = Compilation::new(syntax);
        check()?;

        let candidates: Vec<_> = compilation.candidates().collect();
        let inputs: Vec<ModelInput> = candidates
            .par_iter()
            .map(|candidate| compilation.model_input(candidate))
            .collect();
        check()?;

        let well_known = compilation.well_known();
        let analyzer = Arc::clone(&self.analyzer);
        let (mut models, model_stats) = self
            .models
            .run(&inputs, &cancel, |input| build_model(input, well_known, analyzer.as_ref()))?;
        mark_collisions(&mut models);

        let renderer = Renderer::new(&self.config.runtime_path, well_known);
        let fingerprint = well_known.fingerprint();
        let keys: Vec<RenderKey> = models.iter().map(|model| (model.clone(), fingerprint)).collect();
        let (thunks, thunk_stats) = self.thunks.run(&keys, &cancel, |(model, _)| renderer.thunk(model))?;
        let (overloads, overload_stats) = self
            .overloads
            .run(&keys, &cancel, |(model, _)| renderer.overload(model))?;
        check()?;

        let thunks: Vec<ThunkText> = thunks.into_iter().flatten().collect();
        let overloads: Vec<OverloadText> = overloads.into_iter().flatten().collect();
        let artifact = aggregate(
            &thunks,
            &overloads,
            &ArtifactOptions {
                module_name: self.config.module_name.clone(),
                runtime_path: self.config.runtime_path.clone(),
            },
        );

        let mut diagnostics: Vec<Diagnostic> = compilation
            .file_diagnostics()
            .cloned()
            .chain(models.iter().flat_map(|model| model.diagnostics.iter().cloned()))
            .collect();
        diagnostics.sort_by(|a, b| (&a.location, a.id, &a.message).cmp(&(&b.location, b.id, &b.message)));

        let output = GenerationOutput {
            artifact,
            stats: vec![syntax_stats, model_stats, thunk_stats, overload_stats],
            files: files.iter().map(|file| file.path.clone()).collect(),
            endpoints: models.len(),
            diagnostics,
        };
        info!(
            files = files.len(),
            endpoints = output.endpoints,
            specialized = output.artifact.thunk_count,
            overloads = output.artifact.overload_count,
            diagnostics = output.diagnostics.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Generation complete"
        );
        Ok(output)
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("config", &self.config)
            .field("analyzer", &self.analyzer)
            .field("syntax", &self.syntax)
            .field("models", &self.models)
            .finish_non_exhaustive()
    }
}
