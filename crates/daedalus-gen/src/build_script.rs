//! Build script entry point.
//!
//! ```no_run
//! // build.rs
//! fn main() {
//!     if let Err(err) = daedalus_gen::build_script::generate() {
//!         panic!("daedalus-gen failed: {err}");
//!     }
//! }
//! ```
//!
//! The crate then includes the artifact with `daedalus::include_endpoints!()`.

use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use daedalus_config::{DaedalusConfig, CONFIG_FILE_NAME};
use tracing::info;

use crate::diagnostics::{report, CargoSink};
use crate::error::GeneratorError;
use crate::pipeline::{GenerationOutput, Generator};

/// Generates the artifact for the crate being built.
///
/// Reads `CARGO_MANIFEST_DIR` and `OUT_DIR`, writes cargo instructions to
/// standard output and the artifact to `OUT_DIR`.
pub fn generate() -> Result<GenerationOutput, GeneratorError> {
    let manifest_dir = env_path("CARGO_MANIFEST_DIR")?;
    let out_dir = env_path("OUT_DIR")?;
    let stdout = io::stdout();
    generate_in(&manifest_dir, &out_dir, &mut stdout.lock())
}

/// Generates the artifact for the crate at `manifest_dir` into `out_dir`.
///
/// Cargo instructions (`rerun-if-changed` and diagnostic warnings) go to
/// `out`.
pub fn generate_in(
    manifest_dir: &Path,
    out_dir: &Path,
    out: &mut dyn Write,
) -> Result<GenerationOutput, GeneratorError> {
    let config = DaedalusConfig::load_from_dir(manifest_dir)?;
    let mut generator = Generator::new(config.generator.clone())?;
    let output = generator.run_dir(manifest_dir)?;

    let stdout_err = |e| GeneratorError::io("<cargo output>", e);
    writeln!(out, "cargo:rerun-if-changed={}", manifest_dir.join(CONFIG_FILE_NAME).display()).map_err(stdout_err)?;
    writeln!(
        out,
        "cargo:rerun-if-changed={}",
        manifest_dir.join(&config.generator.source_root).display()
    )
    .map_err(stdout_err)?;
    for file in &output.files {
        writeln!(out, "cargo:rerun-if-changed={}", manifest_dir.join(file).display()).map_err(stdout_err)?;
    }

    let mut sink = CargoSink::new(&mut *out);
    let summary = report(&output.diagnostics, &mut sink, &config.diagnostics).map_err(stdout_err)?;

    let target = out_dir.join(&config.generator.output_file);
    let written = output.write_output(&target)?;
    info!(
        path = %target.display(),
        written,
        errors = summary.errors,
        warnings = summary.warnings,
        "Build script generation finished"
    );
    Ok(output)
}

fn env_path(var: &'static str) -> Result<PathBuf, GeneratorError> {
    env::var_os(var).map(PathBuf::from).ok_or(GeneratorError::Env { var })
}
