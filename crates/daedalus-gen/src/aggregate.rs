//! Aggregation of rendered endpoints into the generated artifact.
//!
//! Output is sorted by source key, then column, then text, so the artifact
//! does not depend on the order files were discovered or rendered in.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::code_writer::CodeWriter;
use crate::diagnostics::{Diagnostic, SOURCE_KEY_COLLISION};
use crate::emit::{OverloadText, ThunkText};
use crate::model::{EndpointKey, EndpointModel};

/// Settings for the artifact's outer shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOptions {
    /// Name of the wrapping module.
    pub module_name: String,
    /// Path of the runtime crate.
    pub runtime_path: String,
}

/// The generated source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Rust source text.
    pub text: String,
    /// Entries in the thunk table.
    pub thunk_count: usize,
    /// Overload methods.
    pub overload_count: usize,
}

/// Reports endpoints that share a source key.
///
/// For each key the registration with the lowest column keeps it; every
/// other one gets a DAE006 error and is therefore not emitted.
pub fn mark_collisions(models: &mut [EndpointModel]) {
    let mut by_key: BTreeMap<EndpointKey, Vec<usize>> = BTreeMap::new();
    for (index, model) in models.iter().enumerate() {
        by_key.entry(model.key.clone()).or_default().push(index);
    }
    for (key, mut indices) in by_key {
        if indices.len() < 2 {
            continue;
        }
        indices.sort_by(|a, b| {
            let (a, b) = (&models[*a], &models[*b]);
            (a.location.column, &a.operation.expression).cmp(&(b.location.column, &b.operation.expression))
        });
        let winner = models[indices[0]].location.clone();
        for &index in &indices[1..] {
            let location = models[index].location.clone();
            models[index].diagnostics.push(Diagnostic::new(
                &SOURCE_KEY_COLLISION,
                location,
                format!(
                    "another registration at {winner} has the same source key `{key}`; put each registration on its own line"
                ),
            ));
        }
    }
}

/// Builds the artifact from rendered thunks and overloads.
#[must_use]
pub fn aggregate(thunks: &[ThunkText], overloads: &[OverloadText], options: &ArtifactOptions) -> Artifact {
    let mut thunks: Vec<&ThunkText> = thunks.iter().collect();
    thunks.sort_by(|a, b| {
        (&a.key, a.column, &a.functions, &a.entry).cmp(&(&b.key, b.column, &b.functions, &b.entry))
    });
    thunks.dedup_by(|next, kept| next.key == kept.key);

    let mut overloads: Vec<&OverloadText> = overloads.iter().collect();
    overloads.sort_by(|a, b| (&a.name, &a.implementation).cmp(&(&b.name, &b.implementation)));
    overloads.dedup_by(|next, kept| next.name == kept.name);

    let mut text = String::new();
    // Writing into a String cannot fail.
    let _ = write_artifact(&mut text, &thunks, &overloads, options);

    Artifact {
        text,
        thunk_count: thunks.len(),
        overload_count: overloads.len(),
    }
}

fn write_artifact(
    out: &mut String,
    thunks: &[&ThunkText],
    overloads: &[&OverloadText],
    options: &ArtifactOptions,
) -> std::fmt::Result {
    let rt = &options.runtime_path;
    let mut w = CodeWriter::new(out);

    w.comment("@generated by daedalus-gen. Do not edit.")?;
    let mut summary = String::new();
    write!(summary, "{} specialized endpoint(s), {} overload(s).", thunks.len(), overloads.len())?;
    w.comment(&summary)?;
    w.blank_line()?;

    w.writeln("#[allow(missing_docs, dead_code, unused_imports, unused_parens, non_snake_case, clippy::all, clippy::pedantic, clippy::nursery)]")?;
    w.block(&format!("pub mod {}", options.module_name), |w| {
        w.writeln("use super::*;")?;
        w.blank_line()?;

        w.writeln("/// Endpoint metadata naming the source key the endpoint was specialized for.")?;
        w.writeln("#[derive(Debug, Clone, Copy, PartialEq, Eq)]")?;
        w.writeln(&format!("pub struct SourceKeyMetadata(pub {rt}::SourceKey);"))?;

        for thunk in thunks {
            w.blank_line()?;
            w.comment(&thunk.key.to_string())?;
            w.writeln(&thunk.functions)?;
        }

        w.blank_line()?;
        w.writeln("/// Generated thunks by source key.")?;
        w.writeln(&format!("pub static THUNKS: &[({rt}::SourceKey, {rt}::Thunk)] = &["))?;
        {
            let _indent = w.indent();
            for thunk in thunks {
                w.writeln(&thunk.entry)?;
            }
        }
        w.writeln("];")?;

        w.blank_line()?;
        w.writeln("/// Typed registration methods, one per verb and handler signature.")?;
        w.block("pub trait EndpointOverloads", |w| {
            for overload in overloads {
                w.writeln(&overload.declaration)?;
            }
            Ok(())
        })?;
        w.blank_line()?;
        w.block(&format!("impl EndpointOverloads for {rt}::EndpointRouteBuilder"), |w| {
            for overload in overloads {
                w.writeln(&overload.implementation)?;
            }
            Ok(())
        })
    })
}
