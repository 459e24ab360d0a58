//! Diagnostics and the sinks that report them.
//!
//! Every problem found in the analyzed source becomes a [`Diagnostic`]
//! attached to a model (or to a file, for parse failures). Reporting walks
//! those lists once per run and hands each entry to a [`DiagnosticSink`].
//!
//! | id | severity | meaning |
//! |---|---|---|
//! | DAE001 | error | handler cannot be resolved |
//! | DAE002 | error | unsupported parameter |
//! | DAE003 | error | unsupported or uninferable return type |
//! | DAE004 | warning | route expression not analyzable |
//! | DAE005 | warning | route literal is not a valid pattern |
//! | DAE006 | error | source key collision |
//! | DAE007 | error | file failed to parse |
//! | DAE008 | warning | route parameter not bound by the handler |

use std::fmt;
use std::io::{self, Write};

use daedalus_config::DiagnosticsConfig;
use serde::Serialize;
use tracing::{error, warn};

use crate::syntax::Location;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported; does not affect generation.
    Warning,
    /// Removes the endpoint's generated code.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Static description of one diagnostic kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticDescriptor {
    /// Stable id, e.g. `DAE001`.
    pub id: &'static str,
    /// Default severity.
    pub severity: Severity,
    /// Short title.
    pub title: &'static str,
}

/// DAE001.
pub const UNRESOLVED_HANDLER: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "DAE001",
    severity: Severity::Error,
    title: "handler cannot be resolved",
};

/// DAE002.
pub const UNSUPPORTED_PARAMETER: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "DAE002",
    severity: Severity::Error,
    title: "unsupported parameter",
};

/// DAE003.
pub const UNSUPPORTED_RETURN: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "DAE003",
    severity: Severity::Error,
    title: "unsupported return type",
};

/// DAE004.
pub const ROUTE_NOT_ANALYZABLE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "DAE004",
    severity: Severity::Warning,
    title: "route is not analyzable",
};

/// DAE005.
pub const INVALID_ROUTE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "DAE005",
    severity: Severity::Warning,
    title: "invalid route pattern",
};

/// DAE006.
pub const SOURCE_KEY_COLLISION: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "DAE006",
    severity: Severity::Error,
    title: "source key collision",
};

/// DAE007.
pub const PARSE_FAILURE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "DAE007",
    severity: Severity::Error,
    title: "failed to parse file",
};

/// DAE008.
pub const UNBOUND_ROUTE_PARAMETER: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "DAE008",
    severity: Severity::Warning,
    title: "route parameter not bound",
};

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    /// Descriptor id.
    pub id: &'static str,
    /// Severity.
    pub severity: Severity,
    /// Message.
    pub message: String,
    /// The registration call site.
    pub location: Location,
    /// The element the diagnostic is about, if narrower than the call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_location: Option<Location>,
}

impl Diagnostic {
    /// Creates a diagnostic anchored at `location`.
    pub fn new(descriptor: &DiagnosticDescriptor, location: Location, message: impl Into<String>) -> Self {
        Self {
            id: descriptor.id,
            severity: descriptor.severity,
            message: message.into(),
            location,
            sub_location: None,
        }
    }

    /// Narrows the diagnostic to an element of the call.
    #[must_use]
    pub fn with_sub_location(mut self, location: Location) -> Self {
        self.sub_location = Some(location);
        self
    }

    /// The most precise location available.
    #[must_use]
    pub fn anchor(&self) -> &Location {
        self.sub_location.as_ref().unwrap_or(&self.location)
    }

    /// Returns true for error severity.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}[{}]: {}", self.anchor(), self.severity, self.id, self.message)
    }
}

/// Receives diagnostics during reporting.
pub trait DiagnosticSink {
    /// Reports one diagnostic.
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()>;
}

/// Keeps diagnostics in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// Everything emitted so far, in order.
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of the collected diagnostics, in order.
    #[must_use]
    pub fn ids(&self) -> Vec<&'static str> {
        self.diagnostics.iter().map(|d| d.id).collect()
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        self.diagnostics.push(diagnostic.clone());
        Ok(())
    }
}

/// Emits diagnostics as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        let anchor = diagnostic.anchor();
        match diagnostic.severity {
            Severity::Error => error!(
                id = diagnostic.id,
                file = %anchor.file,
                line = anchor.line,
                column = anchor.column,
                "{}",
                diagnostic.message
            ),
            Severity::Warning => warn!(
                id = diagnostic.id,
                file = %anchor.file,
                line = anchor.line,
                column = anchor.column,
                "{}",
                diagnostic.message
            ),
        }
        Ok(())
    }
}

/// Writes `cargo:warning=` lines for build scripts.
#[derive(Debug)]
pub struct CargoSink<W> {
    out: W,
}

impl<W: Write> CargoSink<W> {
    /// Writes to `out`, normally standard output.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DiagnosticSink for CargoSink<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        // Cargo reads one instruction per line.
        let text = diagnostic.to_string().replace(['\r', '\n'], " ");
        writeln!(self.out, "cargo:warning={text}")
    }
}

/// Writes `file:line:col: severity[ID]: message` lines.
#[derive(Debug)]
pub struct HumanSink<W> {
    out: W,
}

impl<W: Write> HumanSink<W> {
    /// Writes to `out`, normally standard error.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DiagnosticSink for HumanSink<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        writeln!(self.out, "{diagnostic}")
    }
}

/// Writes one JSON object per line.
#[derive(Debug)]
pub struct JsonSink<W> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    /// Writes to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DiagnosticSink for JsonSink<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, diagnostic)?;
        writeln!(self.out)
    }
}

/// Counts from one reporting pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    /// Errors reported.
    pub errors: usize,
    /// Warnings reported.
    pub warnings: usize,
    /// Diagnostics dropped by configuration.
    pub suppressed: usize,
}

impl ReportSummary {
    /// Returns true if the run should fail.
    #[must_use]
    pub fn is_failure(&self, deny_warnings: bool) -> bool {
        self.errors > 0 || (deny_warnings && self.warnings > 0)
    }
}

/// Reports `diagnostics` to `sink`, honoring suppression.
pub fn report<'a, I>(diagnostics: I, sink: &mut dyn DiagnosticSink, config: &DiagnosticsConfig) -> io::Result<ReportSummary>
where
    I: IntoIterator<Item = &'a Diagnostic>,
{
    let mut summary = ReportSummary::default();
    for diagnostic in diagnostics {
        if config.is_suppressed(diagnostic.id) {
            summary.suppressed += 1;
            continue;
        }
        sink.emit(diagnostic)?;
        match diagnostic.severity {
            Severity::Error => summary.errors += 1,
            Severity::Warning => summary.warnings += 1,
        }
    }
    Ok(summary)
}
