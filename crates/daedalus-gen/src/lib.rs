//! Daedalus Gen - Build-Time Request Delegate Generation
//!
//! This crate scans a crate's sources for endpoint registrations such as
//! `app.map_get("/items/{id}", handler)`, works out how each handler's
//! parameters bind to the request and how its result is written, and emits
//! specialized request delegates that the runtime picks up in place of its
//! generic, type-erased fallback.
//!
//! # Architecture
//!
//! ```text
//!      src/**/*.rs
//!          │ discover + parse (cached per file)
//!   ┌──────▼────────────┐
//!   │   Compilation     │ symbols, consts, well-known types
//!   └──────┬────────────┘
//!          │ build (cached per candidate)
//!   ┌──────▼────────────┐
//!   │   EndpointModel   │──▶ diagnostics DAE001..DAE008
//!   └──────┬────────────┘
//!          │ render (cached per model)
//!   ┌──────▼────────────┐
//!   │ thunks, overloads │
//!   └──────┬────────────┘
//!          │ aggregate
//!          ▼
//!   OUT_DIR/daedalus_endpoints.rs
//! ```
//!
//! # Example
//!
//! ```no_run
//! use daedalus_config::GeneratorConfig;
//! use daedalus_gen::Generator;
//!
//! # fn main() -> Result<(), daedalus_gen::GeneratorError> {
//! let mut generator = Generator::new(GeneratorConfig::default())?;
//! let output = generator.run_dir(".")?;
//! for diagnostic in &output.diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! output.write_output("target/daedalus_endpoints.rs")?;
//! # Ok(())
//! # }
//! ```
//!
//! Build scripts call [`build_script::generate`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod analyzer;
pub mod build_script;
pub mod builder;
pub mod cache;
pub mod code_writer;
pub mod compilation;
pub mod diagnostics;
pub mod discover;
pub mod emit;
pub mod error;
pub mod filter;
pub mod model;
pub mod pipeline;
pub mod symbols;
pub mod syntax;
pub mod well_known;

// Re-exports for convenience
pub use aggregate::{Artifact, ArtifactOptions};
pub use analyzer::{Analysis, BindingAnalyzer, DefaultBindingAnalyzer};
pub use cache::StageStats;
pub use diagnostics::{
    report, CargoSink, CollectingSink, Diagnostic, DiagnosticDescriptor, DiagnosticSink, HumanSink, JsonSink,
    ReportSummary, Severity, TracingSink,
};
pub use discover::SourceDiscovery;
pub use error::GeneratorError;
pub use model::{BindingSource, EndpointKey, EndpointModel, Parameter, Response, ResponseKind, RouteInfo};
pub use pipeline::{GenerationOutput, Generator};
pub use syntax::{Location, SourceFile};
