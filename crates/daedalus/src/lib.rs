//! # Daedalus
//!
//! Minimal HTTP endpoints whose request delegates are generated at build
//! time.
//!
//! Handlers are plain closures or functions registered with `map_*` calls.
//! A build script runs `daedalus-gen` over the crate's sources; for every
//! registration it can analyze, it emits a statically-typed delegate keyed
//! by the call's source location. At runtime each registration looks up its
//! own location and uses the generated delegate, falling back to generic,
//! reflection-free extraction through [`Handler`] when there is none.
//!
//! ## Example
//!
//! ```rust,ignore
//! // build.rs
//! fn main() {
//!     daedalus_gen::build_script::generate().unwrap();
//! }
//!
//! // src/lib.rs
//! use daedalus::{EndpointRouteBuilder, Json};
//!
//! daedalus::include_endpoints!();
//!
//! pub fn app() -> daedalus::Application {
//!     let mut app = EndpointRouteBuilder::new()
//!         .with_generated_thunks(generated_endpoints::THUNKS);
//!     app.map_get("/items/{id}", |id: u64| id);
//!     app.map_post("/items", |item: Json<Item>| item);
//!     app.build().unwrap()
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the component crates
pub use daedalus_core as core;
pub use daedalus_endpoint as endpoint;
pub use daedalus_extract as extract;
pub use daedalus_router as router;

// HTTP types named by generated code
pub use bytes;
pub use http;

pub use daedalus_core::{
    argument, request_delegate, Argument, Container, EndpointError, EndpointResult, HandlerRef, HttpContext,
    IntoEndpointResult, InvocationContext, RequestDelegate,
};
pub use daedalus_endpoint::{
    build_filter_delegate, filter_delegate, filter_factory, filter_factory_fn, filtered_request_delegate, verbs,
    Application, Endpoint, EndpointBuilder, EndpointFilter, EndpointRouteBuilder, FilterDelegate, FilterFactory,
    FilterFactoryContext, MethodResolver, RouteHandlerBuilder, SourceKey, Thunk, ThunkTable,
};
pub use daedalus_extract::{FromRequest, Handler, Inject, Json};

/// Includes the generated endpoint module written by the build script.
///
/// Expands to `include!(concat!(env!("OUT_DIR"), "/daedalus_endpoints.rs"))`.
/// With a custom `generator.output_file`, pass the file name.
#[macro_export]
macro_rules! include_endpoints {
    () => {
        include!(concat!(env!("OUT_DIR"), "/daedalus_endpoints.rs"));
    };
    ($file:literal) => {
        include!(concat!(env!("OUT_DIR"), "/", $file));
    };
}

/// Prelude module for convenient imports.
///
/// ```
/// use daedalus::prelude::*;
///
/// let mut app = EndpointRouteBuilder::new();
/// app.map_get("/health", || "ok");
/// assert_eq!(app.len(), 1);
/// ```
pub mod prelude {
    pub use daedalus_core::{Container, EndpointError, EndpointResult, HttpContext, IntoEndpointResult};
    pub use daedalus_endpoint::{Application, EndpointFilter, EndpointRouteBuilder, RouteHandlerBuilder};
    pub use daedalus_extract::{Inject, Json};
    pub use http::{HeaderMap, Method, StatusCode};
}
