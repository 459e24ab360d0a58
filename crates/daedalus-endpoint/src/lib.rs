//! Endpoint registration and dispatch for Daedalus.
//!
//! Handlers are registered on an [`EndpointRouteBuilder`] through the
//! `map_*` verbs. Each registration records its call site. When the
//! application is built, a call site that has an entry in the generated
//! [`ThunkTable`] gets the generated, statically-typed delegate; every other
//! endpoint runs the generic delegate produced by
//! [`daedalus_extract::Handler`].
//!
//! ```text
//! map_get("/items/{id}", handler)          build()
//!   |                                        |
//!   +-- HandlerRef + generic delegate        +-- thunk for file:line?
//!   +-- Location::caller()                   |     yes: register_metadata, build_invoker
//!                                            |     no:  generic delegate (+ filters)
//!                                            +-- Router + Application
//! ```

mod application;
mod builder;
mod filter;
mod source_key;
pub mod verbs;

pub use application::{Application, Endpoint};
pub use builder::{EndpointBuilder, EndpointRouteBuilder, RouteHandlerBuilder};
pub use filter::{
    build_filter_delegate, filter_delegate, filter_factory, filter_factory_fn, filtered_request_delegate,
    EndpointFilter, FilterDelegate, FilterFactory, FilterFactoryContext,
};
pub use source_key::{SourceKey, Thunk, ThunkTable};
pub use verbs::MethodResolver;
