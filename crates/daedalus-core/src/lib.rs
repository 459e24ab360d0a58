//! Core types shared by the Daedalus runtime and generated endpoint code.
//!
//! - [`HttpContext`]: the request being handled and the response being built
//! - [`EndpointResult`] and [`IntoEndpointResult`]: what handlers produce
//! - [`InvocationContext`]: bound arguments as seen by endpoint filters
//! - [`HandlerRef`] and [`RequestDelegate`]: erased handlers and the final
//!   per-request functions
//! - [`Container`]: services for injected parameters

pub mod context;
pub mod delegate;
pub mod di;
pub mod error;
pub mod invocation;
pub mod result;

pub use context::{HttpContext, HttpContextBuilder};
pub use delegate::{request_delegate, HandlerRef, RequestDelegate};
pub use di::Container;
pub use error::EndpointError;
pub use invocation::{argument, Argument, InvocationContext};
pub use result::{EndpointResult, IntoEndpointResult};
