//! Generic request extraction for Daedalus.
//!
//! Endpoints without generated code bind their parameters through the
//! [`FromRequest`] trait at runtime. This crate provides that trait, the
//! built-in extractors, and the [`Handler`] adapter that turns closures into
//! registrable endpoints.
//!
//! | Parameter type | Bound from |
//! |---|---|
//! | integers, floats, `bool`, `char`, `String` | route values, by position |
//! | `Option<T>` | like `T`, `None` on failure |
//! | [`Json<T>`] | request body |
//! | [`Inject<T>`] | service container |
//! | `Method`, `HeaderMap`, `Bytes` | the request itself |

mod error;
mod extractor;
mod handler;
mod inject;
mod json;

pub use error::{ExtractionError, ExtractionSource};
pub use extractor::{FromRequest, RouteCursor};
pub use handler::{reject, Handler};
pub use inject::Inject;
pub use json::Json;
