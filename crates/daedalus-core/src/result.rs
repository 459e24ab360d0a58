//! Endpoint results and the conversion trait handlers return through.

use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;

use crate::context::HttpContext;
use crate::error::EndpointError;

/// A response produced by an endpoint, not yet written to the context.
///
/// Filters see the result of the inner step as an `EndpointResult` and may
/// replace it before it is executed.
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointResult {
    /// Writes nothing. The status already on the context is kept.
    Empty,
    /// A `text/plain` body.
    Text(String),
    /// An `application/json` body.
    Json(serde_json::Value),
    /// An `application/octet-stream` body.
    Bytes(Bytes),
    /// A bare status code.
    Status(StatusCode),
    /// An error status with a JSON problem body.
    Problem {
        /// Response status.
        status: StatusCode,
        /// Human-readable detail.
        detail: String,
    },
}

impl EndpointResult {
    /// Serializes `value` into a JSON result.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, EndpointError> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Creates a text result.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Writes the result into the context.
    pub fn execute(self, ctx: &mut HttpContext) -> Result<(), EndpointError> {
        match self {
            Self::Empty => {}
            Self::Text(text) => ctx.write_text(text),
            Self::Json(value) => ctx.write_json(&value)?,
            Self::Bytes(bytes) => ctx.write_body("application/octet-stream", bytes),
            Self::Status(status) => ctx.set_status(status),
            Self::Problem { status, detail } => {
                ctx.set_status(status);
                ctx.write_json(&serde_json::json!({
                    "status": status.as_u16(),
                    "detail": detail,
                }))?;
            }
        }
        Ok(())
    }
}

/// Conversion from a handler's return value into an [`EndpointResult`].
///
/// This is the generic writer: generated code calls it for return types it
/// does not specialize, and the fallback path calls it for every handler.
pub trait IntoEndpointResult {
    /// Performs the conversion.
    fn into_result(self) -> EndpointResult;
}

impl IntoEndpointResult for EndpointResult {
    fn into_result(self) -> EndpointResult {
        self
    }
}

impl IntoEndpointResult for () {
    fn into_result(self) -> EndpointResult {
        EndpointResult::Empty
    }
}

impl IntoEndpointResult for String {
    fn into_result(self) -> EndpointResult {
        EndpointResult::Text(self)
    }
}

impl IntoEndpointResult for &'static str {
    fn into_result(self) -> EndpointResult {
        EndpointResult::Text(self.to_string())
    }
}

impl IntoEndpointResult for char {
    fn into_result(self) -> EndpointResult {
        EndpointResult::Text(self.to_string())
    }
}

impl IntoEndpointResult for Bytes {
    fn into_result(self) -> EndpointResult {
        EndpointResult::Bytes(self)
    }
}

impl IntoEndpointResult for StatusCode {
    fn into_result(self) -> EndpointResult {
        EndpointResult::Status(self)
    }
}

impl IntoEndpointResult for EndpointError {
    fn into_result(self) -> EndpointResult {
        EndpointResult::Problem {
            status: self.status_code(),
            detail: self.to_string(),
        }
    }
}

impl<T, E> IntoEndpointResult for Result<T, E>
where
    T: IntoEndpointResult,
    E: IntoEndpointResult,
{
    fn into_result(self) -> EndpointResult {
        match self {
            Ok(value) => value.into_result(),
            Err(err) => err.into_result(),
        }
    }
}

macro_rules! json_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoEndpointResult for $ty {
                fn into_result(self) -> EndpointResult {
                    EndpointResult::Json(serde_json::Value::from(self))
                }
            }
        )*
    };
}

json_primitive!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool);
