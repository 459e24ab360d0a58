//! Error types for endpoint registration and dispatch.

use daedalus_router::PatternError;
use http::StatusCode;
use thiserror::Error;

/// Errors raised while registering or invoking an endpoint.
///
/// Binding failures on a request are not errors: they set status 400 and
/// return normally. These variants cover everything that should surface as a
/// server-side failure instead.
///
/// # Example
///
/// ```
/// use daedalus_core::EndpointError;
/// use http::StatusCode;
///
/// let err = EndpointError::missing_service::<String>();
/// assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
/// assert!(err.to_string().contains("String"));
/// ```
#[derive(Error, Debug)]
pub enum EndpointError {
    /// A requested service was never registered in the container.
    #[error("service not registered: {type_name}")]
    MissingService {
        /// Type name of the missing service.
        type_name: &'static str,
    },

    /// An invocation argument was absent or had an unexpected type.
    #[error("argument {index} is missing or is not a {expected}")]
    ArgumentMismatch {
        /// Position of the argument.
        index: usize,
        /// Type the caller asked for.
        expected: &'static str,
    },

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A route pattern was rejected at registration time.
    #[error("invalid route: {0}")]
    InvalidRoute(#[from] PatternError),

    /// An endpoint ended up with neither a generated nor a generic delegate.
    #[error("no request delegate available for endpoint '{endpoint}'")]
    MissingDelegate {
        /// Display name of the endpoint.
        endpoint: String,
    },

    /// The request could not be bound.
    #[error("bad request: {message}")]
    BadRequest {
        /// Human-readable reason.
        message: String,
    },

    /// Handler-reported failure.
    #[error("handler failed: {message}")]
    Handler {
        /// Human-readable reason.
        message: String,
    },
}

impl EndpointError {
    /// Creates a missing service error for `T`.
    #[must_use]
    pub fn missing_service<T: ?Sized>() -> Self {
        Self::MissingService {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Creates an argument mismatch error for `T` at `index`.
    #[must_use]
    pub fn argument_mismatch<T: ?Sized>(index: usize) -> Self {
        Self::ArgumentMismatch {
            index,
            expected: std::any::type_name::<T>(),
        }
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a handler error.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    /// Returns the HTTP status this error maps to.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::MissingService { .. }
            | Self::ArgumentMismatch { .. }
            | Self::Json(_)
            | Self::InvalidRoute(_)
            | Self::MissingDelegate { .. }
            | Self::Handler { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_router::RoutePattern;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            EndpointError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            EndpointError::handler("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_argument_mismatch_names_type() {
        let err = EndpointError::argument_mismatch::<i32>(2);
        assert_eq!(err.to_string(), "argument 2 is missing or is not a i32");
    }

    #[test]
    fn test_from_pattern_error() {
        let err: EndpointError = RoutePattern::parse("nope").unwrap_err().into();
        assert!(matches!(err, EndpointError::InvalidRoute(_)));
        assert!(err.to_string().starts_with("invalid route:"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("oops").unwrap_err();
        let err: EndpointError = json_err.into();
        assert!(matches!(err, EndpointError::Json(_)));
    }
}
