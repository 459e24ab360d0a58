//! Extraction error types.

use std::fmt;

use daedalus_core::EndpointError;
use http::StatusCode;

/// Where a value was being extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Route values (`/items/{id}`).
    Route,
    /// Query string.
    Query,
    /// Request body.
    Body,
    /// Request headers.
    Header,
    /// Service container.
    Service,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route => write!(f, "route"),
            Self::Query => write!(f, "query"),
            Self::Body => write!(f, "body"),
            Self::Header => write!(f, "header"),
            Self::Service => write!(f, "service"),
        }
    }
}

/// Error that occurs while binding one handler parameter.
///
/// # Example
///
/// ```rust
/// use daedalus_extract::{ExtractionError, ExtractionSource};
/// use http::StatusCode;
///
/// let err = ExtractionError::missing(ExtractionSource::Route, "id");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.to_string(), "missing required route value: id");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// A required value is absent.
    #[error("missing required {origin} value: {field}")]
    Missing {
        /// Where the value was expected.
        origin: ExtractionSource,
        /// Name or position of the value.
        field: String,
    },

    /// A value is present but could not be converted.
    #[error("invalid {origin} value '{field}': {details}")]
    Invalid {
        /// Where the value came from.
        origin: ExtractionSource,
        /// Name or position of the value.
        field: String,
        /// What went wrong.
        details: String,
    },

    /// The body could not be deserialized.
    #[error("failed to deserialize {origin}: {details}")]
    Deserialization {
        /// Where the value came from.
        origin: ExtractionSource,
        /// Deserializer message.
        details: String,
    },

    /// An injected service is not registered.
    #[error("service not registered: {type_name}")]
    MissingService {
        /// Type name of the service.
        type_name: &'static str,
    },
}

impl ExtractionError {
    /// Creates an error for a missing value.
    pub fn missing(origin: ExtractionSource, field: impl Into<String>) -> Self {
        Self::Missing {
            origin,
            field: field.into(),
        }
    }

    /// Creates an error for an unconvertible value.
    pub fn invalid(origin: ExtractionSource, field: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Invalid {
            origin,
            field: field.into(),
            details: details.into(),
        }
    }

    /// Creates an error for a failed deserialization.
    pub fn deserialization(origin: ExtractionSource, details: impl Into<String>) -> Self {
        Self::Deserialization {
            origin,
            details: details.into(),
        }
    }

    /// Returns the source the failing value was read from.
    #[must_use]
    pub fn extraction_source(&self) -> ExtractionSource {
        match self {
            Self::Missing { origin, .. }
            | Self::Invalid { origin, .. }
            | Self::Deserialization { origin, .. } => *origin,
            Self::MissingService { .. } => ExtractionSource::Service,
        }
    }

    /// Returns the status this error answers with.
    ///
    /// A missing service is a server misconfiguration, not a client error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingService { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ExtractionError> for EndpointError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::MissingService { type_name } => EndpointError::MissingService { type_name },
            other => EndpointError::bad_request(other.to_string()),
        }
    }
}
