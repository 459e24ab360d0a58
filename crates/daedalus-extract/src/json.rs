//! JSON body extractor and response wrapper.

use std::ops::Deref;

use daedalus_core::{EndpointResult, HttpContext, IntoEndpointResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ExtractionError, ExtractionSource};
use crate::extractor::{FromRequest, RouteCursor};

/// Upper bound on bodies the extractor will deserialize (1 MB).
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// A JSON request body or response value.
///
/// # Example
///
/// ```rust
/// use daedalus_core::HttpContext;
/// use daedalus_extract::{FromRequest, Json, RouteCursor};
/// use http::Method;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct CreateItem {
///     name: String,
/// }
///
/// let ctx = HttpContext::builder(Method::POST, "/items")
///     .body(r#"{"name": "lamp"}"#)
///     .build();
///
/// let Json(item) = Json::<CreateItem>::from_request(&ctx, &mut RouteCursor::default()).unwrap();
/// assert_eq!(item.name, "lamp");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Returns the wrapped value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DeserializeOwned> FromRequest for Json<T> {
    fn from_request(ctx: &HttpContext, _cursor: &mut RouteCursor) -> Result<Self, ExtractionError> {
        let body = ctx.body();
        if body.is_empty() {
            return Err(ExtractionError::deserialization(
                ExtractionSource::Body,
                "empty request body",
            ));
        }
        if body.len() > MAX_BODY_SIZE {
            return Err(ExtractionError::deserialization(
                ExtractionSource::Body,
                format!("body of {} bytes exceeds the {MAX_BODY_SIZE} byte limit", body.len()),
            ));
        }
        serde_json::from_slice(body)
            .map(Json)
            .map_err(|e| ExtractionError::deserialization(ExtractionSource::Body, e.to_string()))
    }
}

impl<T: Serialize> IntoEndpointResult for Json<T> {
    fn into_result(self) -> EndpointResult {
        EndpointResult::json(&self.0).unwrap_or_else(|e| e.into_result())
    }
}
