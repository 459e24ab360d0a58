//! The [`FromRequest`] trait and its built-in implementations.
//!
//! This is the binding path used when no generated code applies to an
//! endpoint. Scalar parameters take route values positionally: the first
//! scalar parameter gets the first route value, and so on.

use bytes::Bytes;
use daedalus_core::HttpContext;
use http::{HeaderMap, Method};

use crate::error::{ExtractionError, ExtractionSource};

/// Tracks which route value the next scalar parameter binds to.
#[derive(Debug, Default, Clone, Copy)]
pub struct RouteCursor {
    next: usize,
}

impl RouteCursor {
    /// Returns the current position and advances.
    pub fn advance(&mut self) -> usize {
        let index = self.next;
        self.next += 1;
        index
    }
}

/// Types that can be bound from a request.
///
/// # Implementing `FromRequest`
///
/// ```rust
/// use daedalus_core::HttpContext;
/// use daedalus_extract::{ExtractionError, ExtractionSource, FromRequest, RouteCursor};
///
/// struct ApiVersion(u32);
///
/// impl FromRequest for ApiVersion {
///     fn from_request(ctx: &HttpContext, _cursor: &mut RouteCursor) -> Result<Self, ExtractionError> {
///         let raw = ctx
///             .header("x-api-version")
///             .ok_or_else(|| ExtractionError::missing(ExtractionSource::Header, "x-api-version"))?;
///         raw.parse()
///             .map(ApiVersion)
///             .map_err(|e| ExtractionError::invalid(ExtractionSource::Header, "x-api-version", e.to_string()))
///     }
/// }
/// ```
pub trait FromRequest: Sized {
    /// Binds this type from the request.
    fn from_request(ctx: &HttpContext, cursor: &mut RouteCursor) -> Result<Self, ExtractionError>;
}

// Absent or unconvertible values become `None` instead of failing the request.
impl<T: FromRequest> FromRequest for Option<T> {
    fn from_request(ctx: &HttpContext, cursor: &mut RouteCursor) -> Result<Self, ExtractionError> {
        Ok(T::from_request(ctx, cursor).ok())
    }
}

macro_rules! impl_from_request_for_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromRequest for $ty {
                fn from_request(ctx: &HttpContext, cursor: &mut RouteCursor) -> Result<Self, ExtractionError> {
                    let index = cursor.advance();
                    let raw = ctx
                        .route_values()
                        .value_at(index)
                        .ok_or_else(|| ExtractionError::missing(ExtractionSource::Route, index.to_string()))?;
                    raw.parse::<$ty>()
                        .map_err(|e| ExtractionError::invalid(ExtractionSource::Route, index.to_string(), e.to_string()))
                }
            }
        )*
    };
}

impl_from_request_for_scalar!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, char, String,
);

impl FromRequest for Method {
    fn from_request(ctx: &HttpContext, _cursor: &mut RouteCursor) -> Result<Self, ExtractionError> {
        Ok(ctx.method().clone())
    }
}

impl FromRequest for HeaderMap {
    fn from_request(ctx: &HttpContext, _cursor: &mut RouteCursor) -> Result<Self, ExtractionError> {
        Ok(ctx.headers().clone())
    }
}

impl FromRequest for Bytes {
    fn from_request(ctx: &HttpContext, _cursor: &mut RouteCursor) -> Result<Self, ExtractionError> {
        Ok(ctx.body().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_router::Params;

    fn ctx_with_values(values: &[(&str, &str)]) -> HttpContext {
        let mut params = Params::new();
        for (name, value) in values {
            params.push(*name, *value);
        }
        HttpContext::builder(Method::GET, "/").route_values(params).build()
    }

    #[test]
    fn test_scalars_bind_positionally() {
        let ctx = ctx_with_values(&[("org", "acme"), ("id", "7")]);
        let mut cursor = RouteCursor::default();

        assert_eq!(String::from_request(&ctx, &mut cursor).unwrap(), "acme");
        assert_eq!(u32::from_request(&ctx, &mut cursor).unwrap(), 7);
    }

    #[test]
    fn test_scalar_missing() {
        let ctx = ctx_with_values(&[]);
        let err = i32::from_request(&ctx, &mut RouteCursor::default()).unwrap_err();
        assert!(matches!(err, ExtractionError::Missing { .. }));
    }

    #[test]
    fn test_scalar_invalid() {
        let ctx = ctx_with_values(&[("id", "seven")]);
        let err = i32::from_request(&ctx, &mut RouteCursor::default()).unwrap_err();
        assert!(matches!(err, ExtractionError::Invalid { .. }));
    }

    #[test]
    fn test_option_swallows_failures() {
        let ctx = ctx_with_values(&[("id", "seven")]);
        let value = Option::<i32>::from_request(&ctx, &mut RouteCursor::default()).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_request_parts() {
        let ctx = HttpContext::builder(Method::PUT, "/").body("raw").build();
        let mut cursor = RouteCursor::default();

        assert_eq!(Method::from_request(&ctx, &mut cursor).unwrap(), Method::PUT);
        assert_eq!(Bytes::from_request(&ctx, &mut cursor).unwrap(), Bytes::from("raw"));
        assert!(HeaderMap::from_request(&ctx, &mut cursor).unwrap().is_empty());
    }
}
