//! Service injection extractor.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use daedalus_core::HttpContext;

use crate::error::ExtractionError;
use crate::extractor::{FromRequest, RouteCursor};

/// A service resolved from the application's container.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use daedalus_core::{Container, HttpContext};
/// use daedalus_extract::{FromRequest, Inject, RouteCursor};
/// use http::Method;
///
/// struct Greeter(&'static str);
///
/// let mut container = Container::new();
/// container.register(Greeter("hi"));
///
/// let ctx = HttpContext::builder(Method::GET, "/")
///     .services(Arc::new(container))
///     .build();
///
/// let greeter = Inject::<Greeter>::from_request(&ctx, &mut RouteCursor::default()).unwrap();
/// assert_eq!(greeter.0 .0, "hi");
/// ```
pub struct Inject<T>(pub Arc<T>);

impl<T> Inject<T> {
    /// Returns the shared service.
    #[must_use]
    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T> Clone for Inject<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Inject").field(&self.0).finish()
    }
}

impl<T: Send + Sync + 'static> FromRequest for Inject<T> {
    fn from_request(ctx: &HttpContext, _cursor: &mut RouteCursor) -> Result<Self, ExtractionError> {
        ctx.services()
            .resolve::<T>()
            .map(Inject)
            .ok_or(ExtractionError::MissingService {
                type_name: std::any::type_name::<T>(),
            })
    }
}
