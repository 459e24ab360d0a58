//! Request delegates and type-erased handler references.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::context::HttpContext;
use crate::error::EndpointError;

/// The per-request function an endpoint finally runs.
pub type RequestDelegate = Arc<dyn Fn(&mut HttpContext) -> Result<(), EndpointError> + Send + Sync>;

/// Wraps a closure as a [`RequestDelegate`].
///
/// Passing the closure through this bound keeps its argument lifetime
/// higher-ranked, which a bare `Arc::new(|ctx| ...)` does not infer.
pub fn request_delegate<F>(f: F) -> RequestDelegate
where
    F: Fn(&mut HttpContext) -> Result<(), EndpointError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A type-erased handler captured at registration.
///
/// Registration stores the handler as an `Arc<dyn Fn(..) -> R + Send + Sync>`
/// inside this box. Generated thunks downcast to the exact signature they
/// were generated for; a mismatch means the thunk does not apply.
pub struct HandlerRef {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl HandlerRef {
    /// Erases a handler value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Borrows the handler as `T` if that is what was stored.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Returns the stored type's name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandlerRef").field(&self.type_name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};

    type IntHandler = Arc<dyn Fn(i32) -> i32 + Send + Sync>;

    #[test]
    fn test_handler_ref_downcast() {
        let handler: IntHandler = Arc::new(|x| x * 2);
        let erased = HandlerRef::new(handler);

        let typed = erased.downcast_ref::<IntHandler>().unwrap();
        assert_eq!(typed(21), 42);
        assert!(erased.downcast_ref::<Arc<dyn Fn(i64) -> i64 + Send + Sync>>().is_none());
        assert!(erased.type_name().contains("Fn"));
    }

    #[test]
    fn test_request_delegate() {
        let delegate = request_delegate(|ctx| {
            ctx.set_status(StatusCode::ACCEPTED);
            Ok(())
        });
        let mut ctx = HttpContext::builder(Method::GET, "/").build();
        delegate(&mut ctx).unwrap();
        assert_eq!(ctx.status(), StatusCode::ACCEPTED);
    }
}
