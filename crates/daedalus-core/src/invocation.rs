//! Filter-visible view of one handler invocation.
//!
//! When an endpoint has filters, its parameters are bound before the filter
//! chain runs and stored here as type-erased arguments. Filters may inspect
//! or replace them; the innermost step takes them back out by position and
//! type to call the handler.

use std::any::Any;
use std::fmt;

use crate::context::HttpContext;
use crate::error::EndpointError;

/// A bound argument. `None` marks a parameter that failed to bind.
pub type Argument = Option<Box<dyn Any>>;

/// Boxes an optional value into an [`Argument`].
#[must_use]
pub fn argument<T: 'static>(value: Option<T>) -> Argument {
    value.map(|v| Box::new(v) as Box<dyn Any>)
}

/// The HTTP context plus the bound arguments of one invocation.
///
/// # Example
///
/// ```rust
/// use daedalus_core::{argument, HttpContext, InvocationContext};
/// use http::Method;
///
/// let mut http = HttpContext::builder(Method::GET, "/items/3").build();
/// let mut ctx = InvocationContext::new(&mut http, vec![argument(Some(3_i32))]);
///
/// assert_eq!(ctx.argument::<i32>(0), Some(&3));
/// assert_eq!(ctx.take_argument::<i32>(0).unwrap(), 3);
/// assert!(ctx.take_argument::<i32>(0).is_err());
/// ```
pub struct InvocationContext<'a> {
    http: &'a mut HttpContext,
    arguments: Vec<Argument>,
}

impl<'a> InvocationContext<'a> {
    /// Creates an invocation context.
    pub fn new(http: &'a mut HttpContext, arguments: Vec<Argument>) -> Self {
        Self { http, arguments }
    }

    /// Returns the HTTP context.
    #[must_use]
    pub fn http(&self) -> &HttpContext {
        &*self.http
    }

    /// Returns the HTTP context mutably.
    pub fn http_mut(&mut self) -> &mut HttpContext {
        &mut *self.http
    }

    /// Returns the number of argument slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    /// Returns true if the handler takes no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Returns true if the argument at `index` is bound.
    #[must_use]
    pub fn is_bound(&self, index: usize) -> bool {
        matches!(self.arguments.get(index), Some(Some(_)))
    }

    /// Borrows an argument by position and type.
    #[must_use]
    pub fn argument<T: 'static>(&self, index: usize) -> Option<&T> {
        self.arguments.get(index)?.as_ref()?.downcast_ref()
    }

    /// Mutably borrows an argument by position and type.
    pub fn argument_mut<T: 'static>(&mut self, index: usize) -> Option<&mut T> {
        self.arguments.get_mut(index)?.as_mut()?.downcast_mut()
    }

    /// Replaces the argument at `index`. Out-of-range indices are ignored.
    pub fn replace_argument<T: 'static>(&mut self, index: usize, value: T) {
        if let Some(slot) = self.arguments.get_mut(index) {
            *slot = Some(Box::new(value));
        }
    }

    /// Moves an argument out by position and type.
    ///
    /// A slot that is empty, already taken, or holds another type yields
    /// [`EndpointError::ArgumentMismatch`] and is left untouched.
    pub fn take_argument<T: 'static>(&mut self, index: usize) -> Result<T, EndpointError> {
        let slot = self
            .arguments
            .get_mut(index)
            .ok_or_else(|| EndpointError::argument_mismatch::<T>(index))?;
        match slot.take().map(Box::<dyn Any>::downcast::<T>) {
            Some(Ok(value)) => Ok(*value),
            Some(Err(other)) => {
                *slot = Some(other);
                Err(EndpointError::argument_mismatch::<T>(index))
            }
            None => Err(EndpointError::argument_mismatch::<T>(index)),
        }
    }
}

impl fmt::Debug for InvocationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("path", &self.http.path())
            .field("arguments", &self.arguments.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};

    #[test]
    fn test_unbound_argument() {
        let mut http = HttpContext::builder(Method::GET, "/").build();
        let ctx = InvocationContext::new(&mut http, vec![argument::<i32>(None), argument(Some(1_u8))]);

        assert_eq!(ctx.len(), 2);
        assert!(!ctx.is_bound(0));
        assert!(ctx.is_bound(1));
        assert_eq!(ctx.argument::<i32>(0), None);
    }

    #[test]
    fn test_wrong_type_keeps_value() {
        let mut http = HttpContext::builder(Method::GET, "/").build();
        let mut ctx = InvocationContext::new(&mut http, vec![argument(Some(String::from("x")))]);

        assert!(matches!(
            ctx.take_argument::<i32>(0),
            Err(EndpointError::ArgumentMismatch { index: 0, .. })
        ));
        assert_eq!(ctx.take_argument::<String>(0).unwrap(), "x");
    }

    #[test]
    fn test_replace_and_mutate() {
        let mut http = HttpContext::builder(Method::GET, "/").build();
        let mut ctx = InvocationContext::new(&mut http, vec![argument(Some(1_i32))]);

        *ctx.argument_mut::<i32>(0).unwrap() += 1;
        assert_eq!(ctx.argument::<i32>(0), Some(&2));

        ctx.replace_argument(0, 10_i32);
        ctx.replace_argument(5, 99_i32);
        assert_eq!(ctx.take_argument::<i32>(0).unwrap(), 10);
    }

    #[test]
    fn test_http_access() {
        let mut http = HttpContext::builder(Method::GET, "/").build();
        {
            let mut ctx = InvocationContext::new(&mut http, Vec::new());
            assert!(ctx.is_empty());
            ctx.http_mut().set_status(StatusCode::BAD_REQUEST);
            assert_eq!(ctx.http().status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(http.status(), StatusCode::BAD_REQUEST);
    }
}
