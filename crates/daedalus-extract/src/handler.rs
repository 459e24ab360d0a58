//! Handler adapters for plain closures and functions.
//!
//! Any `Fn(A1, .., An) -> R` with up to eight [`FromRequest`] parameters and
//! an [`IntoEndpointResult`] return is a [`Handler`]. Registering one yields
//! two things:
//!
//! - a [`HandlerRef`] holding the handler as
//!   `Arc<dyn Fn(A1, .., An) -> R + Send + Sync>`, the exact shape generated
//!   thunks downcast to
//! - a generic [`RequestDelegate`] that binds through [`FromRequest`], used
//!   when no generated thunk applies

use std::sync::Arc;

use daedalus_core::{request_delegate, EndpointError, HandlerRef, HttpContext, IntoEndpointResult, RequestDelegate};

use crate::error::ExtractionError;
use crate::extractor::{FromRequest, RouteCursor};

/// A value that can be registered as an endpoint handler.
///
/// `Args` is the parameter tuple; it only exists to keep the blanket
/// implementations for different arities apart.
pub trait Handler<Args>: Send + Sync + Sized + 'static {
    /// Splits the handler into its erased form and its generic delegate.
    fn into_parts(self) -> (HandlerRef, RequestDelegate);
}

/// Answers a failed binding.
///
/// Client errors become a 400 with the reason as text. A missing service is
/// a server error and propagates.
pub fn reject(ctx: &mut HttpContext, err: ExtractionError) -> Result<(), EndpointError> {
    if let ExtractionError::MissingService { type_name } = err {
        return Err(EndpointError::MissingService { type_name });
    }
    ctx.set_status(err.status_code());
    ctx.write_text(err.to_string());
    Ok(())
}

macro_rules! impl_handler {
    ($($ty:ident),*) => {
        impl<F, R, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> R + Send + Sync + 'static,
            R: IntoEndpointResult + 'static,
            $($ty: FromRequest + 'static,)*
        {
            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_parts(self) -> (HandlerRef, RequestDelegate) {
                let handler: Arc<dyn Fn($($ty),*) -> R + Send + Sync> = Arc::new(self);
                let erased = HandlerRef::new(Arc::clone(&handler));
                let delegate = request_delegate(move |ctx: &mut HttpContext| {
                    let mut cursor = RouteCursor::default();
                    $(
                        let $ty = match <$ty as FromRequest>::from_request(ctx, &mut cursor) {
                            Ok(value) => value,
                            Err(err) => return reject(ctx, err),
                        };
                    )*
                    handler($($ty),*).into_result().execute(ctx)
                });
                (erased, delegate)
            }
        }
    };
}

impl_handler!();
impl_handler!(A1);
impl_handler!(A1, A2);
impl_handler!(A1, A2, A3);
impl_handler!(A1, A2, A3, A4);
impl_handler!(A1, A2, A3, A4, A5);
impl_handler!(A1, A2, A3, A4, A5, A6);
impl_handler!(A1, A2, A3, A4, A5, A6, A7);
impl_handler!(A1, A2, A3, A4, A5, A6, A7, A8);
