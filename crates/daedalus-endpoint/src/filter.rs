//! Endpoint filter pipeline.
//!
//! Filters wrap the innermost invocation step of an endpoint. Each filter
//! receives the [`InvocationContext`] and a `next` delegate; it may inspect
//! or replace arguments, short-circuit with its own result, or call `next`.
//!
//! ## Ordering
//!
//! Filters run in registration order: the first registered filter is the
//! outermost one. The chain is composed once, when the application is
//! built, by wrapping the core step in reverse order.

use std::any::type_name;
use std::sync::Arc;

use daedalus_core::{
    request_delegate, Argument, EndpointError, EndpointResult, HttpContext, InvocationContext, RequestDelegate,
};
use http::Method;

use crate::builder::EndpointBuilder;

/// One step of a filter chain.
pub type FilterDelegate =
    Arc<dyn Fn(&mut InvocationContext<'_>) -> Result<EndpointResult, EndpointError> + Send + Sync>;

/// Wraps a closure as a [`FilterDelegate`].
pub fn filter_delegate<F>(f: F) -> FilterDelegate
where
    F: Fn(&mut InvocationContext<'_>) -> Result<EndpointResult, EndpointError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What a filter factory can see about the endpoint it decorates.
#[derive(Debug, Clone, Copy)]
pub struct FilterFactoryContext<'a> {
    /// Route pattern as registered.
    pub pattern: &'a str,
    /// HTTP method, `None` for any.
    pub method: Option<&'a Method>,
}

/// Produces a filter step given the next step.
pub type FilterFactory = Arc<dyn Fn(&FilterFactoryContext<'_>, FilterDelegate) -> FilterDelegate + Send + Sync>;

/// A filter around an endpoint's invocation.
///
/// # Example
///
/// ```rust
/// use daedalus_core::{EndpointError, EndpointResult, InvocationContext};
/// use daedalus_endpoint::{EndpointFilter, FilterDelegate};
/// use http::StatusCode;
///
/// /// Rejects requests whose first argument is negative.
/// struct NonNegative;
///
/// impl EndpointFilter for NonNegative {
///     fn invoke(
///         &self,
///         ctx: &mut InvocationContext<'_>,
///         next: &FilterDelegate,
///     ) -> Result<EndpointResult, EndpointError> {
///         if ctx.argument::<i32>(0).is_some_and(|v| *v < 0) {
///             return Ok(EndpointResult::Status(StatusCode::UNPROCESSABLE_ENTITY));
///         }
///         next(ctx)
///     }
/// }
/// ```
pub trait EndpointFilter: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Runs the filter.
    fn invoke(
        &self,
        ctx: &mut InvocationContext<'_>,
        next: &FilterDelegate,
    ) -> Result<EndpointResult, EndpointError>;
}

/// Wraps a closure as a [`FilterFactory`].
pub fn filter_factory_fn<F>(f: F) -> FilterFactory
where
    F: Fn(&FilterFactoryContext<'_>, FilterDelegate) -> FilterDelegate + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Turns a filter instance into a factory.
pub fn filter_factory<F: EndpointFilter>(filter: F) -> FilterFactory {
    let filter = Arc::new(filter);
    filter_factory_fn(move |_, next| {
        let filter = Arc::clone(&filter);
        filter_delegate(move |ctx| filter.invoke(ctx, &next))
    })
}

/// Composes the builder's filter factories around `core`.
///
/// With no factories this returns `core` unchanged.
#[must_use]
pub fn build_filter_delegate(core: FilterDelegate, builder: &EndpointBuilder) -> FilterDelegate {
    let context = FilterFactoryContext {
        pattern: builder.pattern(),
        method: builder.method(),
    };
    builder
        .filter_factories()
        .iter()
        .rev()
        .fold(core, |next, factory| factory(&context, next))
}

/// Builds the request delegate for a filtered endpoint.
///
/// `bind` produces the arguments (an unbound slot is `None`, and binding
/// failures are expected to have set status 400 already). The filter chain
/// then runs, and its result is written to the context.
pub fn filtered_request_delegate<B>(bind: B, filtered: FilterDelegate) -> RequestDelegate
where
    B: Fn(&mut HttpContext) -> Result<Vec<Argument>, EndpointError> + Send + Sync + 'static,
{
    request_delegate(move |ctx| {
        let arguments = bind(ctx)?;
        let result = {
            let mut invocation = InvocationContext::new(ctx, arguments);
            filtered(&mut invocation)?
        };
        result.execute(ctx)
    })
}

/// Wraps a generic delegate so that filters can run around it.
///
/// The generic path binds its own parameters, so filters see no arguments.
pub(crate) fn filtered_generic_delegate(inner: RequestDelegate, builder: &EndpointBuilder) -> RequestDelegate {
    let core = filter_delegate(move |ctx| {
        inner(ctx.http_mut())?;
        Ok(EndpointResult::Empty)
    });
    filtered_request_delegate(|_| Ok(Vec::new()), build_filter_delegate(core, builder))
}
