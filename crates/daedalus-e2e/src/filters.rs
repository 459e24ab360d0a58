//! Endpoint filters used by the sample routes.

use std::sync::Arc;

use daedalus::http::StatusCode;
use daedalus::{
    filter_delegate, EndpointError, EndpointFilter, EndpointResult, FilterDelegate, FilterFactoryContext,
    InvocationContext,
};

use crate::models::Probe;

/// Counts every pass through the filter chain.
#[derive(Debug)]
pub struct Audit {
    probe: Arc<Probe>,
}

impl Audit {
    /// Creates a filter reporting to `probe`.
    pub fn new(probe: Arc<Probe>) -> Self {
        Self { probe }
    }
}

impl EndpointFilter for Audit {
    fn invoke(
        &self,
        ctx: &mut InvocationContext<'_>,
        next: &FilterDelegate,
    ) -> Result<EndpointResult, EndpointError> {
        self.probe.record_filter();
        next(ctx)
    }
}

/// Factory for a filter that answers 422 when the first argument is a
/// negative `i32`.
pub fn non_negative() -> impl Fn(&FilterFactoryContext<'_>, FilterDelegate) -> FilterDelegate + Send + Sync + 'static {
    |_: &FilterFactoryContext<'_>, next: FilterDelegate| {
        filter_delegate(move |ctx| {
            if ctx.argument::<i32>(0).is_some_and(|id| *id < 0) {
                return Ok(EndpointResult::Status(StatusCode::UNPROCESSABLE_ENTITY));
            }
            next(ctx)
        })
    }
}
