//! Route table.

use std::sync::Arc;

use daedalus::EndpointRouteBuilder;

use crate::filters::{non_negative, Audit};
use crate::handlers;
use crate::models::{Probe, Tenant};

/// Registers every endpoint of the sample application.
pub fn map_routes(app: &mut EndpointRouteBuilder, probe: &Arc<Probe>) {
    app.map_get("/items/{id}", |id: i32| id);
    app.map_get("/tenants/{id}", |id: i32, tenant: Tenant| format!("{}:{id}", tenant.0));

    app.map_get("/catalog/{id}", handlers::get_item);
    app.map_get("/archive/{id}", handlers::get_item);
    app.map_post("/catalog", handlers::create_item);
    app.map_get("/catalog", handlers::count).with_name("catalog-size");

    app.map_get("/guarded/{id}", handlers::guarded)
        .add_endpoint_filter(Audit::new(Arc::clone(probe)))
        .add_filter_factory(non_negative());
    app.map_get("/plain/{id}", handlers::guarded);

    map_shared_line(app);
}

/// Two registrations on one line. Only the first gets a generated thunk; the
/// generator reports the second, which keeps the generic delegate.
#[rustfmt::skip]
fn map_shared_line(app: &mut EndpointRouteBuilder) {
    app.map_get("/pair/a/{x}", |x: i32| x); app.map_get("/pair/b/{y}", |y: i32| y + 1000);
}
