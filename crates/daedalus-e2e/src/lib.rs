//! # Daedalus sample application
//!
//! A small catalog service whose request delegates are generated at build
//! time. `build.rs` runs the generator over `src/`, and the resulting
//! thunk table is handed to the route builder here.
//!
//! The routes cover the cases that matter for delegate selection:
//!
//! - closures and named functions binding route values, services and JSON
//! - an endpoint with a custom extractor, which stays on the generic path
//! - one handler registered on two routes
//! - filtered and unfiltered registrations of the same handler

pub mod filters;
pub mod handlers;
pub mod models;
pub mod routes;

use std::sync::Arc;

use daedalus::{Application, EndpointError, EndpointRouteBuilder};

use crate::models::{Catalog, Item, Probe};

daedalus::include_endpoints!();

/// Builds the application with generated delegates.
pub fn app(probe: Arc<Probe>) -> Result<Application, EndpointError> {
    configure(EndpointRouteBuilder::new().with_generated_thunks(generated_endpoints::THUNKS), probe)
}

/// Builds the same application using only the generic binding path.
pub fn generic_app(probe: Arc<Probe>) -> Result<Application, EndpointError> {
    configure(EndpointRouteBuilder::new(), probe)
}

/// Items the catalog starts with.
pub fn sample_items() -> Vec<Item> {
    vec![
        Item {
            id: 1,
            name: "compass".to_string(),
        },
        Item {
            id: 2,
            name: "sextant".to_string(),
        },
    ]
}

fn configure(mut app: EndpointRouteBuilder, probe: Arc<Probe>) -> Result<Application, EndpointError> {
    app.services_mut().register(Catalog::with_items(sample_items()));
    app.services_mut().register_arc(Arc::clone(&probe));
    routes::map_routes(&mut app, &probe);
    app.build()
}
