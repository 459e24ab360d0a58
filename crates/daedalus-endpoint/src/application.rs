//! The built application and request dispatch.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use daedalus_core::{Container, EndpointError, HttpContext, IntoEndpointResult, RequestDelegate};
use daedalus_router::Router;
use http::header::ALLOW;
use http::{HeaderValue, Method, Request, Response, StatusCode};
use tracing::{debug, error};

use crate::builder::EndpointBuilder;

/// A built endpoint.
pub struct Endpoint {
    name: String,
    pattern: String,
    method: Option<Method>,
    metadata: Vec<Arc<dyn Any + Send + Sync>>,
    delegate: RequestDelegate,
    specialized: bool,
}

impl Endpoint {
    pub(crate) fn new(builder: EndpointBuilder, delegate: RequestDelegate, specialized: bool) -> Self {
        let name = builder.display_name();
        let pattern = builder.pattern().to_string();
        let method = builder.method().cloned();
        Self {
            name,
            pattern,
            method,
            metadata: builder.into_metadata(),
            delegate,
            specialized,
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Route pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// HTTP method, `None` for any.
    #[must_use]
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Returns true if the endpoint runs generated code.
    #[must_use]
    pub fn is_specialized(&self) -> bool {
        self.specialized
    }

    /// Returns the most recently added metadata of type `T`.
    #[must_use]
    pub fn metadata<T: Any>(&self) -> Option<&T> {
        self.metadata.iter().rev().find_map(|m| m.downcast_ref::<T>())
    }

    /// The request delegate.
    #[must_use]
    pub fn delegate(&self) -> &RequestDelegate {
        &self.delegate
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("specialized", &self.specialized)
            .finish_non_exhaustive()
    }
}

/// Routes requests to endpoints.
pub struct Application {
    router: Router,
    endpoints: Vec<Endpoint>,
    services: Arc<Container>,
}

impl Application {
    pub(crate) fn new(router: Router, endpoints: Vec<Endpoint>, services: Arc<Container>) -> Self {
        Self {
            router,
            endpoints,
            services,
        }
    }

    /// Built endpoints, in registration order.
    #[must_use]
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Shared services.
    #[must_use]
    pub fn services(&self) -> &Arc<Container> {
        &self.services
    }

    /// Handles one request.
    ///
    /// Unknown paths get 404, known paths without a matching method get 405
    /// with an `Allow` header, and delegate errors become a JSON problem
    /// response with the error's status.
    pub fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let Some((methods, params)) = self.router.match_path(&path) else {
            debug!(%method, path, "no route");
            return status_response(StatusCode::NOT_FOUND);
        };
        let Some(endpoint) = methods.endpoint_for(&method).and_then(|i| self.endpoints.get(i)) else {
            debug!(%method, path, "method not allowed");
            let mut response = status_response(StatusCode::METHOD_NOT_ALLOWED);
            let allow = methods
                .allowed_methods()
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if let Ok(value) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(ALLOW, value);
            }
            return response;
        };

        debug!(
            endpoint = endpoint.name(),
            specialized = endpoint.specialized,
            %method,
            path,
            "dispatching request"
        );
        let mut ctx = HttpContext::from_request(request, params, Arc::clone(&self.services));
        match (endpoint.delegate)(&mut ctx) {
            Ok(()) => ctx.into_response(),
            Err(err) => {
                error!(endpoint = endpoint.name(), error = %err, "endpoint failed");
                problem_response(method, &path, err)
            }
        }
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

fn status_response(status: StatusCode) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}

fn problem_response(method: Method, path: &str, err: EndpointError) -> Response<Bytes> {
    let status = err.status_code();
    let mut ctx = HttpContext::builder(method, path).build();
    match err.into_result().execute(&mut ctx) {
        Ok(()) => ctx.into_response(),
        Err(_) => status_response(status),
    }
}
