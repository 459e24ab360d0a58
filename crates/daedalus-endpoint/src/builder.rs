//! Endpoint registration.

use std::any::Any;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use daedalus_core::{Container, EndpointError, HandlerRef, RequestDelegate};
use daedalus_extract::Handler;
use daedalus_router::{PatternError, RoutePattern, Router};
use http::Method;
use tracing::debug;

use crate::application::{Application, Endpoint};
use crate::filter::{
    filter_factory, filter_factory_fn, filtered_generic_delegate, EndpointFilter, FilterDelegate,
    FilterFactoryContext, FilterFactory,
};
use crate::source_key::{find_thunk, ThunkTable};
use crate::verbs::{self, MethodResolver};

/// Everything known about one endpoint while the application is assembled.
///
/// Generated `register_metadata` thunks add to it; `build_invoker` thunks
/// read it to decide between the filtered and the unfiltered delegate.
pub struct EndpointBuilder {
    pattern: String,
    method: Option<Method>,
    name: Option<String>,
    metadata: Vec<Arc<dyn Any + Send + Sync>>,
    filter_factories: Vec<FilterFactory>,
}

impl EndpointBuilder {
    /// Creates a builder for `pattern`. `method` is `None` for any method.
    pub fn new(pattern: impl Into<String>, method: Option<Method>) -> Self {
        Self {
            pattern: pattern.into(),
            method,
            name: None,
            metadata: Vec::new(),
            filter_factories: Vec::new(),
        }
    }

    /// Route pattern as registered.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// HTTP method, `None` for any.
    #[must_use]
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Explicit endpoint name, if one was set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The explicit name, or `"METHOD /pattern"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.name, &self.method) {
            (Some(name), _) => name.clone(),
            (None, Some(method)) => format!("{method} {}", self.pattern),
            (None, None) => format!("ANY {}", self.pattern),
        }
    }

    /// Sets the endpoint name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Attaches a metadata value.
    pub fn add_metadata<T: Any + Send + Sync>(&mut self, value: T) {
        self.metadata.push(Arc::new(value));
    }

    /// Returns the most recently added metadata of type `T`.
    #[must_use]
    pub fn metadata_of<T: Any>(&self) -> Option<&T> {
        self.metadata.iter().rev().find_map(|m| m.downcast_ref::<T>())
    }

    /// Adds a filter factory. Factories run in the order they were added.
    pub fn add_filter_factory(&mut self, factory: FilterFactory) {
        self.filter_factories.push(factory);
    }

    /// Registered filter factories.
    #[must_use]
    pub fn filter_factories(&self) -> &[FilterFactory] {
        &self.filter_factories
    }

    /// Returns true if at least one filter factory is registered.
    #[must_use]
    pub fn has_filters(&self) -> bool {
        !self.filter_factories.is_empty()
    }

    pub(crate) fn into_metadata(self) -> Vec<Arc<dyn Any + Send + Sync>> {
        self.metadata
    }
}

impl fmt::Debug for EndpointBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointBuilder")
            .field("pattern", &self.pattern)
            .field("method", &self.method)
            .field("name", &self.name)
            .field("metadata", &self.metadata.len())
            .field("filter_factories", &self.filter_factories.len())
            .finish()
    }
}

struct Registration {
    builder: EndpointBuilder,
    pattern: Result<RoutePattern, PatternError>,
    handler: HandlerRef,
    fallback: Option<RequestDelegate>,
    location: &'static Location<'static>,
}

/// Collects endpoint registrations and builds an [`Application`].
///
/// # Example
///
/// ```rust
/// use bytes::Bytes;
/// use daedalus_endpoint::EndpointRouteBuilder;
/// use http::{Request, StatusCode};
///
/// let mut app = EndpointRouteBuilder::new();
/// app.map_get("/items/{id}", |id: i32| id * 10);
///
/// let app = app.build().unwrap();
/// let response = app.handle(Request::get("/items/4").body(Bytes::new()).unwrap());
///
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.body().as_ref(), b"40");
/// ```
pub struct EndpointRouteBuilder {
    registrations: Vec<Registration>,
    thunks: ThunkTable,
    services: Container,
}

impl EndpointRouteBuilder {
    /// Creates an empty builder without generated code.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            thunks: &[],
            services: Container::new(),
        }
    }

    /// Uses a generated thunk table for delegate selection.
    #[must_use]
    pub fn with_generated_thunks(mut self, thunks: ThunkTable) -> Self {
        self.thunks = thunks;
        self
    }

    /// The service container handed to every request.
    pub fn services_mut(&mut self) -> &mut Container {
        &mut self.services
    }

    /// Registers a `GET` endpoint.
    #[track_caller]
    pub fn map_get<H, Args>(&mut self, pattern: &str, handler: H) -> RouteHandlerBuilder<'_>
    where
        H: Handler<Args>,
    {
        self.map_with(pattern, handler, verbs::get, Location::caller())
    }

    /// Registers a `POST` endpoint.
    #[track_caller]
    pub fn map_post<H, Args>(&mut self, pattern: &str, handler: H) -> RouteHandlerBuilder<'_>
    where
        H: Handler<Args>,
    {
        self.map_with(pattern, handler, verbs::post, Location::caller())
    }

    /// Registers a `PUT` endpoint.
    #[track_caller]
    pub fn map_put<H, Args>(&mut self, pattern: &str, handler: H) -> RouteHandlerBuilder<'_>
    where
        H: Handler<Args>,
    {
        self.map_with(pattern, handler, verbs::put, Location::caller())
    }

    /// Registers a `DELETE` endpoint.
    #[track_caller]
    pub fn map_delete<H, Args>(&mut self, pattern: &str, handler: H) -> RouteHandlerBuilder<'_>
    where
        H: Handler<Args>,
    {
        self.map_with(pattern, handler, verbs::delete, Location::caller())
    }

    /// Registers a `PATCH` endpoint.
    #[track_caller]
    pub fn map_patch<H, Args>(&mut self, pattern: &str, handler: H) -> RouteHandlerBuilder<'_>
    where
        H: Handler<Args>,
    {
        self.map_with(pattern, handler, verbs::patch, Location::caller())
    }

    /// Registers an endpoint for any method, or for the method named by a
    /// `"METHOD /path"` pattern.
    #[track_caller]
    pub fn map<H, Args>(&mut self, pattern: &str, handler: H) -> RouteHandlerBuilder<'_>
    where
        H: Handler<Args>,
    {
        self.map_with(pattern, handler, verbs::any, Location::caller())
    }

    fn map_with<H, Args>(
        &mut self,
        pattern: &str,
        handler: H,
        resolve: MethodResolver,
        location: &'static Location<'static>,
    ) -> RouteHandlerBuilder<'_>
    where
        H: Handler<Args>,
    {
        let (handler, fallback) = handler.into_parts();
        self.map_core(pattern, handler, Some(fallback), resolve, location)
    }

    /// Registers an endpoint from its parts.
    ///
    /// Every `map_*` method and every generated overload ends up here.
    /// `fallback` is the generic delegate used when no generated thunk
    /// applies. `location` is the registration call site, matched against
    /// generated source keys. An invalid pattern is reported by
    /// [`build`](Self::build).
    pub fn map_core(
        &mut self,
        pattern: &str,
        handler: HandlerRef,
        fallback: Option<RequestDelegate>,
        resolve: MethodResolver,
        location: &'static Location<'static>,
    ) -> RouteHandlerBuilder<'_> {
        let (method, pattern) = resolve(pattern);
        let parsed = RoutePattern::parse(pattern);
        self.registrations.push(Registration {
            builder: EndpointBuilder::new(pattern, method),
            pattern: parsed,
            handler,
            fallback,
            location,
        });
        let index = self.registrations.len() - 1;
        RouteHandlerBuilder {
            builder: &mut self.registrations[index].builder,
        }
    }

    /// Number of registrations so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns true if nothing was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Selects a delegate for every endpoint and builds the application.
    ///
    /// An endpoint whose call site has a generated thunk runs
    /// `register_metadata` and then `build_invoker`, once. Otherwise, or if
    /// the thunk rejects the handler, the generic delegate is used and
    /// wrapped in the endpoint's filters.
    pub fn build(self) -> Result<Application, EndpointError> {
        let mut router = Router::new();
        let mut endpoints = Vec::with_capacity(self.registrations.len());

        for (index, registration) in self.registrations.into_iter().enumerate() {
            let Registration {
                mut builder,
                pattern,
                handler,
                fallback,
                location,
            } = registration;
            let pattern = pattern?;

            let mut delegate = None;
            if let Some((key, thunk)) = find_thunk(self.thunks, location) {
                (thunk.register_metadata)(&handler, &mut builder);
                delegate = (thunk.build_invoker)(&handler, &builder);
                if delegate.is_none() {
                    debug!(%key, handler = handler.type_name(), "generated thunk does not match handler");
                }
            }

            let specialized = delegate.is_some();
            let delegate = match delegate {
                Some(delegate) => delegate,
                None => {
                    let fallback = fallback.ok_or_else(|| EndpointError::MissingDelegate {
                        endpoint: builder.display_name(),
                    })?;
                    if builder.has_filters() {
                        filtered_generic_delegate(fallback, &builder)
                    } else {
                        fallback
                    }
                }
            };

            debug!(
                endpoint = %builder.display_name(),
                specialized,
                filters = builder.filter_factories().len(),
                "endpoint built"
            );
            router.route(builder.method().cloned(), &pattern, index);
            endpoints.push(Endpoint::new(builder, delegate, specialized));
        }

        Ok(Application::new(router, endpoints, Arc::new(self.services)))
    }
}

impl Default for EndpointRouteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EndpointRouteBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointRouteBuilder")
            .field("registrations", &self.registrations.len())
            .field("thunks", &self.thunks.len())
            .field("services", &self.services)
            .finish()
    }
}

/// Per-endpoint conventions, returned by every `map_*` call.
pub struct RouteHandlerBuilder<'a> {
    builder: &'a mut EndpointBuilder,
}

impl RouteHandlerBuilder<'_> {
    /// Adds a filter.
    pub fn add_endpoint_filter<F: EndpointFilter>(self, filter: F) -> Self {
        self.builder.add_filter_factory(filter_factory(filter));
        self
    }

    /// Adds a filter factory.
    pub fn add_filter_factory<F>(self, factory: F) -> Self
    where
        F: Fn(&FilterFactoryContext<'_>, FilterDelegate) -> FilterDelegate + Send + Sync + 'static,
    {
        self.builder.add_filter_factory(filter_factory_fn(factory));
        self
    }

    /// Attaches a metadata value.
    pub fn with_metadata<T: Any + Send + Sync>(self, value: T) -> Self {
        self.builder.add_metadata(value);
        self
    }

    /// Names the endpoint.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.builder.set_name(name);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::filter_delegate;
    use crate::source_key::{SourceKey, Thunk};
    use bytes::Bytes;
    use daedalus_core::{request_delegate, EndpointResult};
    use http::{Request, StatusCode};

    fn get(app: &Application, uri: &str) -> http::Response<Bytes> {
        app.handle(Request::get(uri).body(Bytes::new()).unwrap())
    }

    #[test]
    fn test_generic_registration() {
        let mut app = EndpointRouteBuilder::new();
        let _ = app.map_get("/items/{id}", |id: i32| id + 1);
        let app = app.build().unwrap();

        let response = get(&app, "/items/1");
        assert_eq!(response.body().as_ref(), b"2");
        assert!(!app.endpoints()[0].is_specialized());
    }

    #[test]
    fn test_invalid_pattern_surfaces_at_build() {
        let mut app = EndpointRouteBuilder::new();
        let _ = app.map_get("items", || "x");
        assert!(matches!(app.build(), Err(EndpointError::InvalidRoute(_))));
    }

    #[test]
    fn test_missing_delegate() {
        let mut app = EndpointRouteBuilder::new();
        let _ = app.map_core("/x", HandlerRef::new(()), None, verbs::get, Location::caller());
        assert!(matches!(app.build(), Err(EndpointError::MissingDelegate { .. })));
    }

    #[test]
    fn test_builder_conventions() {
        struct Tag(&'static str);

        let mut app = EndpointRouteBuilder::new();
        let _ = app
            .map_post("/tags", || ())
            .with_name("create-tag")
            .with_metadata(Tag("a"))
            .with_metadata(Tag("b"));
        let app = app.build().unwrap();

        let endpoint = &app.endpoints()[0];
        assert_eq!(endpoint.name(), "create-tag");
        assert_eq!(endpoint.metadata::<Tag>().map(|t| t.0), Some("b"));
    }

    #[test]
    fn test_map_with_method_prefix() {
        let mut app = EndpointRouteBuilder::new();
        let _ = app.map("DELETE /items/{id}", |_id: u64| StatusCode::NO_CONTENT);
        let app = app.build().unwrap();

        let response = app.handle(Request::delete("/items/9").body(Bytes::new()).unwrap());
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(get(&app, "/items/9").status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    struct Marker;

    fn register_marker(_: &HandlerRef, builder: &mut EndpointBuilder) {
        builder.add_metadata(Marker);
    }

    fn build_text(handler: &HandlerRef, builder: &EndpointBuilder) -> Option<RequestDelegate> {
        let handler = handler.downcast_ref::<Arc<dyn Fn() -> &'static str + Send + Sync>>()?.clone();
        if builder.has_filters() {
            return None;
        }
        Some(request_delegate(move |ctx| {
            ctx.write_text(format!("generated:{}", handler()));
            Ok(())
        }))
    }

    fn table_at(line: u32, column: u32) -> ThunkTable {
        Box::leak(Box::new([(
            SourceKey::new(file!(), line, column),
            Thunk {
                register_metadata: register_marker,
                build_invoker: build_text,
            },
        )]))
    }

    #[test]
    fn test_thunk_selected_by_call_site() {
        let line = line!() + 3;
        let table = table_at(line, 21);
        let mut app = EndpointRouteBuilder::new().with_generated_thunks(table);
        let _ = app.map_get("/hello", || "hi");
        let _ = app.map_get("/other", || "plain");
        let app = app.build().unwrap();

        assert_eq!(get(&app, "/hello").body().as_ref(), b"generated:hi");
        assert_eq!(get(&app, "/other").body().as_ref(), b"plain");
        assert!(app.endpoints()[0].is_specialized());
        assert!(app.endpoints()[0].metadata::<Marker>().is_some());
        assert!(!app.endpoints()[1].is_specialized());
    }

    #[test]
    fn test_thunk_rejecting_handler_falls_back() {
        let line = line!() + 3;
        let table = table_at(line, 21);
        let mut app = EndpointRouteBuilder::new().with_generated_thunks(table);
        let _ = app.map_get("/hello", || String::from("owned"));
        let app = app.build().unwrap();

        assert_eq!(get(&app, "/hello").body().as_ref(), b"owned");
        assert!(!app.endpoints()[0].is_specialized());
    }

    #[test]
    #[rustfmt::skip]
    fn test_thunk_applies_only_to_its_column() {
        let line = line!() + 3;
        let table = table_at(line, 21);
        let mut app = EndpointRouteBuilder::new().with_generated_thunks(table);
        let _ = app.map_get("/a", || "a"); let _ = app.map_get("/b", || "b");
        let app = app.build().unwrap();

        assert_eq!(get(&app, "/a").body().as_ref(), b"generated:a");
        assert_eq!(get(&app, "/b").body().as_ref(), b"b");
        assert!(app.endpoints()[0].is_specialized());
        assert!(!app.endpoints()[1].is_specialized());
        assert!(app.endpoints()[1].metadata::<Marker>().is_none());
    }

    #[test]
    fn test_filters_wrap_generic_delegate() {
        let mut app = EndpointRouteBuilder::new();
        let _ = app
            .map_get("/guarded", || "secret")
            .add_filter_factory(|_, _next| filter_delegate(|_| Ok(EndpointResult::Status(StatusCode::FORBIDDEN))));
        let app = app.build().unwrap();

        let response = get(&app, "/guarded");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.body().is_empty());
    }
}
