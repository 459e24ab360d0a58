//! Per-request HTTP context.
//!
//! [`HttpContext`] carries the request being handled and the response being
//! built. Request delegates read from it and write to it in place; the
//! application turns it into an `http::Response` when the delegate returns.

use std::sync::Arc;

use bytes::Bytes;
use daedalus_router::Params;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::di::Container;
use crate::error::EndpointError;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// Request and response state for one invocation.
///
/// # Example
///
/// ```rust
/// use daedalus_core::HttpContext;
/// use daedalus_router::Params;
/// use http::{Method, StatusCode};
///
/// let mut params = Params::new();
/// params.push("id", "42");
///
/// let mut ctx = HttpContext::builder(Method::GET, "/items/42?verbose=true")
///     .route_values(params)
///     .build();
///
/// assert_eq!(ctx.route_value("id"), Some("42"));
/// assert_eq!(ctx.query_value("verbose"), Some("true"));
///
/// ctx.write_text("hello");
/// assert_eq!(ctx.status(), StatusCode::OK);
/// assert_eq!(ctx.response_body().as_ref(), b"hello");
/// ```
#[derive(Debug)]
pub struct HttpContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    route_values: Params,
    query: Vec<(String, String)>,
    services: Arc<Container>,
    status: StatusCode,
    response_headers: HeaderMap,
    response_body: Bytes,
}

impl HttpContext {
    /// Creates a context from an incoming request.
    #[must_use]
    pub fn from_request(request: Request<Bytes>, route_values: Params, services: Arc<Container>) -> Self {
        let (parts, body) = request.into_parts();
        let query = parts.uri.query().map(parse_query).unwrap_or_default();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            route_values,
            query,
            services,
            status: StatusCode::OK,
            response_headers: HeaderMap::new(),
            response_body: Bytes::new(),
        }
    }

    /// Starts building a context by hand, mostly for tests.
    #[must_use]
    pub fn builder(method: Method, uri: &str) -> HttpContextBuilder {
        HttpContextBuilder::new(method, uri)
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a request header as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the raw request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns all route values.
    #[must_use]
    pub fn route_values(&self) -> &Params {
        &self.route_values
    }

    /// Returns a route value by name.
    #[must_use]
    pub fn route_value(&self, name: &str) -> Option<&str> {
        self.route_values.get(name)
    }

    /// Returns the first query value with this name.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the service container.
    #[must_use]
    pub fn services(&self) -> &Container {
        &self.services
    }

    /// Deserializes the request body as JSON.
    pub fn read_json<T: DeserializeOwned>(&self) -> Result<T, EndpointError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns the response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns the response headers.
    #[must_use]
    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// Sets a response header, replacing existing values.
    pub fn insert_response_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response_headers.insert(name, value);
    }

    /// Returns the response body written so far.
    #[must_use]
    pub fn response_body(&self) -> &Bytes {
        &self.response_body
    }

    /// Writes a plain text body.
    pub fn write_text(&mut self, text: impl AsRef<str>) {
        self.write_body(TEXT_PLAIN, Bytes::copy_from_slice(text.as_ref().as_bytes()));
    }

    /// Serializes `value` as the JSON body.
    pub fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EndpointError> {
        let body = serde_json::to_vec(value)?;
        self.write_body(APPLICATION_JSON, Bytes::from(body));
        Ok(())
    }

    /// Writes a body with an explicit content type.
    pub fn write_body(&mut self, content_type: &'static str, body: Bytes) {
        self.response_headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.response_body = body;
    }

    /// Converts the response half of the context into an `http::Response`.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.response_body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.response_headers;
        response
    }
}

/// Builder for hand-assembled contexts.
#[derive(Debug)]
pub struct HttpContextBuilder {
    request: Request<Bytes>,
    route_values: Params,
    services: Arc<Container>,
}

impl HttpContextBuilder {
    fn new(method: Method, uri: &str) -> Self {
        let mut request = Request::new(Bytes::new());
        *request.method_mut() = method;
        // An unparsable URI leaves the default "/" in place.
        if let Ok(uri) = uri.parse() {
            *request.uri_mut() = uri;
        }
        Self {
            request,
            route_values: Params::new(),
            services: Arc::new(Container::new()),
        }
    }

    /// Sets a request header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.request.headers_mut().insert(name, value);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        *self.request.body_mut() = body.into();
        self
    }

    /// Sets the route values.
    #[must_use]
    pub fn route_values(mut self, route_values: Params) -> Self {
        self.route_values = route_values;
        self
    }

    /// Sets the service container.
    #[must_use]
    pub fn services(mut self, services: Arc<Container>) -> Self {
        self.services = services;
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> HttpContext {
        HttpContext::from_request(self.request, self.route_values, self.services)
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    serde_urlencoded::from_str(query).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_values_are_decoded() {
        let ctx = HttpContext::builder(Method::GET, "/search?q=hello%20world&page=2&q=second").build();
        assert_eq!(ctx.query_value("q"), Some("hello world"));
        assert_eq!(ctx.query_value("page"), Some("2"));
        assert_eq!(ctx.query_value("missing"), None);
    }

    #[test]
    fn test_read_json_body() {
        let ctx = HttpContext::builder(Method::POST, "/items")
            .body(r#"{"name":"widget"}"#)
            .build();
        let value: serde_json::Value = ctx.read_json().unwrap();
        assert_eq!(value["name"], "widget");
    }

    #[test]
    fn test_read_json_invalid_body() {
        let ctx = HttpContext::builder(Method::POST, "/items").body("not json").build();
        assert!(matches!(
            ctx.read_json::<serde_json::Value>(),
            Err(EndpointError::Json(_))
        ));
    }

    #[test]
    fn test_write_json_sets_content_type() {
        let mut ctx = HttpContext::builder(Method::GET, "/").build();
        ctx.write_json(&42).unwrap();
        assert_eq!(ctx.response_body().as_ref(), b"42");
        assert_eq!(
            ctx.response_headers().get(CONTENT_TYPE).unwrap(),
            APPLICATION_JSON
        );
    }

    #[test]
    fn test_into_response() {
        let mut ctx = HttpContext::builder(Method::GET, "/").build();
        ctx.set_status(StatusCode::CREATED);
        ctx.write_text("made");

        let response = ctx.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), TEXT_PLAIN);
        assert_eq!(response.body().as_ref(), b"made");
    }

    #[test]
    fn test_header_lookup() {
        let ctx = HttpContext::builder(Method::GET, "/")
            .header(
                HeaderName::from_static("x-client"),
                HeaderValue::from_static("cli"),
            )
            .build();
        assert_eq!(ctx.header("x-client"), Some("cli"));
        assert_eq!(ctx.header("x-other"), None);
    }
}
