//! Test client for in-memory requests.

use bytes::Bytes;
use daedalus_endpoint::Application;
use http::Method;
use serde::Serialize;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Sends requests straight to an [`Application`], without a server.
///
/// # Example
///
/// ```
/// use daedalus_endpoint::EndpointRouteBuilder;
/// use daedalus_test::TestClient;
/// use http::StatusCode;
///
/// let mut app = EndpointRouteBuilder::new();
/// app.map_get("/items/{id}", |id: u32| id * 2);
/// let client = TestClient::new(app.build().unwrap());
///
/// client
///     .get("/items/21")
///     .send()
///     .assert_status(StatusCode::OK)
///     .assert_body_eq("42");
/// ```
#[must_use]
pub struct TestClient {
    app: Application,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client for `app`.
    pub fn new(app: Application) -> Self {
        Self {
            app,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// The application under test.
    #[must_use]
    pub fn application(&self) -> &Application {
        &self.app
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let mut builder = TestRequestBuilder::new(method, uri);
        for (name, value) in &self.default_headers {
            builder = builder.header(name, value);
        }
        TestClientRequest { client: self, builder }
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("app", &self.app)
            .field("default_headers", &self.default_headers)
            .finish()
    }
}

/// A request builder bound to a test client.
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Appends url-encoded query parameters.
    pub fn query<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.query(value);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built.
    pub fn send(self) -> TestResponse {
        self.try_send().unwrap_or_else(|e| panic!("failed to build test request: {e}"))
    }

    /// Sends the request, returning request building errors.
    pub fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        Ok(TestResponse::from_http(self.client.app.handle(request)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_endpoint::EndpointRouteBuilder;
    use daedalus_extract::{Inject, Json};
    use http::{HeaderMap, StatusCode};
    use serde_json::{json, Value};

    struct Greeter(&'static str);

    fn client() -> TestClient {
        let mut app = EndpointRouteBuilder::new();
        app.services_mut().register(Greeter("hello"));
        app.map_get("/items/{id}", |id: u64| id);
        app.map_post("/echo", |body: Json<Value>| body);
        app.map_get("/greet/{name}", |name: String, greeter: Inject<Greeter>| {
            format!("{} {name}", greeter.0 .0)
        });
        app.map_get("/header", |headers: HeaderMap| {
            headers
                .get("x-tenant")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("none")
                .to_string()
        });
        TestClient::new(app.build().unwrap())
    }

    #[test]
    fn test_route_values() {
        client().get("/items/7").send().assert_status(StatusCode::OK).assert_body_eq("7");
    }

    #[test]
    fn test_json_echo() {
        let response = client().post("/echo").json(&json!({"name": "Alice"})).send();
        response.assert_status(StatusCode::OK).assert_json_eq(&json!({"name": "Alice"}));
    }

    #[test]
    fn test_services() {
        client().get("/greet/bob").send().assert_body_eq("hello bob");
    }

    #[test]
    fn test_default_headers() {
        let client = client().with_default_header("X-Tenant", "acme");
        client.get("/header").send().assert_body_eq("acme");
        client.get("/header").header("X-Tenant", "other").send().assert_body_eq("other");
    }

    #[test]
    fn test_errors_and_routing() {
        let client = client();
        client.get("/items/abc").send().assert_status(StatusCode::BAD_REQUEST);
        client.delete("/items/1").send().assert_status(StatusCode::METHOD_NOT_ALLOWED);
        client.get("/missing").send().assert_status(StatusCode::NOT_FOUND);
        assert!(matches!(
            client.get("/header").header("bad header", "x").try_send(),
            Err(TestError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_application_accessor() {
        assert_eq!(client().application().endpoints().len(), 4);
    }
}
