//! Responses captured from an application.

use std::fmt;

use bytes::Bytes;
use http::{header, HeaderMap, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TestError;

/// A response produced by [`Application::handle`](daedalus_endpoint::Application::handle),
/// with chainable assertions.
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Wraps a response produced by an application.
    pub fn from_http(response: Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns true for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid UTF-8.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers.get(name.as_ref()).and_then(|v| v.to_str().ok())
    }

    /// The `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec()).map_err(|e| TestError::BodyRead(format!("body is not UTF-8: {e}")))
    }

    /// Body deserialized from JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// The `detail` of a problem body written for an endpoint error.
    pub fn problem_detail(&self) -> Result<String, TestError> {
        let problem: Value = self.json()?;
        problem["detail"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| TestError::BodyRead(format!("not a problem body: {problem}")))
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics on a different status; the message includes the body.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {} (body: {})",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts a header value.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or differs.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("missing header `{name}`"));
        assert_eq!(actual, expected.as_ref(), "header `{name}`");
        self
    }

    /// Asserts the body text.
    ///
    /// # Panics
    ///
    /// Panics if the body is not UTF-8 or differs.
    pub fn assert_body_eq(&self, expected: impl AsRef<str>) -> &Self {
        let body = self.text().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(body, expected.as_ref(), "response body");
        self
    }

    /// Asserts that nothing was written to the body.
    ///
    /// # Panics
    ///
    /// Panics if the body is not empty.
    pub fn assert_empty_body(&self) -> &Self {
        assert!(
            self.body.is_empty(),
            "expected an empty body, got {}",
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or differs.
    pub fn assert_json_eq(&self, expected: &Value) -> &Self {
        let actual: Value = self.json().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(&actual, expected, "JSON body");
        self
    }

    /// Asserts a problem response with `status` whose detail contains
    /// `fragment`.
    ///
    /// # Panics
    ///
    /// Panics on a different status or a body that is not a matching problem.
    pub fn assert_problem(&self, status: StatusCode, fragment: &str) -> &Self {
        self.assert_status(status);
        let detail = self.problem_detail().unwrap_or_else(|e| panic!("{e}"));
        assert!(detail.contains(fragment), "problem detail `{detail}` lacks `{fragment}`");
        self
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type())
            .field("body_len", &self.body.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    fn response(status: StatusCode, content_type: &'static str, body: &'static str) -> TestResponse {
        let mut response = Response::new(Bytes::from_static(body.as_bytes()));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        TestResponse::from_http(response)
    }

    #[test]
    fn test_accessors() {
        let response = response(StatusCode::CREATED, "application/json", r#"{"id":1}"#);

        assert!(response.is_success());
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.json::<Value>().unwrap(), json!({"id": 1}));
        assert_eq!(response.text().unwrap(), r#"{"id":1}"#);
    }

    #[test]
    fn test_assertions_chain() {
        response(StatusCode::OK, "text/plain; charset=utf-8", "hi")
            .assert_status(StatusCode::OK)
            .assert_header("content-type", "text/plain; charset=utf-8")
            .assert_body_eq("hi");
    }

    #[test]
    fn test_problem_body() {
        let response = response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "application/json",
            r#"{"status":500,"detail":"service not registered: Db"}"#,
        );
        response.assert_problem(StatusCode::INTERNAL_SERVER_ERROR, "not registered");

        let plain = super::TestResponse::from_http(Response::new(Bytes::from_static(b"{\"id\":1}")));
        assert!(matches!(plain.problem_detail(), Err(TestError::BodyRead(_))));
    }

    #[test]
    #[should_panic(expected = "expected status 404")]
    fn test_assert_status_fails() {
        response(StatusCode::OK, "text/plain", "hi").assert_status(StatusCode::NOT_FOUND);
    }

    #[test]
    #[should_panic(expected = "expected an empty body")]
    fn test_assert_empty_body_fails() {
        response(StatusCode::BAD_REQUEST, "text/plain", "bad id").assert_empty_body();
    }

    #[test]
    fn test_invalid_json() {
        let response = response(StatusCode::OK, "text/plain", "not json");
        assert!(matches!(response.json::<Value>(), Err(TestError::Json(_))));
        assert!(matches!(response.problem_detail(), Err(TestError::Json(_))));
    }
}
