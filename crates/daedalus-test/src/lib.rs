//! # Daedalus Test
//!
//! In-memory testing for Daedalus applications: requests go straight to
//! [`Application::handle`](daedalus_endpoint::Application::handle), through
//! the same router, filters and (generated or generic) delegates a server
//! would use.
//!
//! ## Example
//!
//! ```
//! use daedalus_endpoint::EndpointRouteBuilder;
//! use daedalus_test::TestClient;
//! use http::StatusCode;
//!
//! let mut app = EndpointRouteBuilder::new();
//! app.map_post("/items", || StatusCode::CREATED);
//! let client = TestClient::new(app.build().unwrap());
//!
//! let response = client.post("/items").send();
//! assert_eq!(response.status(), StatusCode::CREATED);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
