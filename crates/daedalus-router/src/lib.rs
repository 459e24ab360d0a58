//! Route patterns and radix tree matching for Daedalus.
//!
//! Endpoints are identified by their index in the application's endpoint
//! list. The router maps a (method, path) pair to that index and the route
//! values captured along the way.
//!
//! # Example
//!
//! ```rust
//! use daedalus_router::{RoutePattern, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.route(Some(Method::GET), &RoutePattern::parse("/users").unwrap(), 0);
//! router.route(Some(Method::GET), &RoutePattern::parse("/users/{id}").unwrap(), 1);
//! router.route(None, &RoutePattern::parse("/files/*path").unwrap(), 2);
//!
//! let matched = router.match_route(&Method::GET, "/users/123").unwrap();
//! assert_eq!(matched.endpoint, 1);
//! assert_eq!(matched.params.get("id"), Some("123"));
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"        "files"
//!              │               │
//!        ┌─────┴─────┐      "*path"
//!        │           │       [any]
//!      [GET]      "{id}"
//!                    │
//!                  [GET]
//! ```

mod method_router;
mod node;
mod params;
mod pattern;
mod router;

pub use method_router::MethodRouter;
pub use node::Node;
pub use params::Params;
pub use pattern::{PatternError, RoutePattern, Segment};
pub use router::Router;

/// A matched route: the endpoint index and its route values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Index of the matched endpoint.
    pub endpoint: usize,
    /// Route values in pattern order.
    pub params: Params,
}

impl RouteMatch {
    /// Creates a new route match.
    #[must_use]
    pub fn new(endpoint: usize, params: Params) -> Self {
        Self { endpoint, params }
    }
}
