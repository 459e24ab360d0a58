//! High-level router API.

use http::Method;

use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;
use crate::pattern::RoutePattern;
use crate::RouteMatch;

/// A radix tree router from paths to endpoint indices.
///
/// # Example
///
/// ```rust
/// use daedalus_router::{RoutePattern, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.route(Some(Method::GET), &RoutePattern::parse("/items/{id}").unwrap(), 0);
///
/// let matched = router.match_route(&Method::GET, "/items/7").unwrap();
/// assert_eq!(matched.endpoint, 0);
/// assert_eq!(matched.params.get("id"), Some("7"));
/// ```
///
/// # Route Priority
///
/// 1. **Static segments** (`/users/me`)
/// 2. **Parameter segments** (`/users/{id}`)
/// 3. **Catch-all segments** (`/files/*path`)
#[derive(Debug, Clone, Default)]
pub struct Router {
    root: Node,
    route_count: usize,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a route with its method table.
    pub fn insert(&mut self, pattern: &RoutePattern, methods: MethodRouter) {
        self.root.insert(pattern, methods);
        self.route_count += 1;
    }

    /// Adds a single endpoint. `None` registers it for any method.
    pub fn route(&mut self, method: Option<Method>, pattern: &RoutePattern, endpoint: usize) {
        self.insert(pattern, MethodRouter::new().method(method, endpoint));
    }

    /// Matches a method and path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let (methods, params) = self.root.match_path(path)?;
        let endpoint = methods.endpoint_for(method)?;
        Some(RouteMatch::new(endpoint, params))
    }

    /// Matches a path regardless of method.
    ///
    /// Used to tell "no such route" apart from "method not allowed".
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter, Params)> {
        self.root.match_path(path)
    }

    /// Returns the number of registered endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(text: &str) -> RoutePattern {
        RoutePattern::parse(text).unwrap()
    }

    #[test]
    fn test_router_new() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_router_method_dispatch() {
        let mut router = Router::new();
        router.route(Some(Method::GET), &pattern("/items"), 0);
        router.route(Some(Method::POST), &pattern("/items"), 1);

        assert_eq!(router.len(), 2);
        assert_eq!(router.match_route(&Method::GET, "/items").unwrap().endpoint, 0);
        assert_eq!(router.match_route(&Method::POST, "/items").unwrap().endpoint, 1);
        assert!(router.match_route(&Method::DELETE, "/items").is_none());
    }

    #[test]
    fn test_router_method_not_allowed_is_visible_through_match_path() {
        let mut router = Router::new();
        router.route(Some(Method::GET), &pattern("/items"), 0);

        let (methods, _) = router.match_path("/items").unwrap();
        assert_eq!(methods.allowed_methods(), vec![Method::GET]);
        assert!(router.match_path("/other").is_none());
    }

    #[test]
    fn test_router_any_method() {
        let mut router = Router::new();
        router.route(None, &pattern("/ping"), 3);

        assert_eq!(router.match_route(&Method::OPTIONS, "/ping").unwrap().endpoint, 3);
    }

    #[test]
    fn test_router_params_in_order() {
        let mut router = Router::new();
        router.route(Some(Method::GET), &pattern("/orgs/{org}/users/{user}"), 0);

        let matched = router.match_route(&Method::GET, "/orgs/acme/users/9").unwrap();
        assert_eq!(matched.params.value_at(0), Some("acme"));
        assert_eq!(matched.params.value_at(1), Some("9"));
    }
}
