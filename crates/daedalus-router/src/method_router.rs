//! HTTP method dispatch for a single route.
//!
//! [`MethodRouter`] maps methods to endpoint indices. An endpoint registered
//! without a method (the generic `map` form) occupies the `any` slot and is
//! used when no method-specific entry exists.

use http::Method;
use smallvec::SmallVec;

/// Maps HTTP methods to endpoint indices for one route.
///
/// # Example
///
/// ```rust
/// use daedalus_router::MethodRouter;
/// use http::Method;
///
/// let router = MethodRouter::new().on(Method::GET, 0).on(Method::POST, 1).any(2);
///
/// assert_eq!(router.endpoint_for(&Method::GET), Some(0));
/// assert_eq!(router.endpoint_for(&Method::POST), Some(1));
/// assert_eq!(router.endpoint_for(&Method::DELETE), Some(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodRouter {
    entries: SmallVec<[(Method, usize); 4]>,
    any: Option<usize>,
}

impl MethodRouter {
    /// Creates an empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an endpoint for a method. An existing entry is kept.
    #[must_use]
    pub fn on(mut self, method: Method, endpoint: usize) -> Self {
        if self.entry(&method).is_none() {
            self.entries.push((method, endpoint));
        }
        self
    }

    /// Registers an endpoint for every method without its own entry.
    #[must_use]
    pub fn any(mut self, endpoint: usize) -> Self {
        if self.any.is_none() {
            self.any = Some(endpoint);
        }
        self
    }

    /// Registers an endpoint for `method`, or for any method when `None`.
    #[must_use]
    pub fn method(self, method: Option<Method>, endpoint: usize) -> Self {
        match method {
            Some(method) => self.on(method, endpoint),
            None => self.any(endpoint),
        }
    }

    /// Returns the endpoint for a method, falling back to the `any` slot.
    #[must_use]
    pub fn endpoint_for(&self, method: &Method) -> Option<usize> {
        self.entry(method).or(self.any)
    }

    /// Merges another method router into this one.
    ///
    /// Entries already present in `self` are not overwritten.
    pub fn merge(&mut self, other: MethodRouter) {
        for (method, endpoint) in other.entries {
            if self.entry(&method).is_none() {
                self.entries.push((method, endpoint));
            }
        }
        if self.any.is_none() {
            self.any = other.any;
        }
    }

    /// Returns the explicitly registered methods, in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Returns true if no endpoint is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.any.is_none()
    }

    fn entry(&self, method: &Method) -> Option<usize> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, endpoint)| *endpoint)
    }
}
