//! Service container.
//!
//! Services are registered once while the application is assembled and are
//! resolved by type when an endpoint binds an injected parameter.
//!
//! # Example
//!
//! ```rust
//! use daedalus_core::Container;
//! use std::sync::Arc;
//!
//! struct Clock {
//!     offset: i64,
//! }
//!
//! let mut container = Container::new();
//! container.register(Clock { offset: 3 });
//!
//! let clock: Arc<Clock> = container.resolve().unwrap();
//! assert_eq!(clock.offset, 3);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::EndpointError;

/// A type-keyed service registry.
///
/// Services are stored as `Arc<T>` where `T: Send + Sync`, so the container
/// can be shared across threads behind an `Arc`.
#[derive(Default)]
pub struct Container {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service value, replacing any previous one of the same type.
    pub fn register<T: Send + Sync + 'static>(&mut self, service: T) {
        self.register_arc(Arc::new(service));
    }

    /// Registers an already shared service.
    pub fn register_arc<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), service);
    }

    /// Resolves a service, or `None` when it was never registered.
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| Arc::clone(s).downcast::<T>().ok())
    }

    /// Resolves a service or returns [`EndpointError::MissingService`].
    pub fn resolve_required<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, EndpointError> {
        self.resolve().ok_or_else(EndpointError::missing_service::<T>)
    }

    /// Returns true if a service of type `T` is registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.services.len())
            .finish()
    }
}
