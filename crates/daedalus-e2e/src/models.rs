//! Types shared by the sample endpoints.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use daedalus::extract::{ExtractionError, ExtractionSource, FromRequest, RouteCursor};
use daedalus::HttpContext;
use serde::{Deserialize, Serialize};

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
}

/// Read-only item store, registered as a service.
#[derive(Debug, Default)]
pub struct Catalog {
    items: BTreeMap<u64, Item>,
}

impl Catalog {
    /// Creates a catalog holding `items`.
    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id, item)).collect(),
        }
    }

    /// Looks up an item.
    pub fn get(&self, id: u64) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the catalog holds nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Counts handler and filter invocations.
#[derive(Debug, Default)]
pub struct Probe {
    handler_calls: AtomicUsize,
    filter_calls: AtomicUsize,
}

impl Probe {
    /// Records one handler invocation.
    pub fn record_handler(&self) {
        self.handler_calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Records one filter invocation.
    pub fn record_filter(&self) {
        self.filter_calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Handler invocations so far.
    pub fn handler_calls(&self) -> usize {
        self.handler_calls.load(Ordering::SeqCst)
    }

    /// Filter invocations so far.
    pub fn filter_calls(&self) -> usize {
        self.filter_calls.load(Ordering::SeqCst)
    }
}

/// Tenant named by the `x-tenant` header.
///
/// A custom extractor: the generator does not know it, so endpoints taking
/// one stay on the generic binding path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant(pub String);

impl FromRequest for Tenant {
    fn from_request(ctx: &HttpContext, _cursor: &mut RouteCursor) -> Result<Self, ExtractionError> {
        ctx.header("x-tenant")
            .filter(|value| !value.is_empty())
            .map(|value| Self(value.to_string()))
            .ok_or_else(|| ExtractionError::missing(ExtractionSource::Header, "x-tenant"))
    }
}
