//! Named handler functions.

use daedalus::http::StatusCode;
use daedalus::{Inject, Json};

use crate::models::{Catalog, Item, Probe};

/// Fetches one item.
pub fn get_item(id: u64, catalog: Inject<Catalog>) -> Result<Json<Item>, StatusCode> {
    catalog.get(id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Validates a new item.
pub fn create_item(item: Json<Item>) -> StatusCode {
    if item.name.trim().is_empty() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::CREATED
    }
}

/// Echoes the id, counting invocations.
pub fn guarded(id: i32, probe: Inject<Probe>) -> i32 {
    probe.record_handler();
    id
}

/// Number of catalog entries.
pub fn count(catalog: Inject<Catalog>) -> usize {
    catalog.len()
}
