//! Source keys and the generated thunk table.

use std::fmt;
use std::panic::Location;

use daedalus_core::{HandlerRef, RequestDelegate};

use crate::builder::EndpointBuilder;

/// Identifies a registration call site by file, line and the column of the
/// verb method.
///
/// Generated keys carry paths relative to the crate root, while
/// [`std::panic::Location::caller`] may report a longer path (workspace
/// relative or absolute). [`SourceKey::matches`] therefore compares path
/// components as a suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey {
    path: &'static str,
    line: u32,
    column: u32,
}

impl SourceKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(path: &'static str, line: u32, column: u32) -> Self {
        Self { path, line, column }
    }

    /// File path as recorded by the generator.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// One-based line of the registration call.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// One-based column of the verb method name.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Returns true if this key identifies a call at `file:line:column`.
    #[must_use]
    pub fn matches(&self, file: &str, line: u32, column: u32) -> bool {
        if self.line != line || self.column != column {
            return false;
        }
        let key: Vec<&str> = components(self.path).collect();
        let file: Vec<&str> = components(file).collect();
        !key.is_empty() && file.ends_with(&key)
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.column)
    }
}

fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\']).filter(|c| !c.is_empty() && *c != ".")
}

/// Generated functions for one endpoint.
#[derive(Clone, Copy)]
pub struct Thunk {
    /// Attaches dispatch metadata to the endpoint.
    pub register_metadata: fn(&HandlerRef, &mut EndpointBuilder),
    /// Builds the request delegate, or `None` if the handler does not have
    /// the shape the code was generated for.
    pub build_invoker: fn(&HandlerRef, &EndpointBuilder) -> Option<RequestDelegate>,
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thunk").finish_non_exhaustive()
    }
}

/// The table emitted by the generator.
pub type ThunkTable = &'static [(SourceKey, Thunk)];

/// Finds the thunk registered for a call site.
pub(crate) fn find_thunk(table: ThunkTable, location: &Location<'_>) -> Option<(SourceKey, Thunk)> {
    table
        .iter()
        .find(|(key, _)| key.matches(location.file(), location.line(), location.column()))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_relative_key_against_longer_path() {
        let key = SourceKey::new("src/routes.rs", 12, 9);
        assert!(key.matches("crates/app/src/routes.rs", 12, 9));
        assert!(key.matches("/home/dev/app/src/routes.rs", 12, 9));
        assert!(key.matches("src/routes.rs", 12, 9));
    }

    #[test]
    fn test_matches_windows_separators() {
        let key = SourceKey::new("src/routes.rs", 3, 5);
        assert!(key.matches(r"C:\work\app\src\routes.rs", 3, 5));
    }

    #[test]
    fn test_rejects_other_line_or_file() {
        let key = SourceKey::new("src/routes.rs", 12, 9);
        assert!(!key.matches("src/routes.rs", 13, 9));
        assert!(!key.matches("src/other_routes.rs", 12, 9));
        assert!(!key.matches("xsrc/routes.rs", 12, 9));
    }

    #[test]
    fn test_rejects_other_call_on_same_line() {
        let key = SourceKey::new("src/routes.rs", 12, 9);
        assert!(!key.matches("src/routes.rs", 12, 48));
    }

    #[test]
    fn test_key_longer_than_file_does_not_match() {
        let key = SourceKey::new("app/src/lib.rs", 1, 1);
        assert!(!key.matches("src/lib.rs", 1, 1));
    }

    fn register(_: &HandlerRef, _: &mut EndpointBuilder) {}

    fn build(_: &HandlerRef, _: &EndpointBuilder) -> Option<RequestDelegate> {
        None
    }

    #[test]
    fn test_find_thunk() {
        let here = Location::caller();
        let table: ThunkTable = Box::leak(Box::new([(
            SourceKey::new(here.file(), here.line(), here.column()),
            Thunk {
                register_metadata: register,
                build_invoker: build,
            },
        )]));

        assert!(find_thunk(table, here).is_some());
        let elsewhere = Location::caller();
        assert!(find_thunk(table, elsewhere).is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(SourceKey::new("src/lib.rs", 7, 10).to_string(), "src/lib.rs:7:10");
    }
}
