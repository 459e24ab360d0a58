//! Candidate detection.
//!
//! The filter is purely syntactic: a method call named after one of the
//! registration verbs, with exactly two arguments. It never looks at types,
//! so it also matches unrelated calls that happen to share a name. Those
//! are rejected later with a diagnostic.

use std::fmt;

use syn::ExprMethodCall;

/// The registration verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verb {
    /// `map_get`
    Get,
    /// `map_post`
    Post,
    /// `map_put`
    Put,
    /// `map_delete`
    Delete,
    /// `map_patch`
    Patch,
    /// `map`, method taken from a `"METHOD /path"` pattern or any
    Map,
}

impl Verb {
    /// Every verb.
    pub const ALL: [Verb; 6] = [Self::Get, Self::Post, Self::Put, Self::Delete, Self::Patch, Self::Map];

    /// Looks up a verb by the registration method name.
    #[must_use]
    pub fn from_method_name(name: &str) -> Option<Self> {
        match name {
            "map_get" => Some(Self::Get),
            "map_post" => Some(Self::Post),
            "map_put" => Some(Self::Put),
            "map_delete" => Some(Self::Delete),
            "map_patch" => Some(Self::Patch),
            "map" => Some(Self::Map),
            _ => None,
        }
    }

    /// The registration method name.
    #[must_use]
    pub const fn method_name(self) -> &'static str {
        match self {
            Self::Get => "map_get",
            Self::Post => "map_post",
            Self::Put => "map_put",
            Self::Delete => "map_delete",
            Self::Patch => "map_patch",
            Self::Map => "map",
        }
    }

    /// The fixed HTTP method, `None` for [`Verb::Map`].
    #[must_use]
    pub const fn http_method(self) -> Option<&'static str> {
        match self {
            Self::Get => Some("GET"),
            Self::Post => Some("POST"),
            Self::Put => Some("PUT"),
            Self::Delete => Some("DELETE"),
            Self::Patch => Some("PATCH"),
            Self::Map => None,
        }
    }

    /// Name of the runtime method resolver in `daedalus_endpoint::verbs`.
    #[must_use]
    pub const fn resolver(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Patch => "patch",
            Self::Map => "any",
        }
    }

    /// Returns true if the method is read from the pattern argument.
    #[must_use]
    pub const fn inspects_pattern(self) -> bool {
        matches!(self, Self::Map)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Returns true if `call` looks like an endpoint registration.
#[must_use]
pub fn is_candidate(call: &ExprMethodCall) -> bool {
    call.args.len() == 2 && Verb::from_method_name(&call.method.to_string()).is_some()
}
