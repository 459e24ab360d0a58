//! Method resolvers for the registration verbs.
//!
//! A resolver turns the pattern passed to a `map_*` call into the HTTP
//! method to route on and the pattern to register. Only the generic `map`
//! verb looks at the pattern: `"POST /items"` routes `POST` requests to
//! `/items`, a bare `"/items"` accepts any method.

use http::Method;

/// Resolves the HTTP method for a registration.
pub type MethodResolver = fn(&str) -> (Option<Method>, &str);

/// `map_get`.
pub fn get(pattern: &str) -> (Option<Method>, &str) {
    (Some(Method::GET), pattern)
}

/// `map_post`.
pub fn post(pattern: &str) -> (Option<Method>, &str) {
    (Some(Method::POST), pattern)
}

/// `map_put`.
pub fn put(pattern: &str) -> (Option<Method>, &str) {
    (Some(Method::PUT), pattern)
}

/// `map_delete`.
pub fn delete(pattern: &str) -> (Option<Method>, &str) {
    (Some(Method::DELETE), pattern)
}

/// `map_patch`.
pub fn patch(pattern: &str) -> (Option<Method>, &str) {
    (Some(Method::PATCH), pattern)
}

/// `map`: an optional `METHOD ` prefix selects the method.
pub fn any(pattern: &str) -> (Option<Method>, &str) {
    let trimmed = pattern.trim_start();
    if let Some((prefix, rest)) = trimmed.split_once(' ') {
        let is_token = !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_uppercase());
        if is_token {
            if let Ok(method) = Method::from_bytes(prefix.as_bytes()) {
                return (Some(method), rest.trim_start());
            }
        }
    }
    (None, trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_verbs() {
        assert_eq!(get("/a"), (Some(Method::GET), "/a"));
        assert_eq!(post("/a"), (Some(Method::POST), "/a"));
        assert_eq!(put("/a"), (Some(Method::PUT), "/a"));
        assert_eq!(delete("/a"), (Some(Method::DELETE), "/a"));
        assert_eq!(patch("/a"), (Some(Method::PATCH), "/a"));
    }

    #[test]
    fn test_any_without_prefix() {
        assert_eq!(any("/items"), (None, "/items"));
    }

    #[test]
    fn test_any_with_method_prefix() {
        assert_eq!(any("POST /items"), (Some(Method::POST), "/items"));
        assert_eq!(any("OPTIONS  /items"), (Some(Method::OPTIONS), "/items"));
    }

    #[test]
    fn test_any_ignores_lowercase_prefix() {
        assert_eq!(any("post /items"), (None, "post /items"));
    }
}
