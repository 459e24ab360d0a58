//! Route pattern parsing and validation.
//!
//! A route pattern is a `/`-separated list of segments. Each segment is one of:
//!
//! - a static segment (`users`)
//! - a named parameter (`{id}`)
//! - a catch-all (`*path`), which must be the final segment
//!
//! The same parser is used at registration time by the runtime and at build
//! time by the generator, so both agree on which patterns are valid.

use std::fmt;

/// Errors produced while parsing a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// The pattern does not begin with `/`.
    #[error("route pattern '{pattern}' must start with '/'")]
    MissingLeadingSlash {
        /// The offending pattern.
        pattern: String,
    },

    /// A parameter or catch-all has an empty or invalid name.
    #[error("route pattern '{pattern}' has an invalid parameter name '{name}'")]
    InvalidParameterName {
        /// The offending pattern.
        pattern: String,
        /// The rejected name.
        name: String,
    },

    /// A segment contains a `{` or `}` that is not a whole-segment parameter.
    #[error("route pattern '{pattern}' has unbalanced braces in segment '{segment}'")]
    UnbalancedBraces {
        /// The offending pattern.
        pattern: String,
        /// The segment containing the brace.
        segment: String,
    },

    /// The same parameter name appears twice.
    #[error("route pattern '{pattern}' declares parameter '{name}' more than once")]
    DuplicateParameter {
        /// The offending pattern.
        pattern: String,
        /// The repeated name.
        name: String,
    },

    /// A catch-all segment is followed by more segments.
    #[error("route pattern '{pattern}' has a catch-all that is not the last segment")]
    CatchAllNotLast {
        /// The offending pattern.
        pattern: String,
    },
}

/// One segment of a parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Literal text that must match exactly.
    Static(String),
    /// A named parameter matching a single path segment.
    Param(String),
    /// A named catch-all matching the rest of the path.
    CatchAll(String),
}

impl Segment {
    /// Returns the parameter name for parameter and catch-all segments.
    #[must_use]
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            Segment::Static(_) => None,
            Segment::Param(name) | Segment::CatchAll(name) => Some(name),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Static(text) => f.write_str(text),
            Segment::Param(name) => write!(f, "{{{name}}}"),
            Segment::CatchAll(name) => write!(f, "*{name}"),
        }
    }
}

/// A validated route pattern.
///
/// # Example
///
/// ```rust
/// use daedalus_router::RoutePattern;
///
/// let pattern = RoutePattern::parse("/orgs/{org}/files/*path").unwrap();
/// assert_eq!(pattern.parameter_names().collect::<Vec<_>>(), vec!["org", "path"]);
/// assert!(RoutePattern::parse("users").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parses and validates a route pattern.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash {
                pattern: pattern.to_string(),
            });
        }

        let mut segments: Vec<Segment> = Vec::new();
        for raw in pattern.split('/').filter(|s| !s.is_empty()) {
            if matches!(segments.last(), Some(Segment::CatchAll(_))) {
                return Err(PatternError::CatchAllNotLast {
                    pattern: pattern.to_string(),
                });
            }

            let segment = if let Some(name) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Segment::Param(validate_name(pattern, name)?)
            } else if let Some(name) = raw.strip_prefix('*') {
                Segment::CatchAll(validate_name(pattern, name)?)
            } else if raw.contains('{') || raw.contains('}') {
                return Err(PatternError::UnbalancedBraces {
                    pattern: pattern.to_string(),
                    segment: raw.to_string(),
                });
            } else {
                Segment::Static(raw.to_string())
            };

            if let Some(name) = segment.parameter_name() {
                if segments.iter().any(|s| s.parameter_name() == Some(name)) {
                    return Err(PatternError::DuplicateParameter {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// Returns the pattern text as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the parameter names in declaration order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::parameter_name)
    }

    /// Returns true if the pattern declares a parameter with this name.
    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameter_names().any(|n| n == name)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn validate_name(pattern: &str, name: &str) -> Result<String, PatternError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(name.to_string())
    } else {
        Err(PatternError::InvalidParameterName {
            pattern: pattern.to_string(),
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_static() {
        let pattern = RoutePattern::parse("/users/list").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Static("users".to_string()),
                Segment::Static("list".to_string())
            ]
        );
        assert_eq!(pattern.parameter_names().count(), 0);
    }

    #[test]
    fn test_parse_root() {
        let pattern = RoutePattern::parse("/").unwrap();
        assert!(pattern.segments().is_empty());
        assert_eq!(pattern.as_str(), "/");
    }

    #[test]
    fn test_parse_param_and_catch_all() {
        let pattern = RoutePattern::parse("/items/{id}/files/*rest").unwrap();
        assert_eq!(pattern.segments()[1], Segment::Param("id".to_string()));
        assert_eq!(pattern.segments()[3], Segment::CatchAll("rest".to_string()));
        assert!(pattern.has_parameter("id"));
        assert!(pattern.has_parameter("rest"));
        assert!(!pattern.has_parameter("items"));
    }

    #[test]
    fn test_missing_leading_slash() {
        assert!(matches!(
            RoutePattern::parse("items/{id}"),
            Err(PatternError::MissingLeadingSlash { .. })
        ));
    }

    #[test]
    fn test_invalid_parameter_names() {
        for bad in ["/a/{}", "/a/{1x}", "/a/{a-b}", "/a/*"] {
            assert!(
                matches!(
                    RoutePattern::parse(bad),
                    Err(PatternError::InvalidParameterName { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_unbalanced_braces() {
        assert!(matches!(
            RoutePattern::parse("/a/{id"),
            Err(PatternError::UnbalancedBraces { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/a/x{id}"),
            Err(PatternError::UnbalancedBraces { .. })
        ));
    }

    #[test]
    fn test_duplicate_parameter() {
        let err = RoutePattern::parse("/a/{id}/b/{id}").unwrap_err();
        assert_eq!(
            err,
            PatternError::DuplicateParameter {
                pattern: "/a/{id}/b/{id}".to_string(),
                name: "id".to_string()
            }
        );
    }

    #[test]
    fn test_catch_all_not_last() {
        assert!(matches!(
            RoutePattern::parse("/files/*path/more"),
            Err(PatternError::CatchAllNotLast { .. })
        ));
    }

    #[test]
    fn test_display_round_trips_raw_text() {
        let pattern = RoutePattern::parse("/orgs/{org}").unwrap();
        assert_eq!(pattern.to_string(), "/orgs/{org}");
        assert_eq!(Segment::CatchAll("p".into()).to_string(), "*p");
    }
}
