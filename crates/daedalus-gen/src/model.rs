//! The endpoint model.
//!
//! An [`EndpointModel`] is a value: builder steps take one and return a new
//! one, and the incremental cache compares them structurally. The
//! [`OperationHandle`] only anchors diagnostics and is left out of equality.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::diagnostics::Diagnostic;
use crate::filter::Verb;
use crate::syntax::{Candidate, Location, ParamSig, TypeRef};

/// Identity of a registration call: file and line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointKey {
    /// Relative file path.
    pub path: String,
    /// Line of the verb.
    pub line: u32,
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.line)
    }
}

/// The route as far as it could be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteInfo {
    /// A string literal.
    Literal {
        /// Pattern without any method prefix.
        pattern: String,
    },
    /// A string constant.
    Constant {
        /// Full path of the constant.
        path: String,
        /// Pattern without any method prefix.
        pattern: String,
    },
    /// Anything else; parameters cannot be checked.
    Dynamic {
        /// Expression text.
        text: String,
    },
}

impl RouteInfo {
    /// The pattern, when known at build time.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        match self {
            Self::Literal { pattern } | Self::Constant { pattern, .. } => Some(pattern),
            Self::Dynamic { .. } => None,
        }
    }
}

/// Where a parameter's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingSource {
    /// A route value with the parameter's name.
    Route,
    /// A query value with the parameter's name.
    Query,
    /// The route value if present, else the query value (route unknown).
    RouteOrQuery,
    /// The request body as JSON.
    JsonBody,
    /// The service container.
    Service,
    /// The request method.
    Method,
    /// The request headers.
    Headers,
    /// The raw request body.
    Body,
}

/// A classified handler parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    /// Name used for route and query lookups.
    pub name: String,
    /// Declared type, qualified.
    pub ty: TypeRef,
    /// Type that is parsed, deserialized or resolved: the scalar inside an
    /// `Option`, the `T` of `Json<T>` or `Inject<T>`, otherwise `ty`.
    pub value_ty: TypeRef,
    /// Binding source.
    pub source: BindingSource,
    /// `Option<T>`: absence is not an error.
    pub optional: bool,
    /// Parameter location.
    pub location: Location,
}

/// How the return value is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// `String` or `&str` as `text/plain`.
    Text,
    /// `char` as `text/plain`.
    Char,
    /// Numbers and `bool` as JSON.
    JsonPrimitive,
    /// `()`: empty 200.
    Unit,
    /// `Json<T>`.
    Json,
    /// `StatusCode`: status only.
    Status,
    /// `EndpointResult`: executed as is.
    EndpointResult,
    /// Anything else the runtime converts through `IntoEndpointResult`.
    Generic,
}

/// The classified return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Response {
    /// Return type, qualified.
    pub ty: TypeRef,
    /// Writing strategy.
    pub kind: ResponseKind,
}

/// A resolved handler, types qualified to the calling crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerSignature {
    /// Parameters in order.
    pub params: Vec<ParamSig>,
    /// Return type; `None` if it could not be inferred.
    pub output: Option<TypeRef>,
    /// Where the return type comes from.
    pub output_location: Location,
    /// `closure` or the function's full path.
    pub description: String,
}

impl HandlerSignature {
    /// Parameter types, if all are known.
    #[must_use]
    pub fn param_types(&self) -> Option<Vec<TypeRef>> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }
}

/// Back-reference to the registration's syntax, for diagnostics only.
#[derive(Debug, Clone)]
pub struct OperationHandle {
    /// The call site.
    pub location: Location,
    /// The handler expression as written.
    pub expression: String,
}

/// Everything known about one registration.
#[derive(Debug, Clone)]
pub struct EndpointModel {
    /// Location of the verb.
    pub location: Location,
    /// Source key.
    pub key: EndpointKey,
    /// The verb called.
    pub verb: Verb,
    /// HTTP method; `None` for any.
    pub http_method: Option<String>,
    /// Route, once classified.
    pub route: Option<RouteInfo>,
    /// Handler, once resolved.
    pub handler: Option<HandlerSignature>,
    /// Classified parameters.
    pub parameters: Vec<Parameter>,
    /// Classified return type.
    pub response: Option<Response>,
    /// Accumulated diagnostics, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
    /// Syntax back-reference.
    pub operation: OperationHandle,
}

impl EndpointModel {
    /// The unresolved model for a candidate.
    #[must_use]
    pub fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            location: candidate.location.clone(),
            key: EndpointKey {
                path: candidate.location.file.clone(),
                line: candidate.location.line,
            },
            verb: candidate.verb,
            http_method: None,
            route: None,
            handler: None,
            parameters: Vec::new(),
            response: None,
            diagnostics: Vec::new(),
            operation: OperationHandle {
                location: candidate.location.clone(),
                expression: candidate.handler_text.clone(),
            },
        }
    }

    /// Returns the model with `diagnostic` appended.
    #[must_use]
    pub fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }

    /// Returns true if the handler was resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.handler.is_some()
    }

    /// Returns true if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Returns true if code is generated for this endpoint.
    #[must_use]
    pub fn is_emittable(&self) -> bool {
        !self.has_errors()
            && self.response.is_some()
            && self.handler.as_ref().and_then(HandlerSignature::param_types).is_some()
    }
}

impl PartialEq for EndpointModel {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location
            && self.key == other.key
            && self.verb == other.verb
            && self.http_method == other.http_method
            && self.route == other.route
            && self.handler == other.handler
            && self.parameters == other.parameters
            && self.response == other.response
            && self.diagnostics == other.diagnostics
    }
}

impl Eq for EndpointModel {}

impl Hash for EndpointModel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.location.hash(state);
        self.key.hash(state);
        self.verb.hash(state);
        self.http_method.hash(state);
        self.route.hash(state);
        self.handler.hash(state);
        self.parameters.hash(state);
        self.response.hash(state);
        self.diagnostics.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::UNSUPPORTED_RETURN;
    use crate::syntax::{parse_file, SourceFile};

    fn candidate() -> Candidate {
        let file = SourceFile::new("src/lib.rs", "fn f() {\n    app.map_get(\"/\", || 1);\n}");
        parse_file(&file, "src").candidates.remove(0)
    }

    #[test]
    fn test_from_candidate() {
        let model = EndpointModel::from_candidate(&candidate());
        assert_eq!(model.key.to_string(), "src/lib.rs:2");
        assert_eq!(model.verb, Verb::Get);
        assert!(!model.is_resolved());
        assert!(!model.is_emittable());
    }

    #[test]
    fn test_equality_ignores_operation_handle() {
        let a = EndpointModel::from_candidate(&candidate());
        let mut b = a.clone();
        b.operation.expression = "something else".to_string();
        assert_eq!(a, b);

        let c = b.with_diagnostic(Diagnostic::new(&UNSUPPORTED_RETURN, a.location.clone(), "x"));
        assert_ne!(a, c);
        assert!(c.has_errors());
    }

    #[test]
    fn test_route_pattern() {
        let literal = RouteInfo::Literal {
            pattern: "/a".to_string(),
        };
        let dynamic = RouteInfo::Dynamic {
            text: "route()".to_string(),
        };
        assert_eq!(literal.pattern(), Some("/a"));
        assert_eq!(dynamic.pattern(), None);
    }
}
