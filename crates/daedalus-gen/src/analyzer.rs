//! Parameter binding and response classification.
//!
//! The model builder treats the analyzer as an opaque service behind
//! [`BindingAnalyzer`]. [`DefaultBindingAnalyzer`] implements the rules the
//! runtime and the generated code agree on:
//!
//! | parameter type | source |
//! |---|---|
//! | scalar named like a route parameter | route value |
//! | other scalar | query value |
//! | scalar, route not known at build time | route value, else query value |
//! | `Option<scalar>` | as above, absence allowed |
//! | `Json<T>` | request body (at most one) |
//! | `Inject<T>` | service container |
//! | `Method`, `HeaderMap`, `Bytes` | the request |

use std::fmt;

use daedalus_router::RoutePattern;

use crate::diagnostics::{
    Diagnostic, UNBOUND_ROUTE_PARAMETER, UNSUPPORTED_PARAMETER, UNSUPPORTED_RETURN,
};
use crate::model::{BindingSource, HandlerSignature, Parameter, Response, ResponseKind, RouteInfo};
use crate::syntax::{Location, ParamSig, TypeRef};
use crate::well_known::{WellKnown, WellKnownTypes};

/// Result of analyzing one handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    /// Parameters that could be classified, in order.
    pub parameters: Vec<Parameter>,
    /// The response, if it could be classified.
    pub response: Option<Response>,
    /// Problems, each anchored at the element concerned.
    pub diagnostics: Vec<Diagnostic>,
}

/// Classifies a handler's parameters and return type.
///
/// Implementations must be total: every problem is a diagnostic, and the
/// remaining elements are still classified.
pub trait BindingAnalyzer: Send + Sync + fmt::Debug {
    /// Analyzes `handler` registered at `call_site` for `route`.
    fn analyze(
        &self,
        handler: &HandlerSignature,
        route: &RouteInfo,
        call_site: &Location,
        well_known: &WellKnownTypes,
    ) -> Analysis;
}

/// The built-in binding rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBindingAnalyzer;

impl BindingAnalyzer for DefaultBindingAnalyzer {
    fn analyze(
        &self,
        handler: &HandlerSignature,
        route: &RouteInfo,
        call_site: &Location,
        well_known: &WellKnownTypes,
    ) -> Analysis {
        let mut analysis = Analysis::default();
        let route_params: Option<Vec<String>> = route
            .pattern()
            .and_then(|pattern| RoutePattern::parse(pattern).ok())
            .map(|pattern| pattern.parameter_names().map(str::to_string).collect());
        let mut has_body = false;

        for (index, param) in handler.params.iter().enumerate() {
            let error = |message: String| {
                Diagnostic::new(&UNSUPPORTED_PARAMETER, call_site.clone(), message)
                    .with_sub_location(param.location.clone())
            };
            let Some(ty) = &param.ty else {
                analysis
                    .diagnostics
                    .push(error(format!("parameter {} needs a type annotation", describe(param, index))));
                continue;
            };

            let (source, value_ty, optional) = match well_known.classify(ty) {
                Some(WellKnown::Scalar(_)) => (scalar_source(param, route_params.as_deref()), ty.clone(), false),
                Some(WellKnown::OptionScalar(name)) => {
                    (scalar_source(param, route_params.as_deref()), TypeRef::named(name), true)
                }
                Some(WellKnown::Json(inner)) => {
                    if has_body {
                        analysis.diagnostics.push(error(format!(
                            "parameter {} reads the body, but an earlier parameter already does",
                            describe(param, index)
                        )));
                        continue;
                    }
                    has_body = true;
                    (BindingSource::JsonBody, inner, false)
                }
                Some(WellKnown::Inject(inner)) => (BindingSource::Service, inner, false),
                Some(WellKnown::Method) => (BindingSource::Method, ty.clone(), false),
                Some(WellKnown::HeaderMap) => (BindingSource::Headers, ty.clone(), false),
                Some(WellKnown::Bytes) => (BindingSource::Body, ty.clone(), false),
                Some(WellKnown::Str) => {
                    analysis.diagnostics.push(error(format!(
                        "parameter {} borrows from the request; use `String` instead of `&str`",
                        describe(param, index)
                    )));
                    continue;
                }
                _ => {
                    analysis.diagnostics.push(error(format!(
                        "parameter {} has unsupported type `{ty}`",
                        describe(param, index)
                    )));
                    continue;
                }
            };

            let needs_name = matches!(
                source,
                BindingSource::Route | BindingSource::Query | BindingSource::RouteOrQuery
            );
            let name = param.binding_name().unwrap_or_default().to_string();
            if needs_name && name.is_empty() {
                analysis.diagnostics.push(error(format!(
                    "parameter {index} binds from the route or query and needs a name"
                )));
                continue;
            }

            analysis.parameters.push(Parameter {
                name,
                ty: ty.clone(),
                value_ty,
                source,
                optional,
                location: param.location.clone(),
            });
        }

        if let Some(route_params) = &route_params {
            for name in route_params {
                let bound = analysis
                    .parameters
                    .iter()
                    .any(|p| p.source == BindingSource::Route && &p.name == name);
                if !bound {
                    analysis.diagnostics.push(Diagnostic::new(
                        &UNBOUND_ROUTE_PARAMETER,
                        call_site.clone(),
                        format!("route parameter `{name}` is not bound by any handler parameter"),
                    ));
                }
            }
        }

        match &handler.output {
            None => analysis.diagnostics.push(
                Diagnostic::new(
                    &UNSUPPORTED_RETURN,
                    call_site.clone(),
                    "cannot infer the handler's return type; annotate it",
                )
                .with_sub_location(handler.output_location.clone()),
            ),
            Some(ty) => match response_kind(well_known.classify(ty)) {
                Some(kind) => {
                    analysis.response = Some(Response { ty: ty.clone(), kind });
                }
                None => analysis.diagnostics.push(
                    Diagnostic::new(
                        &UNSUPPORTED_RETURN,
                        call_site.clone(),
                        format!("unsupported return type `{ty}`"),
                    )
                    .with_sub_location(handler.output_location.clone()),
                ),
            },
        }

        analysis
    }
}

fn describe(param: &ParamSig, index: usize) -> String {
    match &param.name {
        Some(name) => format!("`{name}`"),
        None => index.to_string(),
    }
}

fn scalar_source(param: &ParamSig, route_params: Option<&[String]>) -> BindingSource {
    match (route_params, param.binding_name()) {
        (None, _) => BindingSource::RouteOrQuery,
        (Some(names), Some(name)) if names.iter().any(|n| n == name) => BindingSource::Route,
        (Some(_), _) => BindingSource::Query,
    }
}

fn response_kind(known: Option<WellKnown>) -> Option<ResponseKind> {
    match known? {
        WellKnown::Scalar("String") | WellKnown::Str => Some(ResponseKind::Text),
        WellKnown::Scalar("char") => Some(ResponseKind::Char),
        WellKnown::Scalar(_) => Some(ResponseKind::JsonPrimitive),
        WellKnown::Unit => Some(ResponseKind::Unit),
        WellKnown::Json(_) => Some(ResponseKind::Json),
        WellKnown::StatusCode => Some(ResponseKind::Status),
        WellKnown::EndpointResult => Some(ResponseKind::EndpointResult),
        WellKnown::Result(_, _) | WellKnown::Bytes => Some(ResponseKind::Generic),
        WellKnown::Inject(_) | WellKnown::OptionScalar(_) | WellKnown::Method | WellKnown::HeaderMap => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(column: u32) -> Location {
        Location::new("src/lib.rs", 1, column)
    }

    fn param(name: &str, ty: Option<&str>, column: u32) -> ParamSig {
        ParamSig {
            name: Some(name.to_string()),
            ty: ty.map(|t| TypeRef::from_syn(&syn::parse_str(t).unwrap())),
            location: location(column),
        }
    }

    fn handler(params: Vec<ParamSig>, output: Option<&str>) -> HandlerSignature {
        HandlerSignature {
            params,
            output: output.map(|t| TypeRef::from_syn(&syn::parse_str(t).unwrap())),
            output_location: location(90),
            description: "closure".to_string(),
        }
    }

    fn literal(pattern: &str) -> RouteInfo {
        RouteInfo::Literal {
            pattern: pattern.to_string(),
        }
    }

    fn analyze(handler: &HandlerSignature, route: &RouteInfo) -> Analysis {
        let wkt = WellKnownTypes::new(std::iter::empty());
        DefaultBindingAnalyzer.analyze(handler, route, &location(5), &wkt)
    }

    #[test]
    fn test_route_and_query_scalars() {
        let h = handler(
            vec![param("id", Some("i32"), 10), param("page", Some("Option<u32>"), 20)],
            Some("i32"),
        );
        let analysis = analyze(&h, &literal("/items/{id}"));

        assert!(analysis.diagnostics.is_empty());
        assert_eq!(analysis.parameters[0].source, BindingSource::Route);
        assert_eq!(analysis.parameters[1].source, BindingSource::Query);
        assert!(analysis.parameters[1].optional);
        assert_eq!(analysis.parameters[1].value_ty.to_string(), "u32");
        assert_eq!(analysis.response.unwrap().kind, ResponseKind::JsonPrimitive);
    }

    #[test]
    fn test_dynamic_route_binds_route_or_query() {
        let h = handler(vec![param("id", Some("u64"), 10)], Some("String"));
        let analysis = analyze(
            &h,
            &RouteInfo::Dynamic {
                text: "route()".to_string(),
            },
        );
        assert_eq!(analysis.parameters[0].source, BindingSource::RouteOrQuery);
        assert_eq!(analysis.response.unwrap().kind, ResponseKind::Text);
    }

    #[test]
    fn test_body_service_and_request_parts() {
        let h = handler(
            vec![
                param("item", Some("Json<crate::Item>"), 10),
                param("db", Some("Inject<crate::Db>"), 20),
                param("method", Some("Method"), 30),
                param("headers", Some("HeaderMap"), 40),
            ],
            Some("Json<crate::Item>"),
        );
        let analysis = analyze(&h, &literal("/items"));

        let sources: Vec<_> = analysis.parameters.iter().map(|p| p.source).collect();
        assert_eq!(
            sources,
            vec![
                BindingSource::JsonBody,
                BindingSource::Service,
                BindingSource::Method,
                BindingSource::Headers
            ]
        );
        assert_eq!(analysis.parameters[0].value_ty.to_string(), "crate::Item");
        assert_eq!(analysis.response.unwrap().kind, ResponseKind::Json);
    }

    #[test]
    fn test_unsupported_parameter_keeps_classifying() {
        let h = handler(
            vec![param("id", Some("i32"), 10), param("x", Some("crate::UnsupportedType"), 20)],
            Some("&'static str"),
        );
        let analysis = analyze(&h, &literal("/x"));

        assert_eq!(analysis.parameters.len(), 1);
        assert_eq!(analysis.diagnostics.len(), 1);
        let diagnostic = &analysis.diagnostics[0];
        assert_eq!(diagnostic.id, "DAE002");
        assert_eq!(diagnostic.sub_location, Some(location(20)));
        assert!(diagnostic.message.contains("crate::UnsupportedType"));
        assert_eq!(analysis.response.unwrap().kind, ResponseKind::Text);
    }

    #[test]
    fn test_second_body_and_untyped_param_rejected() {
        let h = handler(
            vec![
                param("a", Some("Json<i32>"), 10),
                param("b", Some("Json<i32>"), 20),
                param("c", None, 30),
            ],
            Some("()"),
        );
        let analysis = analyze(&h, &literal("/"));
        let ids: Vec<_> = analysis.diagnostics.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["DAE002", "DAE002"]);
        assert!(analysis.diagnostics[1].message.contains("type annotation"));
        assert_eq!(analysis.response.unwrap().kind, ResponseKind::Unit);
    }

    #[test]
    fn test_unbound_route_parameter_warns() {
        let h = handler(vec![param("item_id", Some("i32"), 10)], Some("i32"));
        let analysis = analyze(&h, &literal("/items/{id}"));

        assert_eq!(analysis.parameters[0].source, BindingSource::Query);
        assert_eq!(analysis.diagnostics.len(), 1);
        assert_eq!(analysis.diagnostics[0].id, "DAE008");
        assert!(!analysis.diagnostics[0].is_error());
    }

    #[test]
    fn test_responses() {
        let cases = [
            ("char", Some(ResponseKind::Char)),
            ("bool", Some(ResponseKind::JsonPrimitive)),
            ("StatusCode", Some(ResponseKind::Status)),
            ("EndpointResult", Some(ResponseKind::EndpointResult)),
            ("Result<String, StatusCode>", Some(ResponseKind::Generic)),
            ("crate::Custom", None),
        ];
        for (ty, expected) in cases {
            let analysis = analyze(&handler(Vec::new(), Some(ty)), &literal("/"));
            assert_eq!(analysis.response.map(|r| r.kind), expected, "{ty}");
        }

        let uninferred = analyze(&handler(Vec::new(), None), &literal("/"));
        assert_eq!(uninferred.diagnostics[0].id, "DAE003");
        assert_eq!(uninferred.diagnostics[0].sub_location, Some(location(90)));
    }
}
