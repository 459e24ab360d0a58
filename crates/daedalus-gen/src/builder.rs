//! The endpoint model builder.
//!
//! Each step takes a model and returns a new one. Steps after a failed
//! handler resolution return the model unchanged, so an unresolved endpoint
//! carries exactly one diagnostic.

use daedalus_endpoint::verbs;
use daedalus_router::RoutePattern;

use crate::analyzer::BindingAnalyzer;
use crate::compilation::{ModelInput, RouteConstant};
use crate::diagnostics::{Diagnostic, INVALID_ROUTE, ROUTE_NOT_ANALYZABLE};
use crate::model::{EndpointModel, HandlerSignature, RouteInfo};
use crate::syntax::RouteArg;
use crate::well_known::WellKnownTypes;

/// Runs every builder step on `input`.
#[must_use]
pub fn build_model(input: &ModelInput, well_known: &WellKnownTypes, analyzer: &dyn BindingAnalyzer) -> EndpointModel {
    EndpointModel::from_candidate(&input.candidate)
        .with_endpoint(&input.handler)
        .with_http_method(&input.candidate.route, input.route_constant.as_ref())
        .with_endpoint_route(&input.candidate.route, input.route_constant.as_ref())
        .with_endpoint_response(analyzer, well_known)
}

impl EndpointModel {
    /// Attaches the resolved handler, or the resolution failure.
    #[must_use]
    pub fn with_endpoint(self, handler: &Result<HandlerSignature, Diagnostic>) -> Self {
        match handler {
            Ok(signature) => Self {
                handler: Some(signature.clone()),
                ..self
            },
            Err(diagnostic) => self.with_diagnostic(diagnostic.clone()),
        }
    }

    /// Classifies the HTTP method.
    ///
    /// `map` reads an optional method prefix off the pattern (`"PUT /x"`);
    /// without one, or when the pattern is not known, the endpoint accepts
    /// any method.
    #[must_use]
    pub fn with_http_method(self, route: &RouteArg, constant: Option<&RouteConstant>) -> Self {
        if !self.is_resolved() {
            return self;
        }
        let http_method = match self.verb.http_method() {
            Some(method) => Some(method.to_string()),
            None => literal_pattern(route, constant)
                .and_then(|pattern| verbs::any(pattern).0)
                .map(|method| method.as_str().to_string()),
        };
        Self { http_method, ..self }
    }

    /// Classifies the route expression.
    #[must_use]
    pub fn with_endpoint_route(self, route: &RouteArg, constant: Option<&RouteConstant>) -> Self {
        if !self.is_resolved() {
            return self;
        }
        let strip = |pattern: &str| -> String {
            if self.verb.inspects_pattern() {
                verbs::any(pattern).1.to_string()
            } else {
                pattern.to_string()
            }
        };

        let info = match (route, constant) {
            (RouteArg::Literal { value, .. }, _) => RouteInfo::Literal { pattern: strip(value) },
            (RouteArg::Path { .. }, Some(constant)) => RouteInfo::Constant {
                path: constant.path.clone(),
                pattern: strip(&constant.value),
            },
            (RouteArg::Path { segments, .. }, None) => RouteInfo::Dynamic {
                text: segments.join("::"),
            },
            (RouteArg::Other { text, .. }, _) => RouteInfo::Dynamic { text: text.clone() },
        };

        let diagnostic = match &info {
            RouteInfo::Dynamic { text } => Some(Diagnostic::new(
                &ROUTE_NOT_ANALYZABLE,
                self.location.clone(),
                format!("route `{text}` is not a string literal or constant; route parameters are bound at runtime"),
            )),
            RouteInfo::Literal { pattern } | RouteInfo::Constant { pattern, .. } => RoutePattern::parse(pattern)
                .err()
                .map(|error| {
                    Diagnostic::new(
                        &INVALID_ROUTE,
                        self.location.clone(),
                        format!("route `{pattern}` is not a valid pattern: {error}"),
                    )
                }),
        }
        .map(|diagnostic| diagnostic.with_sub_location(route.location().clone()));

        let model = Self {
            route: Some(info),
            ..self
        };
        match diagnostic {
            Some(diagnostic) => model.with_diagnostic(diagnostic),
            None => model,
        }
    }

    /// Classifies parameters and the response through `analyzer`.
    #[must_use]
    pub fn with_endpoint_response(self, analyzer: &dyn BindingAnalyzer, well_known: &WellKnownTypes) -> Self {
        let (Some(handler), Some(route)) = (&self.handler, &self.route) else {
            return self;
        };
        let analysis = analyzer.analyze(handler, route, &self.location, well_known);
        let mut diagnostics = self.diagnostics.clone();
        diagnostics.extend(analysis.diagnostics);
        Self {
            parameters: analysis.parameters,
            response: analysis.response,
            diagnostics,
            ..self
        }
    }
}

fn literal_pattern<'a>(route: &'a RouteArg, constant: Option<&'a RouteConstant>) -> Option<&'a str> {
    match (route, constant) {
        (RouteArg::Literal { value, .. }, _) => Some(value),
        (RouteArg::Path { .. }, Some(constant)) => Some(&constant.value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::analyzer::DefaultBindingAnalyzer;
    use crate::compilation::Compilation;
    use crate::model::{BindingSource, ResponseKind};
    use crate::syntax::{parse_file, SourceFile};

    fn models(text: &str) -> Vec<EndpointModel> {
        let compilation = Compilation::new(vec![Arc::new(parse_file(&SourceFile::new("src/lib.rs", text), "src"))]);
        compilation
            .candidates()
            .map(|candidate| {
                let input = compilation.model_input(candidate);
                build_model(&input, compilation.well_known(), &DefaultBindingAnalyzer)
            })
            .collect()
    }

    fn model(text: &str) -> EndpointModel {
        models(text).remove(0)
    }

    #[test]
    fn test_route_value_scenario() {
        let model = model("fn f() { app.map_get(\"/items/{id}\", |id: i32| id); }");

        assert!(model.diagnostics.is_empty(), "{:?}", model.diagnostics);
        assert!(model.is_emittable());
        assert_eq!(model.http_method.as_deref(), Some("GET"));
        assert_eq!(model.parameters[0].source, BindingSource::Route);
        assert_eq!(model.response.unwrap().kind, ResponseKind::JsonPrimitive);
    }

    #[test]
    fn test_unsupported_parameter_blocks_emission_only_for_that_endpoint() {
        let models = models(
            "fn f() {\n    app.map_get(\"/x\", |id: i32, x: UnsupportedType| \"ok\");\n    app.map_get(\"/y\", || \"ok\");\n}",
        );

        assert_eq!(models[0].diagnostics.len(), 1);
        assert_eq!(models[0].diagnostics[0].id, "DAE002");
        assert!(!models[0].is_emittable());
        assert!(models[1].is_emittable());
    }

    #[test]
    fn test_unresolved_handler_stops_the_chain() {
        let model = model("fn f() { app.map_get(route(), missing); }");

        assert_eq!(model.diagnostics.len(), 1);
        assert_eq!(model.diagnostics[0].id, "DAE001");
        assert_eq!(model.route, None);
        assert_eq!(model.http_method, None);
        assert!(model.parameters.is_empty());
    }

    #[test]
    fn test_map_reads_method_prefix() {
        let models = models(
            "const ROUTE: &str = \"DELETE /items/{id}\";\nfn f() {\n    app.map(\"PUT /items/{id}\", |id: u32| ());\n    app.map(ROUTE, |id: u32| ());\n    app.map(\"/any\", || ());\n}",
        );

        assert_eq!(models[0].http_method.as_deref(), Some("PUT"));
        assert_eq!(models[0].route.as_ref().unwrap().pattern(), Some("/items/{id}"));
        assert_eq!(models[1].http_method.as_deref(), Some("DELETE"));
        assert_eq!(models[1].route.as_ref().unwrap().pattern(), Some("/items/{id}"));
        assert_eq!(models[2].http_method, None);
        assert!(models.iter().all(|m| m.diagnostics.is_empty()));
    }

    #[test]
    fn test_route_warnings_do_not_block_emission() {
        let models = models(
            "fn f() {\n    app.map_get(route(), |id: i32| id);\n    app.map_get(\"items\", || 1);\n}",
        );

        assert_eq!(models[0].diagnostics[0].id, "DAE004");
        assert_eq!(models[0].parameters[0].source, BindingSource::RouteOrQuery);
        assert!(models[0].is_emittable());

        assert_eq!(models[1].diagnostics[0].id, "DAE005");
        assert!(models[1].diagnostics[0].message.contains("items"));
        assert!(models[1].is_emittable());
    }

    #[test]
    fn test_builder_is_deterministic() {
        let text = "fn f() { app.map_post(\"/items\", |item: Json<i32>, page: Option<u32>| item); }";
        assert_eq!(models(text), models(text));
    }
}
