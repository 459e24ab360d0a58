//! The compilation: every lowered file plus the shared, read-only services
//! analysis needs.

use std::sync::{Arc, OnceLock};

use crate::diagnostics::{Diagnostic, UNRESOLVED_HANDLER};
use crate::model::HandlerSignature;
use crate::symbols::{Resolution, SymbolIndex};
use crate::syntax::{Candidate, FileSyntax, HandlerArg, ParamSig, RouteArg};
use crate::well_known::WellKnownTypes;

/// A resolved route constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteConstant {
    /// Full path.
    pub path: String,
    /// Value.
    pub value: String,
}

/// Everything the model builder reads for one candidate.
///
/// This is the cache key of the model stage, so it holds the resolved
/// symbols by value: editing a handler in another file invalidates only the
/// endpoints that use it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelInput {
    /// The registration.
    pub candidate: Candidate,
    /// The resolved handler, or the DAE001 diagnostic.
    pub handler: Result<HandlerSignature, Diagnostic>,
    /// The route constant, when the pattern argument names one.
    pub route_constant: Option<RouteConstant>,
    /// Fingerprint of the well-known type table.
    pub well_known: u64,
}

/// Lowered files and the services built from them.
#[derive(Debug)]
pub struct Compilation {
    files: Vec<Arc<FileSyntax>>,
    symbols: SymbolIndex,
    well_known: OnceLock<WellKnownTypes>,
}

impl Compilation {
    /// Indexes `files`.
    #[must_use]
    pub fn new(files: Vec<Arc<FileSyntax>>) -> Self {
        let symbols = SymbolIndex::build(files.iter().map(AsRef::as_ref));
        Self {
            files,
            symbols,
            well_known: OnceLock::new(),
        }
    }

    /// The lowered files.
    #[must_use]
    pub fn files(&self) -> &[Arc<FileSyntax>] {
        &self.files
    }

    /// The symbol index.
    #[must_use]
    pub fn symbols(&self) -> &SymbolIndex {
        &self.symbols
    }

    /// The well-known type table, built on first use.
    pub fn well_known(&self) -> &WellKnownTypes {
        self.well_known.get_or_init(|| WellKnownTypes::new(self.symbols.type_paths()))
    }

    /// Every candidate, in file order.
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.files.iter().flat_map(|file| file.candidates.iter())
    }

    /// Every file-level diagnostic (parse failures).
    pub fn file_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.files.iter().flat_map(|file| file.diagnostics.iter())
    }

    /// Resolves the symbols `candidate` refers to.
    #[must_use]
    pub fn model_input(&self, candidate: &Candidate) -> ModelInput {
        let route_constant = match &candidate.route {
            RouteArg::Path { segments, .. } => self
                .symbols
                .resolve_constant(&candidate.module_path, segments)
                .found()
                .map(|value| RouteConstant {
                    path: segments.join("::"),
                    value: value.to_string(),
                }),
            RouteArg::Literal { .. } | RouteArg::Other { .. } => None,
        };
        ModelInput {
            candidate: candidate.clone(),
            handler: self.resolve_handler(candidate),
            route_constant,
            well_known: self.well_known().fingerprint(),
        }
    }

    fn resolve_handler(&self, candidate: &Candidate) -> Result<HandlerSignature, Diagnostic> {
        let unresolved = |location, message: String| {
            Diagnostic::new(&UNRESOLVED_HANDLER, candidate.location.clone(), message).with_sub_location(location)
        };
        let module = &candidate.module_path;

        match &candidate.handler {
            HandlerArg::Closure(closure) => {
                if closure.is_async {
                    return Err(unresolved(
                        closure.output_location.clone(),
                        "async handlers are not supported".to_string(),
                    ));
                }
                Ok(HandlerSignature {
                    params: self.qualify_params(&closure.params, module),
                    output: closure.output.as_ref().map(|ty| self.symbols.qualify(ty, module)),
                    output_location: closure.output_location.clone(),
                    description: "closure".to_string(),
                })
            }
            HandlerArg::Path { segments, location } => {
                let written = segments.join("::");
                match self.symbols.resolve_function(module, segments) {
                    Resolution::Found(function) => {
                        if let Some(reason) = function.unsupported {
                            return Err(unresolved(location.clone(), format!("handler `{written}`: {reason}")));
                        }
                        Ok(HandlerSignature {
                            params: self.qualify_params(&function.params, &function.module_path),
                            output: Some(self.symbols.qualify(&function.output, &function.module_path)),
                            output_location: function.location.clone(),
                            description: function.path.join("::"),
                        })
                    }
                    Resolution::Unresolved => Err(unresolved(
                        location.clone(),
                        format!("cannot resolve handler `{written}`"),
                    )),
                    Resolution::Ambiguous(paths) => Err(unresolved(
                        location.clone(),
                        format!("handler `{written}` is ambiguous: {}", paths.join(", ")),
                    )),
                }
            }
            HandlerArg::Other { text, location } => Err(unresolved(
                location.clone(),
                format!("handler expression `{text}` cannot be analyzed; pass a closure or a function path"),
            )),
        }
    }

    fn qualify_params(&self, params: &[ParamSig], module: &[String]) -> Vec<ParamSig> {
        params
            .iter()
            .map(|param| ParamSig {
                ty: param.ty.as_ref().map(|ty| self.symbols.qualify(ty, module)),
                ..param.clone()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{parse_file, SourceFile};

    fn compilation(files: &[(&str, &str)]) -> Compilation {
        Compilation::new(
            files
                .iter()
                .map(|(path, text)| Arc::new(parse_file(&SourceFile::new(*path, *text), "src")))
                .collect(),
        )
    }

    #[test]
    fn test_closure_types_are_qualified() {
        let compilation = compilation(&[
            ("src/models.rs", "pub struct Item;"),
            ("src/lib.rs", "fn f() { app.map_post(\"/items\", |item: Json<Item>| item); }"),
        ]);
        let candidate = compilation.candidates().next().unwrap();
        let input = compilation.model_input(candidate);
        let handler = input.handler.unwrap();

        assert_eq!(handler.description, "closure");
        assert_eq!(handler.params[0].ty.as_ref().unwrap().to_string(), "Json<crate::models::Item>");
        assert_eq!(handler.output.unwrap().to_string(), "Json<crate::models::Item>");
    }

    #[test]
    fn test_function_handler_and_route_constant() {
        let compilation = compilation(&[
            (
                "src/api.rs",
                "pub const ITEM: &str = \"/items/{id}\";\npub struct Item;\npub fn get(id: u64) -> Json<Item> { todo!() }",
            ),
            ("src/lib.rs", "fn f() { app.map_get(api::ITEM, api::get); }"),
        ]);
        let candidate = compilation.candidates().next().unwrap();
        let input = compilation.model_input(candidate);

        let handler = input.handler.unwrap();
        assert_eq!(handler.description, "crate::api::get");
        assert_eq!(handler.output.unwrap().to_string(), "Json<crate::api::Item>");
        assert_eq!(input.route_constant.unwrap().value, "/items/{id}");
    }

    #[test]
    fn test_unresolvable_handlers() {
        let compilation = compilation(&[(
            "src/lib.rs",
            "async fn slow() {}\nfn f() {\n    app.map_get(\"/a\", missing);\n    app.map_get(\"/b\", slow);\n    app.map_get(\"/c\", make_handler());\n    app.map_get(\"/d\", || async { 1 });\n}",
        )]);
        let errors: Vec<Diagnostic> = compilation
            .candidates()
            .map(|c| compilation.model_input(c).handler.unwrap_err())
            .collect();

        assert!(errors.iter().all(|d| d.id == "DAE001"));
        assert!(errors[0].message.contains("cannot resolve handler `missing`"));
        assert!(errors[1].message.contains("async functions"));
        assert!(errors[2].message.contains("cannot be analyzed"));
        assert!(errors[3].message.contains("async handlers"));
        assert_eq!(errors[0].location.line, 3);
    }

    #[test]
    fn test_well_known_is_built_once() {
        let compilation = compilation(&[("src/lib.rs", "pub struct Json;")]);
        let first: *const WellKnownTypes = compilation.well_known();
        let second: *const WellKnownTypes = compilation.well_known();
        assert_eq!(first, second);
        assert_eq!(compilation.well_known().shadowed().collect::<Vec<_>>(), vec!["Json"]);
    }
}
