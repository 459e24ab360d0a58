//! Thunk and overload rendering.
//!
//! Every emittable [`EndpointModel`] renders to:
//!
//! - a [`ThunkText`]: `register_metadata` and `build_invoker` functions plus
//!   the `THUNKS` table entry keyed by the endpoint's source key
//! - an [`OverloadText`]: a typed registration method on the generated
//!   extension trait, shared by every endpoint with the same verb and
//!   handler signature
//!
//! Generated code names framework types through the configured runtime
//! path and user types through `crate::` paths, so it does not depend on
//! the imports of the file it is included into.

use std::str::FromStr;

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use sha1::{Digest, Sha1};

use crate::model::{BindingSource, EndpointKey, EndpointModel, Parameter, ResponseKind};
use crate::syntax::TypeRef;
use crate::well_known::WellKnownTypes;

/// Runtime path used when none is configured.
pub const DEFAULT_RUNTIME_PATH: &str = "::daedalus";

/// Rendered thunk pair for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThunkText {
    /// Source key.
    pub key: EndpointKey,
    /// Column of the verb method name.
    pub column: u32,
    /// The `register_metadata` and `build_invoker` functions.
    pub functions: String,
    /// The `THUNKS` entry.
    pub entry: String,
}

/// Rendered typed overload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OverloadText {
    /// Method name, `{verb}_{hash}`.
    pub name: String,
    /// Trait method declaration.
    pub declaration: String,
    /// Method implementation for `EndpointRouteBuilder`.
    pub implementation: String,
}

/// Renders generated code for one compilation.
#[derive(Debug, Clone)]
pub struct Renderer<'a> {
    runtime: String,
    runtime_path: (bool, Vec<String>),
    well_known: &'a WellKnownTypes,
}

impl<'a> Renderer<'a> {
    /// Creates a renderer naming the runtime crate `runtime_path`.
    pub fn new(runtime_path: &str, well_known: &'a WellKnownTypes) -> Self {
        let leading_colon = runtime_path.starts_with("::");
        let segments = runtime_path
            .trim_start_matches("::")
            .split("::")
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            runtime: runtime_path.to_string(),
            runtime_path: (leading_colon, segments),
            well_known,
        }
    }

    /// Renders the thunk pair, or `None` if the model is not emittable.
    #[must_use]
    pub fn thunk(&self, model: &EndpointModel) -> Option<ThunkText> {
        if !model.is_emittable() {
            return None;
        }
        let response = model.response.as_ref()?;
        let rt = self.rt();
        let hash = short_hash(&model.key.to_string());
        let register = format_ident!("__register_{}", hash);
        let invoke = format_ident!("__invoke_{}", hash);
        let path = model.key.path.as_str();
        let line = model.key.line;
        let column = model.location.column;

        let tys: Vec<TypeRef> = model.parameters.iter().map(|p| self.ty(&p.ty)).collect();
        let ret = self.ty(&response.ty);
        let args: Vec<Ident> = (0..model.parameters.len()).map(|i| format_ident!("arg{}", i)).collect();
        let indices = 0..model.parameters.len();

        let bindings = model.parameters.iter().zip(&args).map(|(param, arg)| {
            let bind = self.bind(param);
            quote! {
                let #arg = match #bind {
                    Some(value) => value,
                    None => {
                        ctx.set_status(#rt::http::StatusCode::BAD_REQUEST);
                        return Ok(());
                    }
                };
            }
        });
        let arguments = model.parameters.iter().map(|param| {
            let bind = self.bind(param);
            quote!(#rt::argument(#bind))
        });
        let call = quote!(handler(#(#args),*));
        let write = self.write(response.kind, &call);
        let respond = self.respond(response.kind, &call);

        let functions = quote! {
            fn #register(_handler: &#rt::HandlerRef, builder: &mut #rt::EndpointBuilder) {
                builder.add_metadata(SourceKeyMetadata(#rt::SourceKey::new(#path, #line, #column)));
            }

            fn #invoke(handler: &#rt::HandlerRef, builder: &#rt::EndpointBuilder) -> Option<#rt::RequestDelegate> {
                let handler = ::std::sync::Arc::clone(
                    handler.downcast_ref::<::std::sync::Arc<dyn Fn(#(#tys),*) -> #ret + Send + Sync>>()?,
                );
                if !builder.has_filters() {
                    return Some(#rt::request_delegate(move |ctx: &mut #rt::HttpContext| {
                        #(#bindings)*
                        #write
                        Ok(())
                    }));
                }
                let core = #rt::filter_delegate(move |invocation: &mut #rt::InvocationContext<'_>| {
                    if invocation.http().status() == #rt::http::StatusCode::BAD_REQUEST {
                        return Ok(#rt::EndpointResult::Empty);
                    }
                    #(let #args = invocation.take_argument::<#tys>(#indices)?;)*
                    #respond
                });
                let filtered = #rt::build_filter_delegate(core, builder);
                Some(#rt::filtered_request_delegate(
                    move |ctx: &mut #rt::HttpContext| {
                        let arguments: ::std::vec::Vec<#rt::Argument> = ::std::vec![#(#arguments),*];
                        if arguments.iter().any(Option::is_none) {
                            ctx.set_status(#rt::http::StatusCode::BAD_REQUEST);
                        }
                        Ok(arguments)
                    },
                    filtered,
                ))
            }
        };
        let entry = quote! {
            (
                #rt::SourceKey::new(#path, #line, #column),
                #rt::Thunk { register_metadata: #register, build_invoker: #invoke },
            ),
        };

        Some(ThunkText {
            key: model.key.clone(),
            column: model.location.column,
            functions: functions.to_string(),
            entry: entry.to_string(),
        })
    }

    /// Renders the typed overload, or `None` if the model is not emittable.
    #[must_use]
    pub fn overload(&self, model: &EndpointModel) -> Option<OverloadText> {
        if !model.is_emittable() {
            return None;
        }
        let response = model.response.as_ref()?;
        let rt = self.rt();
        let tys: Vec<TypeRef> = model.parameters.iter().map(|p| self.ty(&p.ty)).collect();
        let ret = self.ty(&response.ty);

        let signature = format!(
            "fn({}) -> {ret}",
            tys.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        );
        let name = format!("{}_{}", model.verb.method_name(), short_hash(&signature));
        let method = format_ident!("{}", name);
        let resolver = format_ident!("{}", model.verb.resolver());

        let head = quote! {
            #[track_caller]
            fn #method<F>(&mut self, pattern: &str, handler: F) -> #rt::RouteHandlerBuilder<'_>
            where
                F: Fn(#(#tys),*) -> #ret + Send + Sync + 'static
        };
        let declaration = quote!(#head;);
        let implementation = quote! {
            #head
            {
                let (handler, fallback) = <F as #rt::Handler<(#(#tys,)*)>>::into_parts(handler);
                self.map_core(pattern, handler, Some(fallback), #rt::verbs::#resolver, ::std::panic::Location::caller())
            }
        };

        Some(OverloadText {
            name,
            declaration: declaration.to_string(),
            implementation: implementation.to_string(),
        })
    }

    /// The runtime path as tokens.
    pub(crate) fn rt(&self) -> TokenStream {
        TokenStream::from_str(&self.runtime)
            .or_else(|_| TokenStream::from_str(DEFAULT_RUNTIME_PATH))
            .unwrap_or_default()
    }

    /// Rewrites well-known bare names to absolute paths.
    fn ty(&self, ty: &TypeRef) -> TypeRef {
        match ty {
            TypeRef::Path {
                leading_colon,
                segments,
                generics,
            } => {
                let generics = generics.iter().map(|g| self.ty(g)).collect();
                match (segments.as_slice(), *leading_colon) {
                    ([name], false) if !self.is_shadowed(name) => {
                        if let Some((leading_colon, segments)) = self.canonical(name) {
                            return TypeRef::Path {
                                leading_colon,
                                segments,
                                generics,
                            };
                        }
                        TypeRef::Path {
                            leading_colon: false,
                            segments: segments.clone(),
                            generics,
                        }
                    }
                    _ => TypeRef::Path {
                        leading_colon: *leading_colon,
                        segments: segments.clone(),
                        generics,
                    },
                }
            }
            TypeRef::Reference { lifetime, mutable, elem } => TypeRef::Reference {
                lifetime: lifetime.clone(),
                mutable: *mutable,
                elem: Box::new(self.ty(elem)),
            },
            TypeRef::Tuple(items) => TypeRef::Tuple(items.iter().map(|t| self.ty(t)).collect()),
            TypeRef::ImplTrait(_) | TypeRef::Other(_) => ty.clone(),
        }
    }

    fn is_shadowed(&self, name: &str) -> bool {
        self.well_known.shadowed().any(|s| s == name)
    }

    fn canonical(&self, name: &str) -> Option<(bool, Vec<String>)> {
        let std_path = |module: &str| Some((true, vec!["std".to_string(), module.to_string(), name.to_string()]));
        let runtime = |inner: &[&str]| {
            let (leading_colon, base) = &self.runtime_path;
            let mut segments = base.clone();
            segments.extend(inner.iter().map(|s| (*s).to_string()));
            segments.push(name.to_string());
            Some((*leading_colon, segments))
        };
        match name {
            "String" => std_path("string"),
            "Option" => std_path("option"),
            "Result" => std_path("result"),
            "Json" | "Inject" | "EndpointResult" => runtime(&[]),
            "Method" | "HeaderMap" | "StatusCode" => runtime(&["http"]),
            "Bytes" => runtime(&["bytes"]),
            _ => None,
        }
    }

    /// Expression of type `Option<T>` for the parameter's declared type `T`,
    /// `None` when binding fails.
    fn bind(&self, param: &Parameter) -> TokenStream {
        let rt = self.rt();
        let name = param.name.as_str();
        let value_ty = self.ty(&param.value_ty);
        let raw = match param.source {
            BindingSource::Route => quote!(ctx.route_value(#name)),
            BindingSource::Query => quote!(ctx.query_value(#name)),
            BindingSource::RouteOrQuery => quote!(ctx.route_value(#name).or_else(|| ctx.query_value(#name))),
            BindingSource::JsonBody => return quote!(ctx.read_json::<#value_ty>().ok().map(#rt::Json)),
            BindingSource::Service => {
                return quote!(Some(#rt::Inject(ctx.services().resolve_required::<#value_ty>()?)));
            }
            BindingSource::Method => return quote!(Some(ctx.method().clone())),
            BindingSource::Headers => return quote!(Some(ctx.headers().clone())),
            BindingSource::Body => return quote!(Some(ctx.body().clone())),
        };
        if param.optional {
            quote! {
                match #raw {
                    None => Some(None),
                    Some(raw) => raw.parse::<#value_ty>().ok().map(Some),
                }
            }
        } else {
            quote!(#raw.and_then(|raw| raw.parse::<#value_ty>().ok()))
        }
    }

    /// Statements that invoke the handler and write its result to `ctx`.
    fn write(&self, kind: ResponseKind, call: &TokenStream) -> TokenStream {
        let rt = self.rt();
        match kind {
            ResponseKind::Text => quote!(ctx.write_text(#call);),
            ResponseKind::Char => quote!(ctx.write_text(#call.to_string());),
            ResponseKind::JsonPrimitive => quote!(ctx.write_json(&#call)?;),
            ResponseKind::Unit => quote!(#call;),
            ResponseKind::Json => quote!(ctx.write_json(&#call.0)?;),
            ResponseKind::Status => quote!(ctx.set_status(#call);),
            ResponseKind::EndpointResult => quote!(#call.execute(ctx)?;),
            ResponseKind::Generic => quote!(#rt::IntoEndpointResult::into_result(#call).execute(ctx)?;),
        }
    }

    /// Expression that invokes the handler and yields its `EndpointResult`.
    fn respond(&self, kind: ResponseKind, call: &TokenStream) -> TokenStream {
        let rt = self.rt();
        match kind {
            ResponseKind::Text => quote!(Ok(#rt::EndpointResult::text(#call))),
            ResponseKind::Char => quote!(Ok(#rt::EndpointResult::text(#call.to_string()))),
            ResponseKind::JsonPrimitive => quote!(#rt::EndpointResult::json(&#call)),
            ResponseKind::Unit => quote! {
                #call;
                Ok(#rt::EndpointResult::Empty)
            },
            ResponseKind::Json => quote!(#rt::EndpointResult::json(&#call.0)),
            ResponseKind::Status => quote!(Ok(#rt::EndpointResult::Status(#call))),
            ResponseKind::EndpointResult => quote!(Ok(#call)),
            ResponseKind::Generic => quote!(Ok(#rt::IntoEndpointResult::into_result(#call))),
        }
    }
}

/// First ten hex digits of the SHA-1 of `text`.
pub fn short_hash(text: &str) -> String {
    let digest = Sha1::digest(text.as_bytes());
    let mut hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    hex.truncate(10);
    hex
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::analyzer::DefaultBindingAnalyzer;
    use crate::builder::build_model;
    use crate::compilation::Compilation;
    use crate::syntax::{parse_file, SourceFile};

    fn build(files: &[(&str, &str)]) -> (Compilation, Vec<EndpointModel>) {
        let compilation = Compilation::new(
            files
                .iter()
                .map(|(path, text)| Arc::new(parse_file(&SourceFile::new(*path, *text), "src")))
                .collect(),
        );
        let models = compilation
            .candidates()
            .map(|c| build_model(&compilation.model_input(c), compilation.well_known(), &DefaultBindingAnalyzer))
            .collect();
        (compilation, models)
    }

    fn render(text: &str) -> (Vec<Option<ThunkText>>, Vec<Option<OverloadText>>) {
        let (compilation, models) = build(&[("src/lib.rs", text)]);
        let renderer = Renderer::new(DEFAULT_RUNTIME_PATH, compilation.well_known());
        (
            models.iter().map(|m| renderer.thunk(m)).collect(),
            models.iter().map(|m| renderer.overload(m)).collect(),
        )
    }

    #[test]
    fn test_route_value_thunk() {
        let (thunks, overloads) = render("fn f() {\n    app.map_get(\"/items/{id}\", |id: i32| id);\n}");
        let thunk = thunks[0].as_ref().unwrap();

        assert_eq!(thunk.key.to_string(), "src/lib.rs:2");
        assert!(thunk.functions.contains("route_value (\"id\")"));
        assert!(thunk.functions.contains("parse :: < i32 >"));
        assert!(thunk.functions.contains("write_json"));
        assert!(thunk.functions.contains("has_filters"));
        assert!(thunk.entry.contains("SourceKey :: new (\"src/lib.rs\" , 2u32 , 9u32)"));
        syn::parse_file(&thunk.functions).unwrap();

        let overload = overloads[0].as_ref().unwrap();
        assert!(overload.name.starts_with("map_get_"));
        assert_eq!(overload.name.len(), "map_get_".len() + 10);
        assert!(overload.implementation.contains("verbs :: get"));
    }

    #[test]
    fn test_types_are_rendered_absolute() {
        let (thunks, _) = render(
            "pub struct Item;\nfn f() {\n    app.map_post(\"/items\", |item: Json<Item>, page: Option<u32>| -> Json<Item> { item });\n}",
        );
        let functions = &thunks[0].as_ref().unwrap().functions;

        assert!(functions.contains(":: daedalus :: Json < crate :: Item >"));
        assert!(functions.contains(":: std :: option :: Option < u32 >"));
        assert!(functions.contains("query_value (\"page\")"));
        assert!(functions.contains("read_json :: < crate :: Item >"));
    }

    #[test]
    fn test_custom_runtime_path() {
        let (compilation, models) = build(&[("src/lib.rs", "fn f() { app.map_get(\"/\", || StatusCode::OK); }")]);
        let renderer = Renderer::new("crate::rt", compilation.well_known());
        // `StatusCode::OK` is not inferable, so the model is not emittable.
        assert!(renderer.thunk(&models[0]).is_none());

        let (compilation, models) = build(&[(
            "src/lib.rs",
            "fn f() { app.map_get(\"/\", |h: HeaderMap| -> StatusCode { StatusCode::OK }); }",
        )]);
        let renderer = Renderer::new("crate::rt", compilation.well_known());
        let thunk = renderer.thunk(&models[0]).unwrap();
        assert!(thunk.functions.contains("crate :: rt :: http :: HeaderMap"));
        assert!(thunk.functions.contains("set_status"));
    }

    #[test]
    fn test_models_with_errors_render_nothing() {
        let (thunks, overloads) = render(
            "fn f() {\n    app.map_get(\"/x\", |id: i32, x: UnsupportedType| \"ok\");\n    app.map_get(\"/y\", || \"ok\");\n}",
        );
        assert!(thunks[0].is_none());
        assert!(overloads[0].is_none());
        assert!(thunks[1].is_some());
        assert!(overloads[1].is_some());
    }

    #[test]
    fn test_same_signature_shares_overload_name() {
        let (thunks, overloads) = render(
            "fn f() {\n    app.map_get(\"/a/{id}\", |id: i32| id);\n    app.map_get(\"/b/{id}\", |id: i32| id);\n    app.map_post(\"/c/{id}\", |id: i32| id);\n}",
        );
        let names: Vec<&str> = overloads.iter().map(|o| o.as_ref().unwrap().name.as_str()).collect();
        assert_eq!(names[0], names[1]);
        assert_ne!(names[0], names[2]);

        let keys: Vec<String> = thunks.iter().map(|t| t.as_ref().unwrap().key.to_string()).collect();
        assert_eq!(keys, vec!["src/lib.rs:2", "src/lib.rs:3", "src/lib.rs:4"]);
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("abc"), "a9993e3647");
        assert_eq!(short_hash("").len(), 10);
    }
}
