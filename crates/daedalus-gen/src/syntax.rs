//! Parsing and lowering.
//!
//! `syn` trees hold spans that cannot leave the thread that created them,
//! so each file is parsed and immediately lowered into the owned value types
//! of this module: registration [`Candidate`]s, function signatures, string
//! constants and declared type names. Everything downstream works on these
//! values only.

use std::fmt;
use std::str::FromStr;

use proc_macro2::{Span, TokenStream};
use quote::ToTokens;
use serde::Serialize;
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::visit::{self, Visit};
use syn::{
    Expr, ExprClosure, ExprMethodCall, FnArg, GenericArgument, ImplItem, Lit, Pat, PathArguments, ReturnType,
    Signature, Stmt, Type,
};

use crate::diagnostics::{Diagnostic, PARSE_FAILURE};
use crate::filter::{is_candidate, Verb};

/// One source file, path relative to the crate root with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    /// Relative path, e.g. `src/api/items.rs`.
    pub path: String,
    /// File contents.
    pub text: String,
}

impl SourceFile {
    /// Creates a source file.
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// A position in a source file. Line and column are one-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Location {
    /// Relative file path.
    pub file: String,
    /// Line.
    pub line: u32,
    /// Column, in characters.
    pub column: u32,
}

impl Location {
    /// Creates a location.
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    fn of(file: &str, span: Span) -> Self {
        let start = span.start();
        Self {
            file: file.to_string(),
            line: u32::try_from(start.line).unwrap_or(u32::MAX),
            column: u32::try_from(start.column + 1).unwrap_or(u32::MAX),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// An owned, simplified Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// `a::b::C<T, U>`; only the last segment carries generics.
    Path {
        /// Written with a leading `::`.
        leading_colon: bool,
        /// Path segments.
        segments: Vec<String>,
        /// Type arguments of the last segment.
        generics: Vec<TypeRef>,
    },
    /// `&'a mut T`.
    Reference {
        /// Lifetime name without the apostrophe.
        lifetime: Option<String>,
        /// `mut`.
        mutable: bool,
        /// Referenced type.
        elem: Box<TypeRef>,
    },
    /// `(A, B)`; the empty tuple is unit.
    Tuple(Vec<TypeRef>),
    /// `impl Trait`, kept as text.
    ImplTrait(String),
    /// Anything else, kept as text.
    Other(String),
}

impl TypeRef {
    /// The unit type.
    #[must_use]
    pub fn unit() -> Self {
        Self::Tuple(Vec::new())
    }

    /// A single-segment path without generics.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Path {
            leading_colon: false,
            segments: vec![name.into()],
            generics: Vec::new(),
        }
    }

    /// `&'static str`.
    #[must_use]
    pub fn static_str() -> Self {
        Self::Reference {
            lifetime: Some("static".to_string()),
            mutable: false,
            elem: Box::new(Self::named("str")),
        }
    }

    /// Lowers a `syn` type.
    #[must_use]
    pub fn from_syn(ty: &Type) -> Self {
        match ty {
            Type::Path(path) if path.qself.is_none() => {
                let count = path.path.segments.len();
                let mut segments = Vec::with_capacity(count);
                let mut generics = Vec::new();
                for (index, segment) in path.path.segments.iter().enumerate() {
                    segments.push(segment.ident.to_string());
                    match &segment.arguments {
                        PathArguments::None => {}
                        PathArguments::AngleBracketed(args) if index + 1 == count => {
                            for arg in &args.args {
                                match arg {
                                    GenericArgument::Type(inner) => generics.push(Self::from_syn(inner)),
                                    _ => return Self::Other(text(ty)),
                                }
                            }
                        }
                        _ => return Self::Other(text(ty)),
                    }
                }
                Self::Path {
                    leading_colon: path.path.leading_colon.is_some(),
                    segments,
                    generics,
                }
            }
            Type::Reference(reference) => Self::Reference {
                lifetime: reference.lifetime.as_ref().map(|l| l.ident.to_string()),
                mutable: reference.mutability.is_some(),
                elem: Box::new(Self::from_syn(&reference.elem)),
            },
            Type::Tuple(tuple) => Self::Tuple(tuple.elems.iter().map(Self::from_syn).collect()),
            Type::Paren(paren) => Self::from_syn(&paren.elem),
            Type::Group(group) => Self::from_syn(&group.elem),
            Type::ImplTrait(_) => Self::ImplTrait(text(ty)),
            _ => Self::Other(text(ty)),
        }
    }

    /// Returns true for `()`.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Tuple(items) if items.is_empty())
    }

    /// Returns true if `impl Trait` appears anywhere in the type.
    #[must_use]
    pub fn contains_impl_trait(&self) -> bool {
        match self {
            Self::ImplTrait(_) => true,
            Self::Path { generics, .. } => generics.iter().any(Self::contains_impl_trait),
            Self::Reference { elem, .. } => elem.contains_impl_trait(),
            Self::Tuple(items) => items.iter().any(Self::contains_impl_trait),
            Self::Other(_) => false,
        }
    }

    /// Rewrites every path with `rewrite`, innermost generics included.
    ///
    /// `rewrite` sees the segments of paths written without a leading `::`
    /// and returns replacement segments, or `None` to keep them.
    #[must_use]
    pub fn map_paths(&self, rewrite: &dyn Fn(&[String]) -> Option<Vec<String>>) -> Self {
        match self {
            Self::Path {
                leading_colon,
                segments,
                generics,
            } => {
                let segments = if *leading_colon {
                    segments.clone()
                } else {
                    rewrite(segments).unwrap_or_else(|| segments.clone())
                };
                Self::Path {
                    leading_colon: *leading_colon,
                    segments,
                    generics: generics.iter().map(|g| g.map_paths(rewrite)).collect(),
                }
            }
            Self::Reference { lifetime, mutable, elem } => Self::Reference {
                lifetime: lifetime.clone(),
                mutable: *mutable,
                elem: Box::new(elem.map_paths(rewrite)),
            },
            Self::Tuple(items) => Self::Tuple(items.iter().map(|t| t.map_paths(rewrite)).collect()),
            Self::ImplTrait(_) | Self::Other(_) => self.clone(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path {
                leading_colon,
                segments,
                generics,
            } => {
                if *leading_colon {
                    f.write_str("::")?;
                }
                f.write_str(&segments.join("::"))?;
                if !generics.is_empty() {
                    f.write_str("<")?;
                    for (index, generic) in generics.iter().enumerate() {
                        if index > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{generic}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Reference { lifetime, mutable, elem } => {
                f.write_str("&")?;
                if let Some(lifetime) = lifetime {
                    write!(f, "'{lifetime} ")?;
                }
                if *mutable {
                    f.write_str("mut ")?;
                }
                write!(f, "{elem}")
            }
            Self::Tuple(items) => {
                f.write_str("(")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Self::ImplTrait(text) | Self::Other(text) => f.write_str(text),
        }
    }
}

impl ToTokens for TypeRef {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        // Display output of a lowered type is always valid Rust.
        if let Ok(stream) = TokenStream::from_str(&self.to_string()) {
            tokens.extend(stream);
        }
    }
}

fn text(node: &impl ToTokens) -> String {
    node.to_token_stream().to_string()
}

/// One handler parameter as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamSig {
    /// Identifier bound by the pattern, if any.
    pub name: Option<String>,
    /// Declared type; `None` for an unannotated closure parameter.
    pub ty: Option<TypeRef>,
    /// The parameter's location.
    pub location: Location,
}

impl ParamSig {
    /// Name used to look the value up in the request.
    ///
    /// A leading underscore is dropped, so `_id` binds `id`.
    #[must_use]
    pub fn binding_name(&self) -> Option<&str> {
        let name = self.name.as_deref()?;
        match name.strip_prefix('_') {
            Some(rest) if !rest.is_empty() => Some(rest),
            _ => Some(name),
        }
    }
}

/// Why a function cannot be used as a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unsupported {
    /// `async fn`.
    Async,
    /// Generic parameters on the function or its impl block.
    Generic,
    /// A `self` receiver.
    Receiver,
    /// `impl Trait` in argument position.
    ImplTrait,
    /// `unsafe fn`.
    Unsafe,
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Async => "async functions are not supported as handlers",
            Self::Generic => "generic functions are not supported as handlers",
            Self::Receiver => "methods taking `self` are not supported as handlers",
            Self::ImplTrait => "`impl Trait` parameters are not supported",
            Self::Unsafe => "unsafe functions are not supported as handlers",
        })
    }
}

/// A named function, free or associated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FnSignature {
    /// Full path: `crate::api::list` or `crate::api::Items::list`.
    pub path: Vec<String>,
    /// Module the function is declared in, used to qualify its types.
    pub module_path: Vec<String>,
    /// Parameters.
    pub params: Vec<ParamSig>,
    /// Return type, `()` when omitted.
    pub output: TypeRef,
    /// Why this function cannot be a handler, if it cannot.
    pub unsupported: Option<Unsupported>,
    /// The function name's location.
    pub location: Location,
}

/// A `const` or `static` string item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstSymbol {
    /// Full path.
    pub path: Vec<String>,
    /// String value.
    pub value: String,
}

/// A closure handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClosureSig {
    /// Parameters.
    pub params: Vec<ParamSig>,
    /// Annotated or inferred return type; `None` if it cannot be inferred.
    pub output: Option<TypeRef>,
    /// Where the return type comes from (annotation or body).
    pub output_location: Location,
    /// `async` closure, or a closure returning an `async` block.
    pub is_async: bool,
}

/// The pattern argument of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteArg {
    /// A string literal.
    Literal {
        /// Literal value.
        value: String,
        /// Literal location.
        location: Location,
    },
    /// A path, possibly naming a string constant.
    Path {
        /// Path segments.
        segments: Vec<String>,
        /// Path location.
        location: Location,
    },
    /// Any other expression.
    Other {
        /// Expression text.
        text: String,
        /// Expression location.
        location: Location,
    },
}

impl RouteArg {
    /// The argument's location.
    #[must_use]
    pub fn location(&self) -> &Location {
        match self {
            Self::Literal { location, .. } | Self::Path { location, .. } | Self::Other { location, .. } => location,
        }
    }
}

/// The handler argument of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HandlerArg {
    /// `|a: T| ...`.
    Closure(ClosureSig),
    /// `handler`, `module::handler`, `Type::handler`.
    Path {
        /// Path segments.
        segments: Vec<String>,
        /// Path location.
        location: Location,
    },
    /// Any other expression.
    Other {
        /// Expression text.
        text: String,
        /// Expression location.
        location: Location,
    },
}

/// A registration call that passed the filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// The verb called.
    pub verb: Verb,
    /// Location of the verb's name token.
    pub location: Location,
    /// Module containing the call.
    pub module_path: Vec<String>,
    /// Pattern argument.
    pub route: RouteArg,
    /// Handler argument.
    pub handler: HandlerArg,
    /// Handler expression text, for diagnostics.
    pub handler_text: String,
}

/// Everything lowered from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSyntax {
    /// Relative path.
    pub path: String,
    /// Registration candidates in source order.
    pub candidates: Vec<Candidate>,
    /// Functions that may serve as handlers.
    pub functions: Vec<FnSignature>,
    /// String constants that may serve as patterns.
    pub constants: Vec<ConstSymbol>,
    /// Full paths of declared types.
    pub types: Vec<Vec<String>>,
    /// Parse failures.
    pub diagnostics: Vec<Diagnostic>,
}

/// Derives a file's module path from its location under `source_root`.
///
/// `src/lib.rs` and `src/main.rs` are the crate root, `src/api/mod.rs` and
/// `src/api.rs` are `crate::api`.
#[must_use]
pub fn module_path_for(path: &str, source_root: &str) -> Vec<String> {
    let components = |p: &'_ str| -> Vec<String> {
        p.split(['/', '\\'])
            .filter(|c| !c.is_empty() && *c != ".")
            .map(str::to_string)
            .collect()
    };
    let root = components(source_root);
    let mut rest = components(path);
    if rest.starts_with(&root) {
        rest.drain(..root.len());
    }

    let mut module = vec!["crate".to_string()];
    let Some((file, dirs)) = rest.split_last() else {
        return module;
    };
    module.extend(dirs.iter().cloned());
    let stem = file.strip_suffix(".rs").unwrap_or(file);
    let is_root_file = dirs.is_empty() && (stem == "lib" || stem == "main");
    if !is_root_file && stem != "mod" {
        module.push(stem.to_string());
    }
    module
}

/// Parses and lowers one file.
///
/// A file that does not parse yields a DAE007 diagnostic and nothing else.
#[must_use]
pub fn parse_file(file: &SourceFile, source_root: &str) -> FileSyntax {
    let mut syntax = FileSyntax {
        path: file.path.clone(),
        ..FileSyntax::default()
    };
    match syn::parse_file(&file.text) {
        Ok(ast) => {
            let mut lowering = Lowering {
                file: &file.path,
                module: module_path_for(&file.path, source_root),
                syntax: &mut syntax,
            };
            lowering.visit_file(&ast);
        }
        Err(err) => {
            let location = Location::of(&file.path, err.span());
            syntax
                .diagnostics
                .push(Diagnostic::new(&PARSE_FAILURE, location, format!("failed to parse file: {err}")));
        }
    }
    syntax
}

struct Lowering<'a> {
    file: &'a str,
    module: Vec<String>,
    syntax: &'a mut FileSyntax,
}

impl Lowering<'_> {
    fn location(&self, span: Span) -> Location {
        Location::of(self.file, span)
    }

    fn item_path(&self, names: &[String]) -> Vec<String> {
        self.module.iter().chain(names).cloned().collect()
    }

    fn lower_fn(&self, sig: &Signature, path: Vec<String>) -> FnSignature {
        let mut unsupported = None;
        let mut params = Vec::with_capacity(sig.inputs.len());
        for input in &sig.inputs {
            match input {
                FnArg::Receiver(_) => unsupported = Some(Unsupported::Receiver),
                FnArg::Typed(typed) => {
                    let ty = TypeRef::from_syn(&typed.ty);
                    if ty.contains_impl_trait() {
                        unsupported = unsupported.or(Some(Unsupported::ImplTrait));
                    }
                    params.push(ParamSig {
                        name: pattern_name(&typed.pat),
                        ty: Some(ty),
                        location: self.location(typed.span()),
                    });
                }
            }
        }
        if sig.asyncness.is_some() {
            unsupported = Some(Unsupported::Async);
        } else if sig.unsafety.is_some() {
            unsupported = Some(Unsupported::Unsafe);
        } else if !sig.generics.params.is_empty() {
            unsupported = Some(Unsupported::Generic);
        }
        let output = match &sig.output {
            ReturnType::Default => TypeRef::unit(),
            ReturnType::Type(_, ty) => TypeRef::from_syn(ty),
        };
        FnSignature {
            path,
            module_path: self.module.clone(),
            params,
            output,
            unsupported,
            location: self.location(sig.ident.span()),
        }
    }

    fn lower_candidate(&self, call: &ExprMethodCall) -> Option<Candidate> {
        let verb = Verb::from_method_name(&call.method.to_string())?;
        let mut args = call.args.iter();
        let (route, handler) = (args.next()?, args.next()?);
        Some(Candidate {
            verb,
            location: self.location(call.method.span()),
            module_path: self.module.clone(),
            route: self.lower_route(route),
            handler: self.lower_handler(handler),
            handler_text: text(handler),
        })
    }

    fn lower_route(&self, expr: &Expr) -> RouteArg {
        match expr {
            Expr::Lit(lit) => match &lit.lit {
                Lit::Str(value) => RouteArg::Literal {
                    value: value.value(),
                    location: self.location(lit.span()),
                },
                _ => self.other_route(expr),
            },
            Expr::Path(path) if path.qself.is_none() => RouteArg::Path {
                segments: path_segments(&path.path),
                location: self.location(path.span()),
            },
            Expr::Reference(reference) => self.lower_route(&reference.expr),
            Expr::Paren(paren) => self.lower_route(&paren.expr),
            Expr::Group(group) => self.lower_route(&group.expr),
            _ => self.other_route(expr),
        }
    }

    fn other_route(&self, expr: &Expr) -> RouteArg {
        RouteArg::Other {
            text: text(expr),
            location: self.location(expr.span()),
        }
    }

    fn lower_handler(&self, expr: &Expr) -> HandlerArg {
        match expr {
            Expr::Closure(closure) => HandlerArg::Closure(self.lower_closure(closure)),
            Expr::Path(path)
                if path.qself.is_none()
                    && path.path.segments.iter().all(|s| s.arguments.is_none()) =>
            {
                HandlerArg::Path {
                    segments: path_segments(&path.path),
                    location: self.location(path.span()),
                }
            }
            Expr::Paren(paren) => self.lower_handler(&paren.expr),
            Expr::Group(group) => self.lower_handler(&group.expr),
            _ => HandlerArg::Other {
                text: text(expr),
                location: self.location(expr.span()),
            },
        }
    }

    fn lower_closure(&self, closure: &ExprClosure) -> ClosureSig {
        let params: Vec<ParamSig> = closure
            .inputs
            .iter()
            .map(|pat| match pat {
                Pat::Type(typed) => ParamSig {
                    name: pattern_name(&typed.pat),
                    ty: Some(TypeRef::from_syn(&typed.ty)),
                    location: self.location(typed.span()),
                },
                _ => ParamSig {
                    name: pattern_name(pat),
                    ty: None,
                    location: self.location(pat.span()),
                },
            })
            .collect();
        let (output, output_location) = match &closure.output {
            ReturnType::Type(_, ty) => (Some(TypeRef::from_syn(ty)), self.location(ty.span())),
            ReturnType::Default => (infer_return(&closure.body, &params), self.location(closure.body.span())),
        };
        ClosureSig {
            params,
            output,
            output_location,
            is_async: closure.asyncness.is_some() || matches!(&*closure.body, Expr::Async(_)),
        }
    }
}

impl<'ast> Visit<'ast> for Lowering<'_> {
    fn visit_item_mod(&mut self, item: &'ast syn::ItemMod) {
        if item.content.is_some() {
            self.module.push(item.ident.unraw().to_string());
            visit::visit_item_mod(self, item);
            self.module.pop();
        }
    }

    fn visit_item_fn(&mut self, item: &'ast syn::ItemFn) {
        let path = self.item_path(&[item.sig.ident.unraw().to_string()]);
        let signature = self.lower_fn(&item.sig, path);
        self.syntax.functions.push(signature);
        visit::visit_item_fn(self, item);
    }

    fn visit_item_impl(&mut self, item: &'ast syn::ItemImpl) {
        let self_name = match &*item.self_ty {
            Type::Path(path) => path.path.segments.last().map(|s| s.ident.unraw().to_string()),
            _ => None,
        };
        if let Some(self_name) = self_name {
            for impl_item in &item.items {
                if let ImplItem::Fn(function) = impl_item {
                    let path = self.item_path(&[self_name.clone(), function.sig.ident.unraw().to_string()]);
                    let mut signature = self.lower_fn(&function.sig, path);
                    if !item.generics.params.is_empty() && signature.unsupported.is_none() {
                        signature.unsupported = Some(Unsupported::Generic);
                    }
                    self.syntax.functions.push(signature);
                }
            }
        }
        visit::visit_item_impl(self, item);
    }

    fn visit_item_const(&mut self, item: &'ast syn::ItemConst) {
        if let Some(value) = string_value(&item.expr) {
            let path = self.item_path(&[item.ident.unraw().to_string()]);
            self.syntax.constants.push(ConstSymbol { path, value });
        }
        visit::visit_item_const(self, item);
    }

    fn visit_item_static(&mut self, item: &'ast syn::ItemStatic) {
        if let Some(value) = string_value(&item.expr) {
            let path = self.item_path(&[item.ident.unraw().to_string()]);
            self.syntax.constants.push(ConstSymbol { path, value });
        }
        visit::visit_item_static(self, item);
    }

    fn visit_item_struct(&mut self, item: &'ast syn::ItemStruct) {
        let path = self.item_path(&[item.ident.unraw().to_string()]);
        self.syntax.types.push(path);
        visit::visit_item_struct(self, item);
    }

    fn visit_item_enum(&mut self, item: &'ast syn::ItemEnum) {
        let path = self.item_path(&[item.ident.unraw().to_string()]);
        self.syntax.types.push(path);
        visit::visit_item_enum(self, item);
    }

    fn visit_item_union(&mut self, item: &'ast syn::ItemUnion) {
        let path = self.item_path(&[item.ident.unraw().to_string()]);
        self.syntax.types.push(path);
        visit::visit_item_union(self, item);
    }

    fn visit_item_type(&mut self, item: &'ast syn::ItemType) {
        let path = self.item_path(&[item.ident.unraw().to_string()]);
        self.syntax.types.push(path);
        visit::visit_item_type(self, item);
    }

    fn visit_expr_method_call(&mut self, call: &'ast ExprMethodCall) {
        if is_candidate(call) {
            if let Some(candidate) = self.lower_candidate(call) {
                self.syntax.candidates.push(candidate);
            }
        }
        visit::visit_expr_method_call(self, call);
    }
}

fn path_segments(path: &syn::Path) -> Vec<String> {
    path.segments.iter().map(|s| s.ident.unraw().to_string()).collect()
}

fn pattern_name(pat: &Pat) -> Option<String> {
    match pat {
        Pat::Ident(ident) => Some(ident.ident.unraw().to_string()),
        Pat::TupleStruct(tuple) if tuple.elems.len() == 1 => tuple.elems.first().and_then(pattern_name),
        Pat::Reference(reference) => pattern_name(&reference.pat),
        Pat::Paren(paren) => pattern_name(&paren.pat),
        Pat::Type(typed) => pattern_name(&typed.pat),
        _ => None,
    }
}

fn string_value(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(value) => Some(value.value()),
            _ => None,
        },
        Expr::Paren(paren) => string_value(&paren.expr),
        Expr::Group(group) => string_value(&group.expr),
        _ => None,
    }
}

/// Infers a closure's return type from its body.
///
/// Only shapes whose type Rust would infer without context are handled.
/// Anything else yields `None`.
fn infer_return(body: &Expr, params: &[ParamSig]) -> Option<TypeRef> {
    match body {
        Expr::Path(path) if path.qself.is_none() => {
            let ident = path.path.get_ident()?.unraw().to_string();
            params.iter().find(|p| p.name.as_deref() == Some(&ident))?.ty.clone()
        }
        Expr::Lit(lit) => literal_type(&lit.lit),
        Expr::Unary(unary) => match unary.op {
            syn::UnOp::Neg(_) => infer_return(&unary.expr, params).filter(|ty| is_primitive(ty, NUMERIC)),
            syn::UnOp::Not(_) => infer_return(&unary.expr, params).filter(|ty| is_primitive(ty, LOGICAL)),
            _ => None,
        },
        Expr::Binary(binary) => infer_binary(binary, params),
        Expr::Tuple(tuple) if tuple.elems.is_empty() => Some(TypeRef::unit()),
        Expr::Block(block) => match block.block.stmts.last() {
            None | Some(Stmt::Expr(_, Some(_)) | Stmt::Local(_) | Stmt::Item(_)) => Some(TypeRef::unit()),
            Some(Stmt::Expr(tail, None)) => infer_return(tail, params),
            Some(Stmt::Macro(mac)) => {
                if mac.semi_token.is_some() {
                    Some(TypeRef::unit())
                } else if mac.mac.path.is_ident("format") {
                    Some(TypeRef::named("String"))
                } else {
                    None
                }
            }
        },
        Expr::Macro(mac) if mac.mac.path.is_ident("format") => Some(TypeRef::named("String")),
        Expr::MethodCall(call) if call.method == "to_string" && call.args.is_empty() => {
            Some(TypeRef::named("String"))
        }
        Expr::Call(call) => match &*call.func {
            Expr::Path(path) => {
                let segments = path_segments(&path.path);
                let is_string_ctor = segments.len() == 2 && segments[0] == "String" && segments[1] == "from";
                is_string_ctor.then(|| TypeRef::named("String"))
            }
            _ => None,
        },
        Expr::Paren(paren) => infer_return(&paren.expr, params),
        Expr::Group(group) => infer_return(&group.expr, params),
        _ => None,
    }
}

const NUMERIC: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize", "f32", "f64",
];
const INTEGER: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
];
const LOGICAL: &[&str] = &[
    "bool", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
];

/// Binary expressions over primitive operands.
///
/// An unsuffixed literal operand takes the type of the other side, as in
/// `|y: u64| y * 2`. Mixed operand types are left to the compiler.
fn infer_binary(binary: &syn::ExprBinary, params: &[ParamSig]) -> Option<TypeRef> {
    use syn::BinOp;

    let allowed = match binary.op {
        BinOp::Eq(_) | BinOp::Ne(_) | BinOp::Lt(_) | BinOp::Le(_) | BinOp::Gt(_) | BinOp::Ge(_) => {
            return Some(TypeRef::named("bool"));
        }
        BinOp::And(_) | BinOp::Or(_) => return Some(TypeRef::named("bool")),
        BinOp::Shl(_) | BinOp::Shr(_) => {
            return infer_return(&binary.left, params).filter(|ty| is_primitive(ty, INTEGER));
        }
        BinOp::Add(_) | BinOp::Sub(_) | BinOp::Mul(_) | BinOp::Div(_) | BinOp::Rem(_) => NUMERIC,
        BinOp::BitAnd(_) | BinOp::BitOr(_) | BinOp::BitXor(_) => LOGICAL,
        _ => return None,
    };
    let left = infer_return(&binary.left, params)?;
    let right = infer_return(&binary.right, params)?;
    if !is_primitive(&left, allowed) || !is_primitive(&right, allowed) {
        return None;
    }
    match (is_unsuffixed_literal(&binary.left), is_unsuffixed_literal(&binary.right)) {
        (true, false) => Some(right),
        (false, true) => Some(left),
        _ => (left == right).then_some(left),
    }
}

fn is_primitive(ty: &TypeRef, names: &[&str]) -> bool {
    match ty {
        TypeRef::Path {
            leading_colon: false,
            segments,
            generics,
        } => generics.is_empty() && segments.len() == 1 && names.contains(&segments[0].as_str()),
        _ => false,
    }
}

fn is_unsuffixed_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Int(int) => int.suffix().is_empty(),
            Lit::Float(float) => float.suffix().is_empty(),
            _ => false,
        },
        Expr::Unary(unary) if matches!(unary.op, syn::UnOp::Neg(_)) => is_unsuffixed_literal(&unary.expr),
        Expr::Paren(paren) => is_unsuffixed_literal(&paren.expr),
        Expr::Group(group) => is_unsuffixed_literal(&group.expr),
        _ => false,
    }
}

fn literal_type(lit: &Lit) -> Option<TypeRef> {
    match lit {
        Lit::Str(_) => Some(TypeRef::static_str()),
        Lit::Int(int) => Some(TypeRef::named(match int.suffix() {
            "" => "i32",
            suffix => suffix,
        })),
        Lit::Float(float) => Some(TypeRef::named(match float.suffix() {
            "" => "f64",
            suffix => suffix,
        })),
        Lit::Bool(_) => Some(TypeRef::named("bool")),
        Lit::Char(_) => Some(TypeRef::named("char")),
        _ => None,
    }
}
