//! Compilation-wide symbol index.
//!
//! Handler paths, route constants and type names are resolved the way a
//! reader would resolve them without `use` declarations: relative to the
//! calling module, then to the crate root, then by a unique suffix match
//! anywhere in the crate.

use indexmap::IndexMap;

use crate::syntax::{FileSyntax, FnSignature, TypeRef};

/// Outcome of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// Exactly one match.
    Found(T),
    /// No match.
    Unresolved,
    /// Several matches, by full path.
    Ambiguous(Vec<String>),
}

impl<T> Resolution<T> {
    /// The match, if there is exactly one.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Unresolved | Self::Ambiguous(_) => None,
        }
    }
}

type Table<T> = IndexMap<Vec<String>, Vec<T>>;

/// Functions, string constants and types by full path.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    functions: Table<FnSignature>,
    constants: Table<String>,
    types: Table<()>,
}

impl SymbolIndex {
    /// Indexes the given files.
    pub fn build<'a, I>(files: I) -> Self
    where
        I: IntoIterator<Item = &'a FileSyntax>,
    {
        let mut index = Self::default();
        for file in files {
            for function in &file.functions {
                index.functions.entry(function.path.clone()).or_default().push(function.clone());
            }
            for constant in &file.constants {
                index
                    .constants
                    .entry(constant.path.clone())
                    .or_default()
                    .push(constant.value.clone());
            }
            for ty in &file.types {
                index.types.entry(ty.clone()).or_default().push(());
            }
        }
        index
    }

    /// Resolves a handler path used in `module`.
    #[must_use]
    pub fn resolve_function(&self, module: &[String], segments: &[String]) -> Resolution<&FnSignature> {
        lookup(&self.functions, module, segments)
    }

    /// Resolves a route constant used in `module`.
    #[must_use]
    pub fn resolve_constant(&self, module: &[String], segments: &[String]) -> Resolution<&str> {
        match lookup(&self.constants, module, segments) {
            Resolution::Found(value) => Resolution::Found(value.as_str()),
            Resolution::Unresolved => Resolution::Unresolved,
            Resolution::Ambiguous(paths) => Resolution::Ambiguous(paths),
        }
    }

    /// Full path of a user type named `segments` in `module`.
    #[must_use]
    pub fn resolve_type(&self, module: &[String], segments: &[String]) -> Option<Vec<String>> {
        let target = resolve_path(&self.types, module, segments).found()?;
        Some(target.to_vec())
    }

    /// Rewrites user types in `ty` to full `crate::` paths.
    ///
    /// Names that are not user types (`Vec`, `Json`, primitives) are kept.
    #[must_use]
    pub fn qualify(&self, ty: &TypeRef, module: &[String]) -> TypeRef {
        ty.map_paths(&|segments: &[String]| self.resolve_type(module, segments))
    }

    /// Full paths of every declared type.
    pub fn type_paths(&self) -> impl Iterator<Item = &[String]> {
        self.types.keys().map(Vec::as_slice)
    }

    /// Number of indexed functions.
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.functions.values().map(Vec::len).sum()
    }
}

fn lookup<'a, T>(table: &'a Table<T>, module: &[String], segments: &[String]) -> Resolution<&'a T> {
    match resolve_path(table, module, segments) {
        Resolution::Found(path) => match table.get(path).map(Vec::as_slice) {
            Some([single]) => Resolution::Found(single),
            Some(entries) if !entries.is_empty() => Resolution::Ambiguous(vec![path.join("::"); entries.len()]),
            _ => Resolution::Unresolved,
        },
        Resolution::Unresolved => Resolution::Unresolved,
        Resolution::Ambiguous(paths) => Resolution::Ambiguous(paths),
    }
}

/// Finds the full path `segments` refers to from `module`.
fn resolve_path<'a, T>(table: &'a Table<T>, module: &[String], segments: &[String]) -> Resolution<&'a [String]> {
    let exact = |path: Vec<String>| table.get_key_value(path.as_slice()).map(|(key, _)| key.as_slice());

    let Some(first) = segments.first() else {
        return Resolution::Unresolved;
    };
    match first.as_str() {
        "crate" => return exact(segments.to_vec()).map_or(Resolution::Unresolved, Resolution::Found),
        "self" => {
            let path = module.iter().chain(&segments[1..]).cloned().collect();
            return exact(path).map_or(Resolution::Unresolved, Resolution::Found);
        }
        "super" => {
            let mut base = module.to_vec();
            let mut rest = segments;
            while rest.first().is_some_and(|s| s == "super") {
                if base.len() <= 1 {
                    return Resolution::Unresolved;
                }
                base.pop();
                rest = &rest[1..];
            }
            base.extend(rest.iter().cloned());
            return exact(base).map_or(Resolution::Unresolved, Resolution::Found);
        }
        _ => {}
    }

    let in_module = module.iter().chain(segments).cloned().collect();
    if let Some(path) = exact(in_module) {
        return Resolution::Found(path);
    }
    let in_root = std::iter::once("crate".to_string()).chain(segments.iter().cloned()).collect();
    if let Some(path) = exact(in_root) {
        return Resolution::Found(path);
    }

    let matches: Vec<&[String]> = table
        .keys()
        .map(Vec::as_slice)
        .filter(|key| key.ends_with(segments))
        .collect();
    match matches.as_slice() {
        [] => Resolution::Unresolved,
        [single] => Resolution::Found(single),
        many => Resolution::Ambiguous(many.iter().map(|p| p.join("::")).collect()),
    }
}
