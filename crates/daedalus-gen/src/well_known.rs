//! Recognition of framework and primitive types.
//!
//! [`WellKnownTypes`] is built once per compilation. It knows the bare
//! names the binding analyzer cares about and which of them the user has
//! shadowed with a type of their own.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use crate::syntax::TypeRef;

/// Primitive and `String` types bindable from route or query values.
pub const SCALARS: [&str; 15] = [
    "i8", "i16", "i32", "i64", "isize", "u8", "u16", "u32", "u64", "usize", "f32", "f64", "bool", "char", "String",
];

const FRAMEWORK_NAMES: [&str; 9] = [
    "Json",
    "Inject",
    "Option",
    "Method",
    "HeaderMap",
    "Bytes",
    "StatusCode",
    "EndpointResult",
    "Result",
];

/// A recognized type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WellKnown {
    /// A primitive or `String`.
    Scalar(&'static str),
    /// `&str`.
    Str,
    /// `()`.
    Unit,
    /// `Json<T>`.
    Json(TypeRef),
    /// `Inject<T>`.
    Inject(TypeRef),
    /// `Option<T>` of a scalar.
    OptionScalar(&'static str),
    /// `Method`.
    Method,
    /// `HeaderMap`.
    HeaderMap,
    /// `Bytes`.
    Bytes,
    /// `StatusCode`.
    StatusCode,
    /// `EndpointResult`.
    EndpointResult,
    /// `Result<T, E>`.
    Result(TypeRef, TypeRef),
}

/// Recognizes well-known types in one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellKnownTypes {
    shadowed: BTreeSet<String>,
    fingerprint: u64,
}

impl WellKnownTypes {
    /// Builds the table from the full paths of every user-declared type.
    pub fn new<'a, I>(user_types: I) -> Self
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let shadowed: BTreeSet<String> = user_types
            .into_iter()
            .filter_map(|path| path.last())
            .filter(|name| is_well_known_name(name))
            .cloned()
            .collect();
        let mut hasher = DefaultHasher::new();
        shadowed.hash(&mut hasher);
        Self {
            fingerprint: hasher.finish(),
            shadowed,
        }
    }

    /// Changes whenever classification could change.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Bare names the user has declared types for.
    pub fn shadowed(&self) -> impl Iterator<Item = &str> {
        self.shadowed.iter().map(String::as_str)
    }

    /// Classifies a (qualified) type.
    ///
    /// Bare names shadowed by a user type are not recognized. Paths into the
    /// current crate (`crate::`, `self::`, `super::`) never are.
    #[must_use]
    pub fn classify(&self, ty: &TypeRef) -> Option<WellKnown> {
        match ty {
            TypeRef::Tuple(items) if items.is_empty() => Some(WellKnown::Unit),
            TypeRef::Reference {
                mutable: false, elem, ..
            } => match elem.as_ref() {
                TypeRef::Path { segments, generics, .. } if generics.is_empty() && segments.len() == 1 => {
                    (segments[0] == "str").then_some(WellKnown::Str)
                }
                _ => None,
            },
            TypeRef::Path {
                leading_colon,
                segments,
                generics,
            } => {
                let (name, prefix) = segments.split_last()?;
                if let Some(first) = prefix.first() {
                    if !*leading_colon && matches!(first.as_str(), "crate" | "self" | "super") {
                        return None;
                    }
                } else if self.shadowed.contains(name) {
                    return None;
                }
                self.classify_name(name, generics)
            }
            _ => None,
        }
    }

    fn classify_name(&self, name: &str, generics: &[TypeRef]) -> Option<WellKnown> {
        match (name, generics) {
            (_, []) if scalar(name).is_some() => scalar(name).map(WellKnown::Scalar),
            ("Json", [inner]) => Some(WellKnown::Json(inner.clone())),
            ("Inject", [inner]) => Some(WellKnown::Inject(inner.clone())),
            ("Option", [inner]) => match self.classify(inner)? {
                WellKnown::Scalar(name) => Some(WellKnown::OptionScalar(name)),
                _ => None,
            },
            ("Method", []) => Some(WellKnown::Method),
            ("HeaderMap", []) => Some(WellKnown::HeaderMap),
            ("Bytes", []) => Some(WellKnown::Bytes),
            ("StatusCode", []) => Some(WellKnown::StatusCode),
            ("EndpointResult", []) => Some(WellKnown::EndpointResult),
            ("Result", [ok, err]) => Some(WellKnown::Result(ok.clone(), err.clone())),
            _ => None,
        }
    }
}

fn scalar(name: &str) -> Option<&'static str> {
    SCALARS.iter().copied().find(|s| *s == name)
}

fn is_well_known_name(name: &str) -> bool {
    scalar(name).is_some() || FRAMEWORK_NAMES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(text: &str) -> TypeRef {
        TypeRef::from_syn(&syn::parse_str(text).unwrap())
    }

    fn path(text: &str) -> Vec<String> {
        text.split("::").map(str::to_string).collect()
    }

    #[test]
    fn test_classify_builtins() {
        let wkt = WellKnownTypes::new(std::iter::empty());
        assert_eq!(wkt.classify(&ty("i32")), Some(WellKnown::Scalar("i32")));
        assert_eq!(wkt.classify(&ty("String")), Some(WellKnown::Scalar("String")));
        assert_eq!(wkt.classify(&ty("&'static str")), Some(WellKnown::Str));
        assert_eq!(wkt.classify(&ty("()")), Some(WellKnown::Unit));
        assert_eq!(wkt.classify(&ty("Option<u64>")), Some(WellKnown::OptionScalar("u64")));
        assert_eq!(wkt.classify(&ty("Json<Item>")), Some(WellKnown::Json(ty("Item"))));
        assert_eq!(wkt.classify(&ty("daedalus::Inject<Db>")), Some(WellKnown::Inject(ty("Db"))));
        assert_eq!(wkt.classify(&ty("http::StatusCode")), Some(WellKnown::StatusCode));
        assert_eq!(
            wkt.classify(&ty("Result<String, StatusCode>")),
            Some(WellKnown::Result(ty("String"), ty("StatusCode")))
        );
    }

    #[test]
    fn test_unrecognized_shapes() {
        let wkt = WellKnownTypes::new(std::iter::empty());
        assert_eq!(wkt.classify(&ty("Option<Item>")), None);
        assert_eq!(wkt.classify(&ty("Json")), None);
        assert_eq!(wkt.classify(&ty("&mut str")), None);
        assert_eq!(wkt.classify(&ty("Vec<i32>")), None);
        assert_eq!(wkt.classify(&ty("crate::Json<Item>")), None);
        assert_eq!(wkt.classify(&ty("io::Result<()>")), None);
    }

    #[test]
    fn test_user_types_shadow_bare_names() {
        let user = [path("crate::models::Json"), path("crate::models::Item")];
        let wkt = WellKnownTypes::new(user.iter().map(Vec::as_slice));

        assert_eq!(wkt.shadowed().collect::<Vec<_>>(), vec!["Json"]);
        assert_eq!(wkt.classify(&ty("Json<Item>")), None);
        assert_eq!(wkt.classify(&ty("daedalus::Json<Item>")), Some(WellKnown::Json(ty("Item"))));
    }

    #[test]
    fn test_fingerprint_tracks_shadowing() {
        let plain = WellKnownTypes::new(std::iter::empty());
        let unrelated = [path("crate::Item")];
        let shadowing = [path("crate::Bytes")];

        assert_eq!(
            plain.fingerprint(),
            WellKnownTypes::new(unrelated.iter().map(Vec::as_slice)).fingerprint()
        );
        assert_ne!(
            plain.fingerprint(),
            WellKnownTypes::new(shadowing.iter().map(Vec::as_slice)).fingerprint()
        );
    }
}
