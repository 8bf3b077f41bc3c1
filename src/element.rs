//! Read-only element views over annotated source items.
//!
//! Attributes play the role of annotations: `#[path("/widgets")]` on a struct is an annotation
//! named `path` with the value `/widgets`. Only the last segment of an attribute path is used as
//! the annotation name.

use crate::decoration::TypeRef;
use log::{debug, warn};
use std::collections::BTreeMap;
use syn::punctuated::Punctuated;
use syn::{Expr, Lit, LitStr, Meta, Token};

/// The key under which positional annotation values are stored.
pub const VALUE: &str = "value";

/// A structured annotation value: key → ordered list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Annotation {
    pub name: String,
    values: BTreeMap<String, Vec<String>>,
    malformed: bool,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Parses an attribute into an annotation. Doc comments are not annotations.
    pub fn from_attribute(attr: &syn::Attribute) -> Option<Annotation> {
        let name = attr.path().segments.last()?.ident.to_string();
        if name == "doc" {
            return None;
        }

        let mut annotation = Annotation::new(name);
        match &attr.meta {
            Meta::Path(_) => {}
            Meta::NameValue(name_value) => match expr_values(&name_value.value) {
                Some(values) => {
                    annotation.values.insert(VALUE.to_string(), values);
                }
                None => annotation.malformed = true,
            },
            Meta::List(_) => {
                if let Ok(literals) =
                    attr.parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated)
                {
                    annotation.values.insert(
                        VALUE.to_string(),
                        literals.iter().map(LitStr::value).collect(),
                    );
                } else if let Ok(metas) =
                    attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
                {
                    for meta in &metas {
                        if !annotation.absorb_meta(meta) {
                            annotation.malformed = true;
                        }
                    }
                } else {
                    annotation.malformed = true;
                }
            }
        }

        if annotation.malformed {
            warn!("Ignoring malformed value of annotation #[{}]", annotation.name);
        }
        Some(annotation)
    }

    fn absorb_meta(&mut self, meta: &Meta) -> bool {
        match meta {
            Meta::Path(path) => match path.segments.last() {
                Some(segment) => {
                    self.values.entry(segment.ident.to_string()).or_default();
                    true
                }
                None => false,
            },
            Meta::NameValue(name_value) => {
                let Some(key) = name_value.path.segments.last() else {
                    return false;
                };
                match expr_values(&name_value.value) {
                    Some(values) => {
                        self.values
                            .entry(key.ident.to_string())
                            .or_default()
                            .extend(values);
                        true
                    }
                    None => false,
                }
            }
            // Nested lists (`#[serde(bound(...))]`) carry nothing this crate reads.
            Meta::List(list) => {
                debug!("Skipping nested annotation list: {:?}", list.path.get_ident());
                true
            }
        }
    }

    /// The first positional value.
    pub fn value(&self) -> Option<&str> {
        self.get(VALUE)
    }

    /// The first value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.malformed {
            return None;
        }
        self.values
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values stored under `key`.
    pub fn values(&self, key: &str) -> &[String] {
        if self.malformed {
            return &[];
        }
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `key` appears at all, with or without values (`#[serde(skip)]`).
    pub fn has_key(&self, key: &str) -> bool {
        !self.malformed && self.values.contains_key(key)
    }

    pub fn is_malformed(&self) -> bool {
        self.malformed
    }

    fn merge(&mut self, other: Annotation) {
        self.malformed |= other.malformed;
        for (key, values) in other.values {
            self.values.entry(key).or_default().extend(values);
        }
    }
}

fn expr_values(expr: &Expr) -> Option<Vec<String>> {
    match expr {
        Expr::Array(array) => array
            .elems
            .iter()
            .map(expr_scalar)
            .collect::<Option<Vec<_>>>(),
        other => expr_scalar(other).map(|value| vec![value]),
    }
}

fn expr_scalar(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Str(lit_str) => Some(lit_str.value()),
            Lit::Int(lit_int) => Some(lit_int.base10_digits().to_string()),
            Lit::Bool(lit_bool) => Some(lit_bool.value.to_string()),
            _ => None,
        },
        // `method = RequestMethod::GET` reads as "GET"
        Expr::Path(expr_path) => expr_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        _ => None,
    }
}

/// Annotations of one element, by name. Repeated attributes are merged.
pub fn collect_annotations(attrs: &[syn::Attribute]) -> BTreeMap<String, Annotation> {
    let mut annotations: BTreeMap<String, Annotation> = BTreeMap::new();
    for annotation in attrs.iter().filter_map(Annotation::from_attribute) {
        match annotations.get_mut(&annotation.name) {
            Some(existing) => existing.merge(annotation),
            None => {
                annotations.insert(annotation.name.clone(), annotation);
            }
        }
    }
    annotations
}

/// What kind of program construct an element is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Type,
    Method,
    Parameter,
    Field,
}

/// An annotated program construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementKind,
    pub qualified_name: String,
    pub simple_name: String,
    /// Module path of the owning type, `::`-separated (empty for the crate root)
    pub package: String,
    pub annotations: BTreeMap<String, Annotation>,
}

impl Element {
    pub fn new(
        kind: ElementKind,
        package: &str,
        owner: Option<&str>,
        simple_name: impl Into<String>,
        annotations: BTreeMap<String, Annotation>,
    ) -> Self {
        let simple_name = simple_name.into();
        let prefix = owner.map(str::to_string).unwrap_or_else(|| package.to_string());
        let qualified_name = if prefix.is_empty() {
            simple_name.clone()
        } else {
            format!("{}::{}", prefix, simple_name)
        };
        Self {
            kind,
            qualified_name,
            simple_name,
            package: package.to_string(),
            annotations,
        }
    }

    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.get(name)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.contains_key(name)
    }

    /// Whether the element derives `trait_name` (`#[derive(Serialize)]`).
    pub fn derives(&self, trait_name: &str) -> bool {
        self.annotation("derive")
            .map(|derive| derive.has_key(trait_name))
            .unwrap_or(false)
    }

    /// Segments of the qualified name, outermost first.
    pub fn qualified_segments(&self) -> Vec<&str> {
        self.qualified_name.split("::").collect()
    }
}

/// Whether a declared type is a struct or an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeShape {
    Struct,
    Enum,
}

/// A field of a struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldElement {
    pub element: Element,
    pub ty: TypeRef,
}

/// A declared struct or enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeElement {
    pub element: Element,
    pub shape: TypeShape,
    pub type_params: Vec<String>,
    pub fields: Vec<FieldElement>,
    pub variants: Vec<String>,
    /// Whether the type was found under the analyzed project rather than an included root
    pub local: bool,
}

impl TypeElement {
    pub fn qualified_name(&self) -> &str {
        &self.element.qualified_name
    }

    pub fn simple_name(&self) -> &str {
        &self.element.simple_name
    }
}

/// A parameter of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterElement {
    pub element: Element,
    pub ty: TypeRef,
}

/// A callable member of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodElement {
    pub element: Element,
    pub has_receiver: bool,
    pub parameters: Vec<ParameterElement>,
    /// `None` when the method returns unit implicitly
    pub return_type: Option<TypeRef>,
}
