//! Endpoint model shared by all API flavors.

use crate::decoration::TypeRef;
use crate::element::Element;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Media type assumed when neither the operation nor its endpoint declares one.
pub const WILDCARD_MEDIA_TYPE: &str = "*/*";

/// HTTP method of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    /// Any other verb, upper-cased
    Custom(String),
}

impl HttpMethod {
    pub fn parse(value: &str) -> HttpMethod {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            other => HttpMethod::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Custom(verb) => verb,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The parameter bound to the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityParameter {
    pub name: String,
    pub ty: TypeRef,
}

/// The response body of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepresentationMetadata {
    pub ty: TypeRef,
}

impl RepresentationMetadata {
    /// Wrappers that carry the response body as their first type argument.
    const WRAPPERS: [&'static str; 3] = ["Result", "Json", "ResponseEntity"];

    /// Derives the representation from a method's return type.
    ///
    /// Returns `None` for a unit or absent return type.
    pub fn from_return_type(return_type: Option<&TypeRef>) -> Option<Self> {
        let mut ty = return_type?.clone();
        loop {
            let inner = match ty.raw() {
                syn::Type::Tuple(tuple) if tuple.elems.is_empty() => return None,
                syn::Type::Path(type_path) if type_path.qself.is_none() => type_path
                    .path
                    .segments
                    .last()
                    .filter(|segment| Self::WRAPPERS.contains(&segment.ident.to_string().as_str()))
                    .and_then(|segment| first_type_argument(&segment.arguments)),
                _ => None,
            };
            match inner {
                Some(inner) => ty = ty.with_raw(inner),
                None => return Some(RepresentationMetadata { ty }),
            }
        }
    }
}

fn first_type_argument(arguments: &syn::PathArguments) -> Option<syn::Type> {
    match arguments {
        syn::PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            syn::GenericArgument::Type(ty) => Some(ty.clone()),
            _ => None,
        }),
        _ => None,
    }
}

/// One invocable unit of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Simple name of the declaring method
    pub name: String,
    /// Qualified name of the declaring method
    pub qualified_name: String,
    /// Qualified name of the owning endpoint
    pub endpoint: String,
    pub methods: BTreeSet<HttpMethod>,
    /// Endpoint base path joined with the method path; excludes the context path
    pub path: String,
    pub consumes: BTreeSet<String>,
    pub produces: BTreeSet<String>,
    pub entity_parameter: Option<EntityParameter>,
    pub representation: Option<RepresentationMetadata>,
    /// Explicit grouping label, from the method or else the endpoint
    pub resource_group: Option<String>,
    pub facets: BTreeSet<String>,
}

/// An API entry point and its operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub element: Element,
    pub base_path: String,
    /// Label override for class grouping
    pub label: Option<String>,
    pub operations: Vec<Operation>,
}

impl Endpoint {
    pub fn qualified_name(&self) -> &str {
        &self.element.qualified_name
    }

    pub fn simple_name(&self) -> &str {
        &self.element.simple_name
    }
}

/// Joins a base path and a member path into a normalized operation path.
///
/// The slash at the join boundary is not doubled, and `{...}` template segments are kept as
/// written.
pub fn join_paths(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let joined = match (base.is_empty(), path.is_empty()) {
        (_, true) => base.to_string(),
        (true, false) => path.to_string(),
        (false, false) => format!("{}/{}", base, path),
    };
    normalize_path(&joined)
}

/// Ensures a leading `/`, collapses repeated slashes outside `{...}` templates and strips the
/// trailing `/` of anything but the root path.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 1);
    normalized.push('/');
    let mut template_depth = 0usize;
    for c in path.trim().chars() {
        match c {
            '{' => template_depth += 1,
            '}' => template_depth = template_depth.saturating_sub(1),
            '/' if template_depth == 0 && normalized.ends_with('/') => continue,
            _ => {}
        }
        normalized.push(c);
    }
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Normalizes a context path: leading `/`, no trailing `/`, and the root becomes `""`.
pub fn normalize_context_path(path: &str) -> String {
    match normalize_path(path).as_str() {
        "/" => String::new(),
        normalized => normalized.to_string(),
    }
}

/// Prefixes an operation path with a normalized context path.
pub fn absolute_path(context_path: &str, path: &str) -> String {
    if context_path.is_empty() {
        path.to_string()
    } else if path == "/" {
        context_path.to_string()
    } else {
        format!("{}{}", context_path, path)
    }
}
