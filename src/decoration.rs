//! Type decoration layer.
//!
//! Raw `syn::Type` values are wrapped into a [`TypeOccurrence`], a closed sum type over the
//! shapes the rest of the crate cares about (primitive, declared, array, tuple, wildcard, type
//! variable, void). Decoration never touches the raw type; it is computed on demand every time
//! a type is visited.
//!
//! Rust has no wildcard syntax of its own, so `_`, `impl Bound` and `dyn Bound` decorate as
//! wildcards whose extends-bound is the first trait bound.

use std::fmt;

/// Primitive types supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    Bool,
    Char,
}

impl PrimitiveType {
    /// Parse a primitive type name
    pub fn parse(type_name: &str) -> Option<PrimitiveType> {
        match type_name {
            "String" | "str" => Some(PrimitiveType::String),
            "i8" => Some(PrimitiveType::I8),
            "i16" => Some(PrimitiveType::I16),
            "i32" => Some(PrimitiveType::I32),
            "i64" => Some(PrimitiveType::I64),
            "i128" => Some(PrimitiveType::I128),
            "isize" => Some(PrimitiveType::Isize),
            "u8" => Some(PrimitiveType::U8),
            "u16" => Some(PrimitiveType::U16),
            "u32" => Some(PrimitiveType::U32),
            "u64" => Some(PrimitiveType::U64),
            "u128" => Some(PrimitiveType::U128),
            "usize" => Some(PrimitiveType::Usize),
            "f32" => Some(PrimitiveType::F32),
            "f64" => Some(PrimitiveType::F64),
            "bool" => Some(PrimitiveType::Bool),
            "char" => Some(PrimitiveType::Char),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::String => "String",
            PrimitiveType::I8 => "i8",
            PrimitiveType::I16 => "i16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::I128 => "i128",
            PrimitiveType::Isize => "isize",
            PrimitiveType::U8 => "u8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::U128 => "u128",
            PrimitiveType::Usize => "usize",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Char => "char",
        }
    }
}

/// The kind of a decorated type. Kinds never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Primitive,
    Declared,
    Array,
    Tuple,
    Wildcard,
    Variable,
    Void,
}

/// Decoration failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecorationError {
    #[error("unsupported type kind: {0}")]
    UnsupportedKind(&'static str),
}

/// A raw type occurrence together with the generic parameters in scope where it was written.
///
/// The scope is what lets `T` decorate as a type variable instead of a declared type named `T`.
/// The package is the module the occurrence was written in; declared names are resolved from
/// there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    raw: syn::Type,
    type_params: Vec<String>,
    package: String,
}

impl TypeRef {
    pub fn new(raw: syn::Type, type_params: Vec<String>) -> Self {
        Self {
            raw,
            type_params,
            package: String::new(),
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Module the occurrence was written in (empty for the crate root).
    pub fn package(&self) -> &str {
        &self.package
    }

    /// The underlying, undecorated type.
    pub fn raw(&self) -> &syn::Type {
        &self.raw
    }

    pub fn type_params(&self) -> &[String] {
        &self.type_params
    }

    /// Builds a new reference to `raw` sharing this reference's generic scope.
    pub fn with_raw(&self, raw: syn::Type) -> TypeRef {
        TypeRef {
            raw,
            type_params: self.type_params.clone(),
            package: self.package.clone(),
        }
    }
}

/// A declared (nominal) type, possibly generic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclaredType {
    /// Path segments as written (`std::vec::Vec` → `["std", "vec", "Vec"]`)
    pub path: Vec<String>,
    /// Decorated type arguments, in order
    pub type_arguments: Vec<TypeOccurrence>,
}

impl DeclaredType {
    pub fn simple_name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    /// The written path with type arguments erased.
    pub fn erasure(&self) -> String {
        self.path.join("::")
    }
}

/// A wildcard with optional bounds. Bounds are decorated lazily, on request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WildcardType {
    extends: Option<TypeRef>,
    super_bound: Option<TypeRef>,
}

impl WildcardType {
    pub fn new(extends: Option<TypeRef>, super_bound: Option<TypeRef>) -> Self {
        Self {
            extends,
            super_bound,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None, None)
    }

    /// The upper bound, or `None` when the wildcard is unbounded on that side.
    pub fn extends_bound(&self) -> Result<Option<TypeOccurrence>, DecorationError> {
        self.extends.as_ref().map(Decorate::decorate).transpose()
    }

    /// The lower bound, or `None` when the wildcard is unbounded on that side.
    pub fn super_bound(&self) -> Result<Option<TypeOccurrence>, DecorationError> {
        self.super_bound.as_ref().map(Decorate::decorate).transpose()
    }
}

/// A decorated type occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeOccurrence {
    Primitive(PrimitiveType),
    Declared(DeclaredType),
    Array(Box<TypeOccurrence>),
    /// A non-empty tuple; `()` is [`TypeOccurrence::Void`]
    Tuple(Vec<TypeOccurrence>),
    Wildcard(WildcardType),
    Variable(String),
    Void,
}

/// Double-dispatch over the shape of a decorated type.
pub trait TypeVisitor {
    type Output;

    fn visit_primitive(&mut self, primitive: PrimitiveType) -> Self::Output;
    fn visit_declared(&mut self, declared: &DeclaredType) -> Self::Output;
    fn visit_array(&mut self, component: &TypeOccurrence) -> Self::Output;
    fn visit_tuple(&mut self, elements: &[TypeOccurrence]) -> Self::Output;
    fn visit_wildcard(&mut self, wildcard: &WildcardType) -> Self::Output;
    fn visit_variable(&mut self, name: &str) -> Self::Output;
    fn visit_void(&mut self) -> Self::Output;
}

/// Anything that can be turned into a [`TypeOccurrence`].
pub trait Decorate {
    fn decorate(&self) -> Result<TypeOccurrence, DecorationError>;
}

impl Decorate for TypeRef {
    fn decorate(&self) -> Result<TypeOccurrence, DecorationError> {
        decorate_type(&self.raw, &self.type_params)
    }
}

impl Decorate for TypeOccurrence {
    /// Already decorated; returns an equal occurrence instead of wrapping twice.
    fn decorate(&self) -> Result<TypeOccurrence, DecorationError> {
        Ok(self.clone())
    }
}

impl TypeOccurrence {
    pub fn kind(&self) -> TypeKind {
        match self {
            TypeOccurrence::Primitive(_) => TypeKind::Primitive,
            TypeOccurrence::Declared(_) => TypeKind::Declared,
            TypeOccurrence::Array(_) => TypeKind::Array,
            TypeOccurrence::Tuple(_) => TypeKind::Tuple,
            TypeOccurrence::Wildcard(_) => TypeKind::Wildcard,
            TypeOccurrence::Variable(_) => TypeKind::Variable,
            TypeOccurrence::Void => TypeKind::Void,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.kind() == TypeKind::Wildcard
    }

    pub fn is_declared(&self) -> bool {
        self.kind() == TypeKind::Declared
    }

    pub fn is_array(&self) -> bool {
        self.kind() == TypeKind::Array
    }

    pub fn is_tuple(&self) -> bool {
        self.kind() == TypeKind::Tuple
    }

    pub fn is_primitive(&self) -> bool {
        self.kind() == TypeKind::Primitive
    }

    pub fn is_void(&self) -> bool {
        self.kind() == TypeKind::Void
    }

    pub fn is_variable(&self) -> bool {
        self.kind() == TypeKind::Variable
    }

    pub fn component_type(&self) -> Option<&TypeOccurrence> {
        match self {
            TypeOccurrence::Array(component) => Some(component),
            _ => None,
        }
    }

    pub fn type_arguments(&self) -> &[TypeOccurrence] {
        match self {
            TypeOccurrence::Declared(declared) => &declared.type_arguments,
            _ => &[],
        }
    }

    pub fn tuple_elements(&self) -> &[TypeOccurrence] {
        match self {
            TypeOccurrence::Tuple(elements) => elements,
            _ => &[],
        }
    }

    pub fn accept<V: TypeVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            TypeOccurrence::Primitive(primitive) => visitor.visit_primitive(*primitive),
            TypeOccurrence::Declared(declared) => visitor.visit_declared(declared),
            TypeOccurrence::Array(component) => visitor.visit_array(component),
            TypeOccurrence::Tuple(elements) => visitor.visit_tuple(elements),
            TypeOccurrence::Wildcard(wildcard) => visitor.visit_wildcard(wildcard),
            TypeOccurrence::Variable(name) => visitor.visit_variable(name),
            TypeOccurrence::Void => visitor.visit_void(),
        }
    }
}

impl fmt::Display for TypeOccurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeOccurrence::Primitive(primitive) => write!(f, "{}", primitive.as_str()),
            TypeOccurrence::Declared(declared) => {
                write!(f, "{}", declared.simple_name())?;
                if !declared.type_arguments.is_empty() {
                    let args: Vec<String> = declared
                        .type_arguments
                        .iter()
                        .map(ToString::to_string)
                        .collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
            TypeOccurrence::Array(component) => write!(f, "[{}]", component),
            TypeOccurrence::Tuple(elements) => {
                let elements: Vec<String> = elements.iter().map(ToString::to_string).collect();
                write!(f, "({})", elements.join(", "))
            }
            TypeOccurrence::Wildcard(wildcard) => match wildcard.extends_bound() {
                Ok(Some(bound)) => write!(f, "impl {}", bound),
                _ => write!(f, "_"),
            },
            TypeOccurrence::Variable(name) => write!(f, "{}", name),
            TypeOccurrence::Void => write!(f, "()"),
        }
    }
}

fn decorate_type(ty: &syn::Type, type_params: &[String]) -> Result<TypeOccurrence, DecorationError> {
    match ty {
        syn::Type::Paren(paren) => decorate_type(&paren.elem, type_params),
        syn::Type::Group(group) => decorate_type(&group.elem, type_params),
        syn::Type::Reference(reference) => decorate_type(&reference.elem, type_params),
        syn::Type::Array(array) => Ok(TypeOccurrence::Array(Box::new(decorate_type(
            &array.elem,
            type_params,
        )?))),
        syn::Type::Slice(slice) => Ok(TypeOccurrence::Array(Box::new(decorate_type(
            &slice.elem,
            type_params,
        )?))),
        syn::Type::Tuple(tuple) if tuple.elems.is_empty() => Ok(TypeOccurrence::Void),
        syn::Type::Never(_) => Ok(TypeOccurrence::Void),
        syn::Type::Infer(_) => Ok(TypeOccurrence::Wildcard(WildcardType::unbounded())),
        syn::Type::ImplTrait(impl_trait) => Ok(bounded_wildcard(&impl_trait.bounds, type_params)),
        syn::Type::TraitObject(trait_object) => {
            Ok(bounded_wildcard(&trait_object.bounds, type_params))
        }
        syn::Type::Path(type_path) => decorate_path(type_path, type_params),
        syn::Type::Tuple(tuple) => Ok(TypeOccurrence::Tuple(
            tuple
                .elems
                .iter()
                .map(|elem| decorate_type(elem, type_params))
                .collect::<Result<_, _>>()?,
        )),
        syn::Type::Ptr(_) => Err(DecorationError::UnsupportedKind("raw pointer")),
        syn::Type::BareFn(_) => Err(DecorationError::UnsupportedKind("function pointer")),
        syn::Type::Macro(_) => Err(DecorationError::UnsupportedKind("type macro")),
        syn::Type::Verbatim(_) => Err(DecorationError::UnsupportedKind("verbatim tokens")),
        _ => Err(DecorationError::UnsupportedKind("unrecognized")),
    }
}

fn bounded_wildcard(
    bounds: &syn::punctuated::Punctuated<syn::TypeParamBound, syn::Token![+]>,
    type_params: &[String],
) -> TypeOccurrence {
    let extends = bounds.iter().find_map(|bound| match bound {
        syn::TypeParamBound::Trait(trait_bound) => Some(TypeRef::new(
            syn::Type::Path(syn::TypePath {
                qself: None,
                path: trait_bound.path.clone(),
            }),
            type_params.to_vec(),
        )),
        _ => None,
    });
    TypeOccurrence::Wildcard(WildcardType::new(extends, None))
}

fn decorate_path(
    type_path: &syn::TypePath,
    type_params: &[String],
) -> Result<TypeOccurrence, DecorationError> {
    if type_path.qself.is_some() {
        return Err(DecorationError::UnsupportedKind("qualified path"));
    }

    let segments = &type_path.path.segments;
    if segments.len() == 1 && segments[0].arguments.is_empty() {
        let name = segments[0].ident.to_string();
        if type_params.iter().any(|param| *param == name) {
            return Ok(TypeOccurrence::Variable(name));
        }
        if let Some(primitive) = PrimitiveType::parse(&name) {
            return Ok(TypeOccurrence::Primitive(primitive));
        }
    }

    let mut type_arguments = Vec::new();
    if let Some(last) = segments.last() {
        match &last.arguments {
            syn::PathArguments::None => {}
            syn::PathArguments::AngleBracketed(args) => {
                for arg in &args.args {
                    if let syn::GenericArgument::Type(inner) = arg {
                        type_arguments.push(decorate_type(inner, type_params)?);
                    }
                }
            }
            syn::PathArguments::Parenthesized(_) => {
                return Err(DecorationError::UnsupportedKind("function trait"));
            }
        }
    }

    Ok(TypeOccurrence::Declared(DeclaredType {
        path: segments.iter().map(|s| s.ident.to_string()).collect(),
        type_arguments,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_ref(src: &str) -> TypeRef {
        TypeRef::new(syn::parse_str(src).unwrap(), vec!["T".to_string()])
    }

    #[test]
    fn test_decorate_primitive() {
        let decorated = type_ref("u64").decorate().unwrap();
        assert!(decorated.is_primitive());
        assert_eq!(decorated, TypeOccurrence::Primitive(PrimitiveType::U64));
    }

    #[test]
    fn test_decorate_declared_generic() {
        let decorated = type_ref("std::collections::HashMap<String, Vec<Widget>>")
            .decorate()
            .unwrap();
        assert!(decorated.is_declared());
        if let TypeOccurrence::Declared(declared) = &decorated {
            assert_eq!(declared.simple_name(), "HashMap");
            assert_eq!(declared.erasure(), "std::collections::HashMap");
            assert_eq!(declared.type_arguments.len(), 2);
            assert!(declared.type_arguments[0].is_primitive());
            assert_eq!(declared.type_arguments[1].type_arguments().len(), 1);
        } else {
            panic!("Expected declared type");
        }
        assert_eq!(decorated.to_string(), "HashMap<String, Vec<Widget>>");
    }

    #[test]
    fn test_decorate_type_variable_in_scope() {
        assert!(type_ref("T").decorate().unwrap().is_variable());
        // Not in scope: a declared type that happens to be called `U`.
        assert!(type_ref("U").decorate().unwrap().is_declared());
    }

    #[test]
    fn test_decorate_arrays_and_slices() {
        let array = type_ref("[Widget; 4]").decorate().unwrap();
        assert!(array.is_array());
        assert!(array.component_type().unwrap().is_declared());

        let slice = type_ref("&[u8]").decorate().unwrap();
        assert_eq!(
            slice.component_type(),
            Some(&TypeOccurrence::Primitive(PrimitiveType::U8))
        );
    }

    #[test]
    fn test_decorate_void() {
        assert!(type_ref("()").decorate().unwrap().is_void());
        assert!(type_ref("!").decorate().unwrap().is_void());
    }

    #[test]
    fn test_wildcard_bounds() {
        let unbounded = type_ref("_").decorate().unwrap();
        assert!(unbounded.is_wildcard());
        if let TypeOccurrence::Wildcard(wildcard) = &unbounded {
            assert_eq!(wildcard.extends_bound(), Ok(None));
            assert_eq!(wildcard.super_bound(), Ok(None));
        }

        let bounded = type_ref("impl Into<Widget> + Send").decorate().unwrap();
        if let TypeOccurrence::Wildcard(wildcard) = &bounded {
            let bound = wildcard.extends_bound().unwrap().unwrap();
            assert!(bound.is_declared());
            assert_eq!(bound.to_string(), "Into<Widget>");
            assert_eq!(wildcard.super_bound(), Ok(None));
        } else {
            panic!("Expected wildcard");
        }
    }

    #[test]
    fn test_wildcard_super_bound() {
        let wildcard = WildcardType::new(None, Some(type_ref("Widget")));
        let occurrence = TypeOccurrence::Wildcard(wildcard.clone());
        assert!(occurrence.is_wildcard());
        assert!(wildcard.extends_bound().unwrap().is_none());
        assert!(wildcard.super_bound().unwrap().unwrap().is_declared());
    }

    #[test]
    fn test_unsupported_kinds_fail_loudly() {
        assert_eq!(
            type_ref("fn(u32) -> u32").decorate(),
            Err(DecorationError::UnsupportedKind("function pointer"))
        );
        assert_eq!(
            type_ref("*const u8").decorate(),
            Err(DecorationError::UnsupportedKind("raw pointer"))
        );
        assert_eq!(
            type_ref("<T as Trait>::Output").decorate(),
            Err(DecorationError::UnsupportedKind("qualified path"))
        );
    }

    #[test]
    fn test_decorate_tuple() {
        let tuple = type_ref("(f64, Vec<Widget>)").decorate().unwrap();
        assert!(tuple.is_tuple());
        assert_eq!(tuple.tuple_elements().len(), 2);
        assert_eq!(
            tuple.tuple_elements()[0],
            TypeOccurrence::Primitive(PrimitiveType::F64)
        );
        assert_eq!(tuple.to_string(), "(f64, Vec<Widget>)");
    }

    #[test]
    fn test_pointer_sized_integers_keep_their_names() {
        assert_eq!(
            type_ref("usize").decorate().unwrap(),
            TypeOccurrence::Primitive(PrimitiveType::Usize)
        );
        assert_eq!(type_ref("usize").decorate().unwrap().to_string(), "usize");
        assert_eq!(type_ref("isize").decorate().unwrap().to_string(), "isize");
        assert_eq!(type_ref("Vec<usize>").decorate().unwrap().to_string(), "Vec<usize>");
    }

    #[test]
    fn test_decoration_is_idempotent() {
        for src in ["Vec<Widget>", "[u8; 2]", "(u32, T)", "impl Into<Widget>", "T", "()", "bool"] {
            let once = type_ref(src).decorate().unwrap();
            let twice = once.decorate().unwrap();
            assert_eq!(once, twice);
            assert_eq!(once.kind(), twice.kind());
            assert_eq!(once.component_type(), twice.component_type());
            if let (TypeOccurrence::Wildcard(a), TypeOccurrence::Wildcard(b)) = (&once, &twice) {
                assert_eq!(a.extends_bound(), b.extends_bound());
                assert_eq!(a.super_bound(), b.super_bound());
            }
        }
    }

    #[test]
    fn test_same_underlying_type_compares_equal() {
        let a = type_ref("&Widget").decorate().unwrap();
        let b = type_ref("(Widget)").decorate().unwrap();
        assert_eq!(a, b);
    }

    struct KindName;

    impl TypeVisitor for KindName {
        type Output = &'static str;

        fn visit_primitive(&mut self, _: PrimitiveType) -> &'static str {
            "primitive"
        }
        fn visit_declared(&mut self, _: &DeclaredType) -> &'static str {
            "declared"
        }
        fn visit_array(&mut self, _: &TypeOccurrence) -> &'static str {
            "array"
        }
        fn visit_tuple(&mut self, _: &[TypeOccurrence]) -> &'static str {
            "tuple"
        }
        fn visit_wildcard(&mut self, _: &WildcardType) -> &'static str {
            "wildcard"
        }
        fn visit_variable(&mut self, _: &str) -> &'static str {
            "variable"
        }
        fn visit_void(&mut self) -> &'static str {
            "void"
        }
    }

    #[test]
    fn test_visitor_dispatch() {
        let cases = [
            ("i32", "primitive"),
            ("Widget", "declared"),
            ("[Widget]", "array"),
            ("(Widget, u8)", "tuple"),
            ("dyn Display", "wildcard"),
            ("T", "variable"),
            ("()", "void"),
        ];
        for (src, expected) in cases {
            let decorated = type_ref(src).decorate().unwrap();
            assert_eq!(decorated.accept(&mut KindName), expected, "for {}", src);
        }
    }
}
