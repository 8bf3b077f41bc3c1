use crate::decoration::TypeRef;
use crate::element::{
    collect_annotations, Element, ElementKind, FieldElement, MethodElement, ParameterElement,
    TypeElement, TypeShape,
};
use crate::parser::ParsedFile;
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Read-only queries over the analyzed program.
///
/// This is everything the rest of the crate asks of the underlying program representation;
/// nothing else about how the program was loaded is assumed.
pub trait ProgramModel {
    /// Declared types, ordered by qualified name. With `local_only`, types from included
    /// source roots are left out.
    fn api_elements(&self, local_only: bool) -> Vec<&TypeElement>;

    /// Resolves a written type path (`Widget`, `model::Widget`) to its declaration, without
    /// regard to where it was written.
    fn find_type(&self, path: &[String]) -> Option<&TypeElement>;

    /// Resolves a type path as written inside module `from_package`: imports of that module,
    /// `crate::`/`self::`/`super::` prefixes and same-module declarations are honored.
    fn resolve_type(&self, path: &[String], from_package: &str) -> Option<&TypeElement>;

    /// Callable members of `ty`: inherent methods, plus trait-implemented and trait-default
    /// methods when `include_inherited` is set.
    fn methods_of(&self, ty: &TypeElement, include_inherited: bool) -> Vec<MethodElement>;

    /// The module path of `ty`.
    fn package_of<'a>(&self, ty: &'a TypeElement) -> &'a str {
        &ty.element.package
    }
}

/// Program model built from parsed source files.
#[derive(Debug, Default)]
pub struct SourceModel {
    /// All declared structs and enums, sorted by qualified name
    types: Vec<TypeElement>,
    /// `impl` blocks whose target type was found in the model
    impls: Vec<ImplBlock>,
    traits: Vec<TraitDecl>,
    /// `use` declarations per module: imported name → path as written
    imports: HashMap<String, BTreeMap<String, Vec<String>>>,
}

#[derive(Debug)]
struct ImplBlock {
    target: String,
    trait_name: Option<String>,
    methods: Vec<MethodElement>,
}

#[derive(Debug)]
struct TraitDecl {
    name: String,
    methods: Vec<TraitMethod>,
}

#[derive(Debug)]
struct TraitMethod {
    method: MethodElement,
    has_default: bool,
}

struct PendingImpl {
    package: String,
    item: syn::ItemImpl,
}

impl SourceModel {
    /// Builds the model from all parsed files. Items inside inline `mod` blocks are included.
    pub fn new(parsed_files: &[ParsedFile]) -> Self {
        debug!("Building source model from {} files", parsed_files.len());

        let mut model = SourceModel::default();
        let mut pending = Vec::new();
        for parsed_file in parsed_files {
            model.collect_items(
                &parsed_file.syntax_tree.items,
                &parsed_file.module_path,
                parsed_file.local,
                &mut pending,
            );
        }
        model
            .types
            .sort_by(|a, b| a.qualified_name().cmp(b.qualified_name()));

        for PendingImpl { package, item } in pending {
            model.add_impl(&package, &item);
        }

        debug!(
            "Source model has {} types, {} impl blocks and {} traits",
            model.types.len(),
            model.impls.len(),
            model.traits.len()
        );
        model
    }

    pub fn types(&self) -> &[TypeElement] {
        &self.types
    }

    fn collect_items(
        &mut self,
        items: &[syn::Item],
        module_path: &[String],
        local: bool,
        pending: &mut Vec<PendingImpl>,
    ) {
        let package = module_path.join("::");
        for item in items {
            match item {
                syn::Item::Struct(item_struct) => {
                    self.types.push(type_from_struct(item_struct, &package, local));
                }
                syn::Item::Enum(item_enum) => {
                    self.types.push(type_from_enum(item_enum, &package, local));
                }
                syn::Item::Impl(item_impl) => pending.push(PendingImpl {
                    package: package.clone(),
                    item: item_impl.clone(),
                }),
                syn::Item::Trait(item_trait) => {
                    self.traits.push(trait_from_item(item_trait, &package));
                }
                syn::Item::Use(item_use) => {
                    let imports = self.imports.entry(package.clone()).or_default();
                    collect_imports(&item_use.tree, &mut Vec::new(), imports);
                }
                syn::Item::Mod(item_mod) => {
                    if let Some((_, nested)) = &item_mod.content {
                        let mut nested_path = module_path.to_vec();
                        nested_path.push(item_mod.ident.to_string());
                        self.collect_items(nested, &nested_path, local, pending);
                    }
                }
                _ => {}
            }
        }
    }

    fn add_impl(&mut self, package: &str, item: &syn::ItemImpl) {
        let syn::Type::Path(self_ty) = item.self_ty.as_ref() else {
            return;
        };
        let written: Vec<String> = self_ty
            .path
            .segments
            .iter()
            .map(|s| s.ident.to_string())
            .collect();
        let Some(target) = self.resolve(&written, Some(package)) else {
            debug!("Skipping impl for type outside the model: {}", written.join("::"));
            return;
        };
        let target = target.qualified_name().to_string();

        let trait_name = item
            .trait_
            .as_ref()
            .and_then(|(_, path, _)| path.segments.last())
            .map(|s| s.ident.to_string());
        let impl_params = type_param_names(&item.generics);

        let methods = item
            .items
            .iter()
            .filter_map(|impl_item| match impl_item {
                syn::ImplItem::Fn(f) => Some(method_element(
                    &f.sig,
                    &f.attrs,
                    package,
                    &target,
                    &impl_params,
                )),
                _ => None,
            })
            .collect();

        self.impls.push(ImplBlock {
            target,
            trait_name,
            methods,
        });
    }

    /// Candidate resolution, in order:
    /// 1. an exact qualified name, after imports and `crate`/`self`/`super` are applied; an
    ///    unanchored path is tried relative to `package` first, then from the crate root
    /// 2. among types sharing the simple name, the one whose qualified name ends with the path
    /// 3. the one declared closest to `package` (same module first)
    /// 4. the first in qualified-name order
    fn resolve(&self, path: &[String], package: Option<&str>) -> Option<&TypeElement> {
        let (path, anchored) = match package {
            Some(package) => self.absolute_path(path, package),
            None => (strip_crate(path), false),
        };
        let simple = path.last()?;

        if let (Some(package), false) = (package, anchored) {
            if !package.is_empty() {
                if let Some(found) = self.exact(&format!("{}::{}", package, path.join("::"))) {
                    return Some(found);
                }
            }
        }
        if let Some(found) = self.exact(&path.join("::")) {
            return Some(found);
        }

        let candidates: Vec<&TypeElement> = self
            .types
            .iter()
            .filter(|t| t.simple_name() == simple)
            .collect();

        if candidates.len() > 1 {
            if path.len() > 1 {
                let suffix = format!("::{}", path.join("::"));
                if let Some(found) = candidates
                    .iter()
                    .find(|t| t.qualified_name().ends_with(&suffix))
                {
                    return Some(found);
                }
            }
            if let Some(package) = package {
                if let Some(found) = candidates
                    .iter()
                    .min_by_key(|t| package_distance(&t.element.package, package))
                {
                    return Some(found);
                }
            }
            debug!(
                "Ambiguous type {}: {} candidates, using the first",
                path.join("::"),
                candidates.len()
            );
        }
        candidates.first().copied()
    }

    fn exact(&self, qualified_name: &str) -> Option<&TypeElement> {
        self.types
            .iter()
            .find(|t| t.qualified_name() == qualified_name)
    }

    /// Rewrites `path`, as written in `package`, into a path from the crate root where possible.
    /// The flag tells whether the result is anchored at the crate root.
    fn absolute_path(&self, path: &[String], package: &str) -> (Vec<String>, bool) {
        let mut path = path.to_vec();
        let imported = path.first().and_then(|first| {
            self.imports
                .get(package)
                .and_then(|imports| imports.get(first))
        });
        if let Some(imported) = imported {
            let mut expanded = imported.clone();
            expanded.extend(path.drain(1..));
            path = expanded;
        }

        let mut module: Vec<String> = split_package(package);
        let head = path.first().cloned();
        match head.as_deref() {
            Some("crate") => (path[1..].to_vec(), true),
            Some("self") => {
                module.extend(path.drain(1..));
                (module, true)
            }
            Some("super") => {
                let mut rest = path.as_slice();
                while rest.first().map(String::as_str) == Some("super") {
                    module.pop();
                    rest = &rest[1..];
                }
                module.extend(rest.iter().cloned());
                (module, true)
            }
            _ => (path, imported.is_some()),
        }
    }
}

fn strip_crate(path: &[String]) -> Vec<String> {
    match path.first().map(String::as_str) {
        Some("crate") => path[1..].to_vec(),
        _ => path.to_vec(),
    }
}

fn split_package(package: &str) -> Vec<String> {
    package
        .split("::")
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Module hops between two packages through their closest common ancestor.
fn package_distance(a: &str, b: &str) -> usize {
    let (a, b) = (split_package(a), split_package(b));
    let common = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
    (a.len() - common) + (b.len() - common)
}

/// Flattens a `use` tree into imported name → path entries. Glob imports are not tracked.
fn collect_imports(
    tree: &syn::UseTree,
    prefix: &mut Vec<String>,
    imports: &mut BTreeMap<String, Vec<String>>,
) {
    match tree {
        syn::UseTree::Path(use_path) => {
            prefix.push(use_path.ident.to_string());
            collect_imports(&use_path.tree, prefix, imports);
            prefix.pop();
        }
        syn::UseTree::Name(use_name) => {
            let name = use_name.ident.to_string();
            if name == "self" {
                if let Some(last) = prefix.last() {
                    imports.insert(last.clone(), prefix.clone());
                }
            } else {
                let mut full = prefix.clone();
                full.push(name.clone());
                imports.insert(name, full);
            }
        }
        syn::UseTree::Rename(use_rename) => {
            let mut full = prefix.clone();
            let name = use_rename.ident.to_string();
            if name != "self" {
                full.push(name);
            }
            imports.insert(use_rename.rename.to_string(), full);
        }
        syn::UseTree::Glob(_) => {
            debug!("Skipping glob import under {}", prefix.join("::"));
        }
        syn::UseTree::Group(group) => {
            for item in &group.items {
                collect_imports(item, prefix, imports);
            }
        }
    }
}

impl ProgramModel for SourceModel {
    fn api_elements(&self, local_only: bool) -> Vec<&TypeElement> {
        self.types
            .iter()
            .filter(|t| t.local || !local_only)
            .collect()
    }

    fn find_type(&self, path: &[String]) -> Option<&TypeElement> {
        self.resolve(path, None)
    }

    fn resolve_type(&self, path: &[String], from_package: &str) -> Option<&TypeElement> {
        self.resolve(path, Some(from_package))
    }

    fn methods_of(&self, ty: &TypeElement, include_inherited: bool) -> Vec<MethodElement> {
        let qualified = ty.qualified_name();
        let mut methods: Vec<MethodElement> = self
            .impls
            .iter()
            .filter(|block| block.target == qualified && block.trait_name.is_none())
            .flat_map(|block| block.methods.iter().cloned())
            .collect();

        if !include_inherited {
            return methods;
        }

        for block in self
            .impls
            .iter()
            .filter(|block| block.target == qualified)
        {
            let Some(trait_name) = &block.trait_name else {
                continue;
            };
            let declaration = self.traits.iter().find(|t| &t.name == trait_name);

            for method in &block.methods {
                let declared = declaration.and_then(|d| {
                    d.methods
                        .iter()
                        .find(|m| m.method.element.simple_name == method.element.simple_name)
                });
                methods.push(match declared {
                    Some(declared) => inherit_annotations(method.clone(), &declared.method),
                    None => method.clone(),
                });
            }

            if let Some(declaration) = declaration {
                for default in declaration.methods.iter().filter(|m| m.has_default) {
                    let overridden = block
                        .methods
                        .iter()
                        .any(|m| m.element.simple_name == default.method.element.simple_name);
                    if !overridden {
                        methods.push(reown(default.method.clone(), ty));
                    }
                }
            }
        }

        methods
    }
}

fn type_param_names(generics: &syn::Generics) -> Vec<String> {
    generics
        .type_params()
        .map(|param| param.ident.to_string())
        .collect()
}

fn type_from_struct(item: &syn::ItemStruct, package: &str, local: bool) -> TypeElement {
    let element = Element::new(
        ElementKind::Type,
        package,
        None,
        item.ident.to_string(),
        collect_annotations(&item.attrs),
    );
    let type_params = type_param_names(&item.generics);
    let fields = fields_of(&item.fields, None, package, &element.qualified_name, &type_params);
    debug!("Parsed struct {} with {} fields", element.qualified_name, fields.len());

    TypeElement {
        element,
        shape: TypeShape::Struct,
        type_params,
        fields,
        variants: Vec::new(),
        local,
    }
}

fn type_from_enum(item: &syn::ItemEnum, package: &str, local: bool) -> TypeElement {
    let element = Element::new(
        ElementKind::Type,
        package,
        None,
        item.ident.to_string(),
        collect_annotations(&item.attrs),
    );
    let type_params = type_param_names(&item.generics);

    let mut variants = Vec::new();
    let mut fields = Vec::new();
    for variant in &item.variants {
        let name = variant.ident.to_string();
        fields.extend(fields_of(
            &variant.fields,
            Some(&name),
            package,
            &element.qualified_name,
            &type_params,
        ));
        variants.push(name);
    }
    debug!("Parsed enum {} with {} variants", element.qualified_name, variants.len());

    TypeElement {
        element,
        shape: TypeShape::Enum,
        type_params,
        fields,
        variants,
        local,
    }
}

/// Fields of a struct, or payload fields of one enum variant (named `Variant.field`).
fn fields_of(
    fields: &syn::Fields,
    variant: Option<&str>,
    package: &str,
    owner: &str,
    type_params: &[String],
) -> Vec<FieldElement> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let name = field
                .ident
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| index.to_string());
            let name = match variant {
                Some(variant) => format!("{}.{}", variant, name),
                None => name,
            };
            FieldElement {
                element: Element::new(
                    ElementKind::Field,
                    package,
                    Some(owner),
                    name,
                    collect_annotations(&field.attrs),
                ),
                ty: TypeRef::new(field.ty.clone(), type_params.to_vec()).with_package(package),
            }
        })
        .collect()
}

fn trait_from_item(item: &syn::ItemTrait, package: &str) -> TraitDecl {
    let name = item.ident.to_string();
    let owner = if package.is_empty() {
        name.clone()
    } else {
        format!("{}::{}", package, name)
    };
    let trait_params = type_param_names(&item.generics);

    let methods = item
        .items
        .iter()
        .filter_map(|trait_item| match trait_item {
            syn::TraitItem::Fn(f) => Some(TraitMethod {
                method: method_element(&f.sig, &f.attrs, package, &owner, &trait_params),
                has_default: f.default.is_some(),
            }),
            _ => None,
        })
        .collect();

    TraitDecl { name, methods }
}

fn method_element(
    sig: &syn::Signature,
    attrs: &[syn::Attribute],
    package: &str,
    owner: &str,
    outer_params: &[String],
) -> MethodElement {
    let mut scope = outer_params.to_vec();
    scope.extend(type_param_names(&sig.generics));

    let element = Element::new(
        ElementKind::Method,
        package,
        Some(owner),
        sig.ident.to_string(),
        collect_annotations(attrs),
    );

    let parameters = sig
        .inputs
        .iter()
        .enumerate()
        .filter_map(|(index, input)| match input {
            syn::FnArg::Typed(pat_type) => {
                let name = pattern_name(&pat_type.pat).unwrap_or_else(|| format!("arg{}", index));
                Some(ParameterElement {
                    element: Element::new(
                        ElementKind::Parameter,
                        package,
                        Some(&element.qualified_name),
                        name,
                        collect_annotations(&pat_type.attrs),
                    ),
                    ty: TypeRef::new((*pat_type.ty).clone(), scope.clone()).with_package(package),
                })
            }
            syn::FnArg::Receiver(_) => None,
        })
        .collect();

    let return_type = match &sig.output {
        syn::ReturnType::Default => None,
        syn::ReturnType::Type(_, ty) => {
            Some(TypeRef::new((**ty).clone(), scope.clone()).with_package(package))
        }
    };

    MethodElement {
        element,
        has_receiver: sig.receiver().is_some(),
        parameters,
        return_type,
    }
}

/// Binding name of a parameter pattern; `Json(body)` binds `body`.
fn pattern_name(pat: &syn::Pat) -> Option<String> {
    match pat {
        syn::Pat::Ident(pat_ident) => Some(pat_ident.ident.to_string()),
        syn::Pat::TupleStruct(tuple_struct) => tuple_struct.elems.first().and_then(pattern_name),
        syn::Pat::Reference(reference) => pattern_name(&reference.pat),
        syn::Pat::Type(pat_type) => pattern_name(&pat_type.pat),
        _ => None,
    }
}

/// Fills in annotations the implementing method does not declare from the trait declaration.
fn inherit_annotations(mut method: MethodElement, declared: &MethodElement) -> MethodElement {
    for (name, annotation) in &declared.element.annotations {
        method
            .element
            .annotations
            .entry(name.clone())
            .or_insert_with(|| annotation.clone());
    }
    for (parameter, declared_parameter) in method
        .parameters
        .iter_mut()
        .zip(declared.parameters.iter())
    {
        for (name, annotation) in &declared_parameter.element.annotations {
            parameter
                .element
                .annotations
                .entry(name.clone())
                .or_insert_with(|| annotation.clone());
        }
    }
    method
}

/// Moves a trait default method onto the implementing type.
fn reown(mut method: MethodElement, ty: &TypeElement) -> MethodElement {
    method.element.qualified_name =
        format!("{}::{}", ty.qualified_name(), method.element.simple_name);
    method.element.package = ty.element.package.clone();
    method
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoration::{Decorate, TypeOccurrence};

    fn model_from(files: &[(&[&str], &str)]) -> SourceModel {
        let parsed: Vec<ParsedFile> = files
            .iter()
            .map(|(module_path, code)| ParsedFile::from_source(module_path, code).unwrap())
            .collect();
        SourceModel::new(&parsed)
    }

    fn path(name: &str) -> Vec<String> {
        name.split("::").map(str::to_string).collect()
    }

    #[test]
    fn test_collects_structs_and_enums() {
        let model = model_from(&[(
            &["api"],
            r#"
                pub struct User {
                    pub id: u32,
                    pub name: String,
                    pub active: bool,
                }

                pub enum Status {
                    Active,
                    Inactive,
                    Pending,
                }
            "#,
        )]);

        let user = model.find_type(&path("User")).unwrap();
        assert_eq!(user.qualified_name(), "api::User");
        assert_eq!(user.shape, TypeShape::Struct);
        let names: Vec<&str> = user.fields.iter().map(|f| f.element.simple_name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "active"]);

        let status = model.find_type(&path("Status")).unwrap();
        assert_eq!(status.shape, TypeShape::Enum);
        assert_eq!(status.variants, vec!["Active", "Inactive", "Pending"]);
        assert!(status.fields.is_empty());
    }

    #[test]
    fn test_enum_payloads_become_fields() {
        let model = model_from(&[(
            &[],
            r#"
                pub enum Shape {
                    Circle(Circle),
                    Rect { width: u32, height: u32 },
                    Empty,
                }
                pub struct Circle { pub radius: f64 }
            "#,
        )]);
        let shape = model.find_type(&path("Shape")).unwrap();
        let names: Vec<&str> = shape.fields.iter().map(|f| f.element.simple_name.as_str()).collect();
        assert_eq!(names, vec!["Circle.0", "Rect.width", "Rect.height"]);
    }

    #[test]
    fn test_types_sorted_by_qualified_name() {
        let model = model_from(&[
            (&["b"], "pub struct Zed;"),
            (&["a"], "pub struct Zed; pub struct Alpha;"),
        ]);
        let names: Vec<&str> = model.types().iter().map(|t| t.qualified_name()).collect();
        assert_eq!(names, vec!["a::Alpha", "a::Zed", "b::Zed"]);
    }

    #[test]
    fn test_inline_modules_extend_package() {
        let model = model_from(&[(&["api"], "pub mod v2 { pub struct Widget; }")]);
        let widget = model.find_type(&path("Widget")).unwrap();
        assert_eq!(widget.qualified_name(), "api::v2::Widget");
        assert_eq!(model.package_of(widget), "api::v2");
    }

    #[test]
    fn test_find_type_prefers_matching_suffix() {
        let model = model_from(&[
            (&["v1"], "pub struct Widget;"),
            (&["v2"], "pub struct Widget;"),
        ]);
        assert_eq!(
            model.find_type(&path("v2::Widget")).unwrap().qualified_name(),
            "v2::Widget"
        );
        assert_eq!(
            model.find_type(&path("Widget")).unwrap().qualified_name(),
            "v1::Widget"
        );
        assert!(model.find_type(&path("Missing")).is_none());
    }

    #[test]
    fn test_resolve_type_prefers_referencing_module() {
        let model = model_from(&[
            (&["v1"], "pub struct Widget;"),
            (&["v2"], "pub struct Widget;"),
            (&["v2", "admin"], "pub struct Audit;"),
        ]);
        let resolve = |name: &str, from: &str| {
            model
                .resolve_type(&path(name), from)
                .map(|t| t.qualified_name().to_string())
        };

        assert_eq!(resolve("Widget", "v2").as_deref(), Some("v2::Widget"));
        assert_eq!(resolve("Widget", "v1").as_deref(), Some("v1::Widget"));
        assert_eq!(resolve("Widget", "v2::admin").as_deref(), Some("v2::Widget"));
        assert_eq!(resolve("v1::Widget", "v2").as_deref(), Some("v1::Widget"));
        assert_eq!(resolve("admin::Audit", "v2").as_deref(), Some("v2::admin::Audit"));
    }

    #[test]
    fn test_resolve_type_anchored_paths() {
        let model = model_from(&[
            (&["v1"], "pub struct Widget;"),
            (&["v2"], "pub struct Widget;"),
            (&["v2", "admin"], "pub struct Widget;"),
        ]);
        let resolve = |name: &str, from: &str| {
            model
                .resolve_type(&path(name), from)
                .map(|t| t.qualified_name().to_string())
        };

        assert_eq!(resolve("crate::v2::Widget", "v1").as_deref(), Some("v2::Widget"));
        assert_eq!(resolve("self::Widget", "v2::admin").as_deref(), Some("v2::admin::Widget"));
        assert_eq!(resolve("super::Widget", "v2::admin").as_deref(), Some("v2::Widget"));
        assert_eq!(
            resolve("super::super::v1::Widget", "v2::admin").as_deref(),
            Some("v1::Widget")
        );
        assert_eq!(
            model
                .find_type(&path("crate::v2::admin::Widget"))
                .map(|t| t.qualified_name()),
            Some("v2::admin::Widget")
        );
    }

    #[test]
    fn test_resolve_type_follows_imports() {
        let model = model_from(&[
            (&["v1"], "pub struct Widget;"),
            (&["v2"], "pub struct Widget;"),
            (
                &["v3"],
                r#"
                    use crate::v2::Widget;
                    use crate::v1::{self, Widget as LegacyWidget};
                "#,
            ),
        ]);
        let resolve = |name: &str| {
            model
                .resolve_type(&path(name), "v3")
                .map(|t| t.qualified_name().to_string())
        };

        assert_eq!(resolve("Widget").as_deref(), Some("v2::Widget"));
        assert_eq!(resolve("LegacyWidget").as_deref(), Some("v1::Widget"));
        assert_eq!(resolve("v1::Widget").as_deref(), Some("v1::Widget"));
    }

    #[test]
    fn test_api_elements_local_only() {
        let local = ParsedFile::from_source(&["app"], "pub struct Local;").unwrap();
        let shared = ParsedFile::from_source(&["shared"], "pub struct Shared;")
            .unwrap()
            .with_local(false);
        let model = SourceModel::new(&[local, shared]);

        assert_eq!(model.api_elements(true).len(), 1);
        assert_eq!(model.api_elements(false).len(), 2);
    }

    #[test]
    fn test_methods_collected_across_files() {
        let model = model_from(&[
            (&["api"], "pub struct WidgetResource;"),
            (
                &["api", "handlers"],
                r#"
                    impl WidgetResource {
                        #[get]
                        pub fn list(&self, #[query_param("page")] page: u32) -> Vec<Widget> { vec![] }
                    }
                "#,
            ),
        ]);
        let resource = model.find_type(&path("WidgetResource")).unwrap();
        let methods = model.methods_of(resource, false);

        assert_eq!(methods.len(), 1);
        let list = &methods[0];
        assert_eq!(list.element.qualified_name, "api::WidgetResource::list");
        assert!(list.has_receiver);
        assert!(list.element.has_annotation("get"));
        assert_eq!(list.parameters.len(), 1);
        assert_eq!(list.parameters[0].element.simple_name, "page");
        assert!(list.parameters[0].element.has_annotation("query_param"));
        assert!(list.return_type.is_some());
    }

    #[test]
    fn test_inherited_methods_take_trait_annotations() {
        let model = model_from(&[(
            &[],
            r#"
                pub trait WidgetApi {
                    #[get]
                    #[path("{id}")]
                    fn get(&self, #[path_param("id")] id: u32) -> Widget;

                    #[delete]
                    fn remove(&self) {}
                }

                pub struct WidgetResource;

                impl WidgetApi for WidgetResource {
                    #[produces("application/xml")]
                    fn get(&self, id: u32) -> Widget { todo!() }
                }
            "#,
        )]);
        let resource = model.find_type(&path("WidgetResource")).unwrap();

        assert!(model.methods_of(resource, false).is_empty());

        let methods = model.methods_of(resource, true);
        assert_eq!(methods.len(), 2);

        let get = &methods[0];
        assert!(get.element.has_annotation("get"));
        assert!(get.element.has_annotation("path"));
        assert!(get.element.has_annotation("produces"));
        assert!(get.parameters[0].element.has_annotation("path_param"));

        let remove = &methods[1];
        assert_eq!(remove.element.qualified_name, "WidgetResource::remove");
        assert!(remove.element.has_annotation("delete"));
        assert!(remove.return_type.is_none());
    }

    #[test]
    fn test_parameter_patterns_and_generic_scope() {
        let model = model_from(&[(
            &[],
            r#"
                pub struct Resource;
                impl Resource {
                    pub fn create<T>(Json(body): Json<T>) -> T { body }
                }
            "#,
        )]);
        let resource = model.find_type(&path("Resource")).unwrap();
        let methods = model.methods_of(resource, false);
        let create = &methods[0];

        assert!(!create.has_receiver);
        assert_eq!(create.parameters[0].element.simple_name, "body");
        let returned = create.return_type.as_ref().unwrap().decorate().unwrap();
        assert_eq!(returned, TypeOccurrence::Variable("T".to_string()));
    }

    #[test]
    fn test_field_types_keep_generic_scope() {
        let model = model_from(&[(&[], "pub struct Page<T> { pub items: Vec<T>, pub total: u64 }")]);
        let page = model.find_type(&path("Page")).unwrap();
        assert_eq!(page.type_params, vec!["T"]);
        let items = page.fields[0].ty.decorate().unwrap();
        assert!(items.type_arguments()[0].is_variable());
    }
}
