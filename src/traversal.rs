//! Reachability traversal from API operations to the data types they exchange.

use crate::context::{ContextPath, Frame};
use crate::decoration::{DeclaredType, TypeOccurrence};
use crate::element::TypeElement;
use crate::error::{Error, Result};
use crate::registry::ApiContext;
use crate::representation::MediaTypeModule;
use crate::source_model::ProgramModel;
use log::debug;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Generic wrappers that are never documented themselves; only their arguments are walked.
pub const CONTAINER_TYPES: [&str; 11] = [
    "Vec", "VecDeque", "HashSet", "BTreeSet", "HashMap", "BTreeMap", "Option", "Box", "Rc",
    "Arc", "Cow",
];

pub fn is_container(declared: &DeclaredType) -> bool {
    CONTAINER_TYPES.contains(&declared.simple_name())
}

/// Walks type occurrences and asks representation modules to define every declared type
/// reachable from them.
///
/// The traversal owns the per-module visited sets, keyed by erased qualified name, so a module
/// is never asked to define the same type twice and self-referential types terminate. One
/// traversal is shared by every stage of a run.
pub struct DataTypeTraversal<'m> {
    model: &'m dyn ProgramModel,
    visited: HashMap<&'static str, HashSet<String>>,
}

impl<'m> DataTypeTraversal<'m> {
    pub fn new(model: &'m dyn ProgramModel) -> Self {
        Self {
            model,
            visited: HashMap::new(),
        }
    }

    pub fn model(&self) -> &'m dyn ProgramModel {
        self.model
    }

    /// Number of types defined so far by the module with the given format name.
    pub fn defined_count(&self, format_name: &str) -> usize {
        self.visited.get(format_name).map(HashSet::len).unwrap_or(0)
    }

    /// Pushes the types reachable from every operation of `context` into `modules`.
    ///
    /// Request bodies are offered with the operation's consumed media types, responses with its
    /// produced media types. Without modules this does nothing.
    pub fn traverse_context(
        &mut self,
        context: &ApiContext,
        modules: &mut [&mut dyn MediaTypeModule],
    ) -> Result<()> {
        if modules.is_empty() {
            debug!("No representation modules registered, skipping data type traversal");
            return Ok(());
        }

        let root = ContextPath::root();
        for endpoint in context.endpoints() {
            let endpoint_frame = Frame::Endpoint(endpoint.simple_name().to_string());
            let at_endpoint = root.push(&endpoint_frame);

            for operation in &endpoint.operations {
                let operation_frame = Frame::Operation(operation.name.clone());
                let at_operation = at_endpoint.push(&operation_frame);

                if let Some(entity) = &operation.entity_parameter {
                    let parameter_frame = Frame::Parameter(entity.name.clone());
                    let at_parameter = at_operation.push(&parameter_frame);
                    let occurrence = at_parameter.decorate(&entity.ty)?;
                    for module in modules.iter_mut() {
                        self.register_reachable_types(
                            &mut **module,
                            &occurrence,
                            entity.ty.package(),
                            &operation.consumes,
                            &at_parameter,
                        )?;
                    }
                }

                if let Some(representation) = &operation.representation {
                    let occurrence = at_operation.decorate(&representation.ty)?;
                    let representation_frame = Frame::Representation(occurrence.to_string());
                    let at_representation = at_operation.push(&representation_frame);
                    for module in modules.iter_mut() {
                        self.register_reachable_types(
                            &mut **module,
                            &occurrence,
                            representation.ty.package(),
                            &operation.produces,
                            &at_representation,
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Registers every data type reachable from `ty` with `module`, if the module carries any of
    /// `media_types`. Declared names in `ty` are resolved from `from_package`.
    pub fn register_reachable_types(
        &mut self,
        module: &mut dyn MediaTypeModule,
        ty: &TypeOccurrence,
        from_package: &str,
        media_types: &BTreeSet<String>,
        path: &ContextPath<'_>,
    ) -> Result<()> {
        if !module.accepts_media_types(media_types) {
            debug!(
                "Module {} does not accept {:?}, skipping {}",
                module.format_name(),
                media_types,
                ty
            );
            return Ok(());
        }
        self.walk(module, ty, from_package, path)
    }

    /// Registers a type the module found on its own, and everything reachable from it.
    pub fn register_element(
        &mut self,
        module: &mut dyn MediaTypeModule,
        ty: &TypeElement,
        path: &ContextPath<'_>,
    ) -> Result<()> {
        self.define(module, ty, path)
    }

    fn walk(
        &mut self,
        module: &mut dyn MediaTypeModule,
        ty: &TypeOccurrence,
        from_package: &str,
        path: &ContextPath<'_>,
    ) -> Result<()> {
        match ty {
            TypeOccurrence::Primitive(_) | TypeOccurrence::Variable(_) | TypeOccurrence::Void => {
                Ok(())
            }
            TypeOccurrence::Array(component) => self.walk(module, component, from_package, path),
            TypeOccurrence::Tuple(elements) => {
                for element in elements {
                    self.walk(module, element, from_package, path)?;
                }
                Ok(())
            }
            TypeOccurrence::Wildcard(wildcard) => {
                let extends = wildcard.extends_bound().map_err(|source| Error::Traversal {
                    path: path.render(),
                    source,
                })?;
                if let Some(bound) = extends {
                    self.walk(module, &bound, from_package, path)?;
                }
                let super_bound = wildcard.super_bound().map_err(|source| Error::Traversal {
                    path: path.render(),
                    source,
                })?;
                if let Some(bound) = super_bound {
                    self.walk(module, &bound, from_package, path)?;
                }
                Ok(())
            }
            TypeOccurrence::Declared(declared) => {
                for argument in &declared.type_arguments {
                    self.walk(module, argument, from_package, path)?;
                }
                if is_container(declared) {
                    return Ok(());
                }
                match self.model.resolve_type(&declared.path, from_package) {
                    Some(element) => self.define(module, element, path),
                    None => {
                        debug!("Type {} is not part of the program model", declared.erasure());
                        Ok(())
                    }
                }
            }
        }
    }

    fn define(
        &mut self,
        module: &mut dyn MediaTypeModule,
        ty: &TypeElement,
        path: &ContextPath<'_>,
    ) -> Result<()> {
        let visited = self.visited.entry(module.format_name()).or_default();
        if !visited.insert(ty.qualified_name().to_string()) {
            return Ok(());
        }
        debug!(
            "Defining {} data type {} (at {})",
            module.format_name(),
            ty.qualified_name(),
            path
        );

        let type_frame = Frame::DataType(ty.simple_name().to_string());
        let at_type = path.push(&type_frame);
        // Member types are written in the module declaring `ty`.
        let package = ty.element.package.as_str();
        for reference in module.define_data_type(ty, &at_type)? {
            let field_frame = Frame::Field(reference.member);
            self.walk(module, &reference.ty, package, &at_type.push(&field_frame))?;
        }
        Ok(())
    }
}
