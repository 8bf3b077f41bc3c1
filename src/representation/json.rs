use super::{
    accepts_any, DataType, DataTypeKind, DetectionSettings, MediaTypeModule, Member,
    TypeReference,
};
use crate::config::DataTypeDetectionStrategy;
use crate::context::ContextPath;
use crate::decoration::{DeclaredType, PrimitiveType, TypeOccurrence, TypeVisitor, WildcardType};
use crate::element::{FieldElement, TypeElement, TypeShape};
use crate::error::Result;
use crate::module::{AnalysisModule, ApiProviderDependencySpec, Capabilities, DependencySpec};
use crate::traversal::DataTypeTraversal;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

const ACCEPTED: [&str; 2] = ["application/json", "text/json"];

/// Documents serde-serializable types as JSON.
#[derive(Debug, Default)]
pub struct JsonModule {
    settings: DetectionSettings,
    data_types: BTreeMap<String, DataType>,
}

impl JsonModule {
    pub fn new(
        configured: Option<DataTypeDetectionStrategy>,
        has_included_roots: bool,
    ) -> Self {
        Self {
            settings: DetectionSettings {
                configured,
                pushed_default: None,
                has_included_roots,
            },
            data_types: BTreeMap::new(),
        }
    }

    pub fn detection_strategy(&self) -> DataTypeDetectionStrategy {
        self.settings.strategy()
    }

    fn define_object(
        &self,
        ty: &TypeElement,
        path: &ContextPath<'_>,
        data_type: &mut DataType,
    ) -> Result<Vec<TypeReference>> {
        let rename_all = serde_value(ty, "rename_all");
        let mut references = Vec::new();

        for field in &ty.fields {
            let serde = field.element.annotation("serde");
            if serde.map(|s| s.has_key("skip")).unwrap_or(false) {
                debug!("Skipping field {}", field.element.qualified_name);
                continue;
            }
            let occurrence = path.decorate(&field.ty)?;

            if serde.map(|s| s.has_key("flatten")).unwrap_or(false) {
                data_type.flattened.push(occurrence.accept(&mut JsonTypeName));
            } else {
                data_type.members.push(Member {
                    name: wire_name(field, rename_all.as_deref()),
                    type_name: occurrence.accept(&mut JsonTypeName),
                    required: is_required(field, &occurrence),
                    xml_node: None,
                });
            }

            references.push(TypeReference {
                member: field.element.simple_name.clone(),
                ty: occurrence,
            });
        }
        Ok(references)
    }

    fn define_enum(
        &self,
        ty: &TypeElement,
        path: &ContextPath<'_>,
        data_type: &mut DataType,
    ) -> Result<Vec<TypeReference>> {
        let rename_all = serde_value(ty, "rename_all");
        data_type.values = ty
            .variants
            .iter()
            .map(|variant| match rename_all.as_deref() {
                Some(rule) => apply_rename_rule(rule, &pascal_to_snake(variant)),
                None => variant.clone(),
            })
            .collect();

        // Variant payloads are not members, but the types they carry are still reachable.
        ty.fields
            .iter()
            .map(|field| {
                Ok(TypeReference {
                    member: field.element.simple_name.clone(),
                    ty: path.decorate(&field.ty)?,
                })
            })
            .collect()
    }
}

impl MediaTypeModule for JsonModule {
    fn format_name(&self) -> &'static str {
        "json"
    }

    fn set_default_detection_strategy(&mut self, strategy: DataTypeDetectionStrategy) {
        self.settings.pushed_default = Some(strategy);
    }

    fn accepts_media_types(&self, media_types: &BTreeSet<String>) -> bool {
        accepts_any(media_types, &ACCEPTED, "+json")
    }

    fn define_data_type(
        &mut self,
        ty: &TypeElement,
        path: &ContextPath<'_>,
    ) -> Result<Vec<TypeReference>> {
        let mut data_type = DataType {
            name: serde_value(ty, "rename").unwrap_or_else(|| ty.simple_name().to_string()),
            qualified_name: ty.qualified_name().to_string(),
            kind: match ty.shape {
                TypeShape::Struct => DataTypeKind::Object,
                TypeShape::Enum => DataTypeKind::Enum,
            },
            members: Vec::new(),
            values: Vec::new(),
            flattened: Vec::new(),
            xml_name: None,
        };

        let references = match ty.shape {
            TypeShape::Struct => self.define_object(ty, path, &mut data_type)?,
            TypeShape::Enum => self.define_enum(ty, path, &mut data_type)?,
        };

        self.data_types
            .insert(data_type.qualified_name.clone(), data_type);
        Ok(references)
    }

    fn detect_own(&mut self, traversal: &mut DataTypeTraversal<'_>) -> Result<()> {
        let strategy = self.detection_strategy();
        if strategy == DataTypeDetectionStrategy::Passive {
            debug!("JSON module is passive, documenting pushed types only");
            return Ok(());
        }

        let local_only = strategy == DataTypeDetectionStrategy::Local;
        let root = ContextPath::root();
        for element in traversal.model().api_elements(local_only) {
            if element.element.derives("Serialize") || element.element.derives("Deserialize") {
                traversal.register_element(self, element, &root)?;
            }
        }
        info!("JSON module documents {} data types", self.data_types.len());
        Ok(())
    }

    fn data_types(&self) -> Vec<DataType> {
        self.data_types.values().cloned().collect()
    }
}

impl AnalysisModule for JsonModule {
    fn name(&self) -> &'static str {
        "json"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            api_provider: false,
            media_types: true,
        }
    }

    fn dependency_specs(&self) -> Vec<Box<dyn DependencySpec>> {
        vec![Box::new(ApiProviderDependencySpec)]
    }

    fn as_media_type_module(&mut self) -> Option<&mut dyn MediaTypeModule> {
        Some(self)
    }
}

/// Maps a decorated type to its JSON type name.
pub struct JsonTypeName;

impl TypeVisitor for JsonTypeName {
    type Output = String;

    fn visit_primitive(&mut self, primitive: PrimitiveType) -> String {
        match primitive {
            PrimitiveType::String | PrimitiveType::Char => "string",
            PrimitiveType::F32 | PrimitiveType::F64 => "number",
            PrimitiveType::Bool => "boolean",
            _ => "integer",
        }
        .to_string()
    }

    fn visit_declared(&mut self, declared: &DeclaredType) -> String {
        let argument = |index: usize| {
            declared
                .type_arguments
                .get(index)
                .map(|arg| arg.accept(&mut JsonTypeName))
                .unwrap_or_else(|| "any".to_string())
        };
        match declared.simple_name() {
            "Vec" | "VecDeque" | "HashSet" | "BTreeSet" => format!("array<{}>", argument(0)),
            "HashMap" | "BTreeMap" => format!("map<{}>", argument(1)),
            "Option" | "Box" | "Rc" | "Arc" | "Cow" => argument(0),
            name => name.to_string(),
        }
    }

    fn visit_array(&mut self, component: &TypeOccurrence) -> String {
        format!("array<{}>", component.accept(self))
    }

    fn visit_tuple(&mut self, elements: &[TypeOccurrence]) -> String {
        let elements: Vec<String> = elements.iter().map(|e| e.accept(&mut JsonTypeName)).collect();
        format!("tuple<{}>", elements.join(", "))
    }

    fn visit_wildcard(&mut self, wildcard: &WildcardType) -> String {
        match wildcard.extends_bound() {
            Ok(Some(bound)) => bound.accept(self),
            _ => "any".to_string(),
        }
    }

    fn visit_variable(&mut self, _name: &str) -> String {
        "any".to_string()
    }

    fn visit_void(&mut self) -> String {
        "null".to_string()
    }
}

fn serde_value(ty: &TypeElement, key: &str) -> Option<String> {
    ty.element
        .annotation("serde")
        .and_then(|serde| serde.get(key))
        .map(str::to_string)
}

fn wire_name(field: &FieldElement, rename_all: Option<&str>) -> String {
    if let Some(rename) = field
        .element
        .annotation("serde")
        .and_then(|serde| serde.get("rename"))
    {
        return rename.to_string();
    }
    match rename_all {
        Some(rule) => apply_rename_rule(rule, &field.element.simple_name),
        None => field.element.simple_name.clone(),
    }
}

fn is_required(field: &FieldElement, occurrence: &TypeOccurrence) -> bool {
    let optional = matches!(occurrence, TypeOccurrence::Declared(d) if d.simple_name() == "Option");
    let defaulted = field
        .element
        .annotation("serde")
        .map(|serde| serde.has_key("default"))
        .unwrap_or(false);
    !optional && !defaulted
}

fn pascal_to_snake(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            snake.push('_');
        }
        snake.extend(c.to_lowercase());
    }
    snake
}

/// Applies a serde `rename_all` rule to a snake_case name.
fn apply_rename_rule(rule: &str, snake: &str) -> String {
    let words: Vec<&str> = snake.split('_').filter(|w| !w.is_empty()).collect();
    let capitalize = |word: &str| {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        }
    };
    match rule {
        "lowercase" => words.concat(),
        "UPPERCASE" => words.concat().to_uppercase(),
        "PascalCase" => words.iter().map(|w| capitalize(w)).collect(),
        "camelCase" => words
            .iter()
            .enumerate()
            .map(|(i, w)| if i == 0 { w.to_string() } else { capitalize(w) })
            .collect(),
        "kebab-case" => words.join("-"),
        "SCREAMING_SNAKE_CASE" => words.join("_").to_uppercase(),
        "SCREAMING-KEBAB-CASE" => words.join("-").to_uppercase(),
        _ => words.join("_"),
    }
}
