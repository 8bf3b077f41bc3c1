use super::{
    accepts_any, lower_first, DataType, DataTypeKind, DetectionSettings, MediaTypeModule, Member,
    TypeReference, XmlNode,
};
use crate::config::DataTypeDetectionStrategy;
use crate::context::ContextPath;
use crate::decoration::{DeclaredType, PrimitiveType, TypeOccurrence, TypeVisitor, WildcardType};
use crate::element::{TypeElement, TypeShape};
use crate::error::Result;
use crate::module::{AnalysisModule, ApiProviderDependencySpec, Capabilities, DependencySpec};
use crate::traversal::DataTypeTraversal;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

const ACCEPTED: [&str; 2] = ["application/xml", "text/xml"];
const ROOT_ELEMENT: &str = "xml_root_element";

/// Documents types as XML elements.
///
/// The element name comes from `#[xml_root_element(name = "...")]`, defaulting to the simple
/// name with a lower-case first letter. Fields marked `#[xml_attribute]` become attributes.
#[derive(Debug, Default)]
pub struct XmlModule {
    settings: DetectionSettings,
    data_types: BTreeMap<String, DataType>,
}

impl XmlModule {
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
}

fn element_name(ty: &TypeElement) -> String {
    ty.element
        .annotation(ROOT_ELEMENT)
        .and_then(|root| root.get("name").or_else(|| root.value()))
        .map(str::to_string)
        .unwrap_or_else(|| lower_first(ty.simple_name()))
}

impl MediaTypeModule for XmlModule {
    fn format_name(&self) -> &'static str {
        "xml"
    }

    fn set_default_detection_strategy(&mut self, strategy: DataTypeDetectionStrategy) {
        self.settings.pushed_default = Some(strategy);
    }

    fn accepts_media_types(&self, media_types: &BTreeSet<String>) -> bool {
        accepts_any(media_types, &ACCEPTED, "+xml")
    }

    fn define_data_type(
        &mut self,
        ty: &TypeElement,
        path: &ContextPath<'_>,
    ) -> Result<Vec<TypeReference>> {
        let mut members = Vec::new();
        let mut references = Vec::new();

        for field in &ty.fields {
            if field.element.has_annotation("xml_transient") {
                debug!("Skipping transient field {}", field.element.qualified_name);
                continue;
            }
            let occurrence = path.decorate(&field.ty)?;

            if ty.shape == TypeShape::Struct {
                let (name, node) = match field.element.annotation("xml_attribute") {
                    Some(attribute) => (
                        attribute.get("name").or_else(|| attribute.value()),
                        XmlNode::Attribute,
                    ),
                    None => (
                        field
                            .element
                            .annotation("xml_element")
                            .and_then(|element| element.get("name").or_else(|| element.value())),
                        XmlNode::Element,
                    ),
                };
                members.push(Member {
                    name: name
                        .map(str::to_string)
                        .unwrap_or_else(|| field.element.simple_name.clone()),
                    type_name: occurrence.accept(&mut XmlTypeName),
                    required: !matches!(
                        &occurrence,
                        TypeOccurrence::Declared(d) if d.simple_name() == "Option"
                    ),
                    xml_node: Some(node),
                });
            }

            references.push(TypeReference {
                member: field.element.simple_name.clone(),
                ty: occurrence,
            });
        }

        let data_type = DataType {
            name: ty.simple_name().to_string(),
            qualified_name: ty.qualified_name().to_string(),
            kind: match ty.shape {
                TypeShape::Struct => DataTypeKind::Object,
                TypeShape::Enum => DataTypeKind::Enum,
            },
            members,
            values: ty.variants.clone(),
            flattened: Vec::new(),
            xml_name: Some(element_name(ty)),
        };
        self.data_types
            .insert(data_type.qualified_name.clone(), data_type);
        Ok(references)
    }

    fn detect_own(&mut self, traversal: &mut DataTypeTraversal<'_>) -> Result<()> {
        let strategy = self.detection_strategy();
        if strategy == DataTypeDetectionStrategy::Passive {
            debug!("XML module is passive, documenting pushed types only");
            return Ok(());
        }

        let local_only = strategy == DataTypeDetectionStrategy::Local;
        let root = ContextPath::root();
        for element in traversal.model().api_elements(local_only) {
            if element.element.has_annotation(ROOT_ELEMENT) {
                traversal.register_element(self, element, &root)?;
            }
        }
        info!("XML module documents {} data types", self.data_types.len());
        Ok(())
    }

    fn data_types(&self) -> Vec<DataType> {
        self.data_types.values().cloned().collect()
    }
}

impl AnalysisModule for XmlModule {
    fn name(&self) -> &'static str {
        "xml"
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

/// Maps a decorated type to an XML Schema type name.
struct XmlTypeName;

impl TypeVisitor for XmlTypeName {
    type Output = String;

    fn visit_primitive(&mut self, primitive: PrimitiveType) -> String {
        match primitive {
            PrimitiveType::String | PrimitiveType::Char => "xs:string",
            PrimitiveType::I8 => "xs:byte",
            PrimitiveType::I16 => "xs:short",
            PrimitiveType::I32 => "xs:int",
            PrimitiveType::I64 | PrimitiveType::Isize => "xs:long",
            PrimitiveType::I128 => "xs:integer",
            PrimitiveType::U8 => "xs:unsignedByte",
            PrimitiveType::U16 => "xs:unsignedShort",
            PrimitiveType::U32 => "xs:unsignedInt",
            PrimitiveType::U64 | PrimitiveType::Usize => "xs:unsignedLong",
            PrimitiveType::U128 => "xs:nonNegativeInteger",
            PrimitiveType::F32 => "xs:float",
            PrimitiveType::F64 => "xs:double",
            PrimitiveType::Bool => "xs:boolean",
        }
        .to_string()
    }

    fn visit_declared(&mut self, declared: &DeclaredType) -> String {
        let first = declared.type_arguments.first();
        match declared.simple_name() {
            "Vec" | "VecDeque" | "HashSet" | "BTreeSet" => match first {
                Some(item) => format!("list<{}>", item.accept(self)),
                None => "list".to_string(),
            },
            "HashMap" | "BTreeMap" => "map".to_string(),
            "Option" | "Box" | "Rc" | "Arc" | "Cow" => match first {
                Some(inner) => inner.accept(self),
                None => "xs:anyType".to_string(),
            },
            name => lower_first(name),
        }
    }

    fn visit_array(&mut self, component: &TypeOccurrence) -> String {
        if component == &TypeOccurrence::Primitive(PrimitiveType::U8) {
            return "xs:base64Binary".to_string();
        }
        format!("list<{}>", component.accept(self))
    }

    fn visit_tuple(&mut self, _elements: &[TypeOccurrence]) -> String {
        "list<xs:anyType>".to_string()
    }

    fn visit_wildcard(&mut self, wildcard: &WildcardType) -> String {
        match wildcard.extends_bound() {
            Ok(Some(bound)) => bound.accept(self),
            _ => "xs:anyType".to_string(),
        }
    }

    fn visit_variable(&mut self, _name: &str) -> String {
        "xs:anyType".to_string()
    }

    fn visit_void(&mut self) -> String {
        "xs:anyType".to_string()
    }
}
