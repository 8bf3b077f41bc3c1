//! Representation modules: one per wire format, each documenting the data types it can carry.

pub mod json;
pub mod xml;

use crate::config::DataTypeDetectionStrategy;
use crate::context::ContextPath;
use crate::decoration::TypeOccurrence;
use crate::element::TypeElement;
use crate::error::Result;
use crate::traversal::DataTypeTraversal;
use serde::Serialize;
use std::collections::BTreeSet;

/// Shape of a documented data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataTypeKind {
    Object,
    Enum,
}

/// How an XML member is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum XmlNode {
    Attribute,
    Element,
}

/// A documented member of a data type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    /// Name on the wire
    pub name: String,
    /// Wire type name, e.g. `integer`, `array<Widget>`
    #[serde(rename = "type")]
    pub type_name: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml_node: Option<XmlNode>,
}

/// A data type documented by one representation module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataType {
    pub name: String,
    pub qualified_name: String,
    pub kind: DataTypeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    /// Types whose members are inlined into this one
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flattened: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml_name: Option<String>,
}

/// A type referenced by a documented data type, to be walked next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReference {
    /// Member the reference came from, for diagnostics
    pub member: String,
    pub ty: TypeOccurrence,
}

/// A module understanding one wire format.
///
/// Modules never walk the type graph themselves; the [`DataTypeTraversal`] asks them to define
/// one type at a time and follows the references they return. A module is asked to define a
/// given type at most once per run.
pub trait MediaTypeModule {
    /// Short format name, e.g. `json`.
    fn format_name(&self) -> &'static str;

    /// Dependency hook: an endpoint module announces it will push data types to this module.
    fn set_default_detection_strategy(&mut self, strategy: DataTypeDetectionStrategy);

    /// Whether any of `media_types` is carried in this format.
    fn accepts_media_types(&self, media_types: &BTreeSet<String>) -> bool;

    /// Documents `ty` and returns the types its documented members reference.
    fn define_data_type(
        &mut self,
        ty: &TypeElement,
        path: &ContextPath<'_>,
    ) -> Result<Vec<TypeReference>>;

    /// Documents the types the module finds on its own, according to its detection strategy.
    fn detect_own(&mut self, traversal: &mut DataTypeTraversal<'_>) -> Result<()>;

    /// Documented data types, sorted by qualified name.
    fn data_types(&self) -> Vec<DataType>;
}

/// Strips media type parameters (`; charset=utf-8`) and case.
pub fn base_media_type(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Shared acceptance rule: wildcards, an exact listed type, or a structured-syntax suffix.
pub(crate) fn accepts_any(
    media_types: &BTreeSet<String>,
    exact: &[&str],
    suffix: &str,
) -> bool {
    if media_types.is_empty() {
        return true;
    }
    media_types.iter().any(|media_type| {
        let base = base_media_type(media_type);
        base == "*/*"
            || base == "application/*"
            || exact.contains(&base.as_str())
            || base.ends_with(suffix)
    })
}

/// Detection settings shared by the representation modules.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DetectionSettings {
    pub configured: Option<DataTypeDetectionStrategy>,
    pub pushed_default: Option<DataTypeDetectionStrategy>,
    pub has_included_roots: bool,
}

impl DetectionSettings {
    pub fn strategy(&self) -> DataTypeDetectionStrategy {
        DataTypeDetectionStrategy::resolve(
            self.configured,
            self.pushed_default,
            self.has_included_roots,
        )
    }
}

/// Lower-cases the first character (`WidgetList` → `widgetList`).
pub(crate) fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
