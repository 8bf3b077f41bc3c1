//! Endpoint-discovering modules, one per API flavor.

pub mod jaxrs;
pub mod spring_web;

use crate::config::{ApiFlavor, DataTypeDetectionStrategy};
use crate::element::{Annotation, Element, MethodElement, TypeElement, VALUE};
use crate::endpoint::{EntityParameter, HttpMethod, Operation, RepresentationMetadata, WILDCARD_MEDIA_TYPE};
use crate::error::Result;
use crate::registry::ApiContext;
use crate::source_model::ProgramModel;
use std::collections::BTreeSet;

/// A module that discovers endpoints and providers of one API flavor.
pub trait ApiProviderModule {
    fn flavor(&self) -> ApiFlavor;

    /// Dependency hook, same contract as for media type modules.
    fn set_default_detection_strategy(&mut self, strategy: DataTypeDetectionStrategy);

    fn detection_strategy(&self) -> DataTypeDetectionStrategy;

    /// Fills the module's context from the program model.
    ///
    /// A malformed path on one operation skips that operation only.
    fn discover(&mut self, model: &dyn ProgramModel) -> Result<()>;

    fn context(&self) -> &ApiContext;
}

/// Types a module with the given strategy starts from.
pub(crate) fn candidate_types(
    model: &dyn ProgramModel,
    strategy: DataTypeDetectionStrategy,
) -> Vec<&TypeElement> {
    match strategy {
        DataTypeDetectionStrategy::Passive => Vec::new(),
        DataTypeDetectionStrategy::Local => model.api_elements(true),
        DataTypeDetectionStrategy::Aggressive => model.api_elements(false),
    }
}

/// Media types listed under `key`, or `fallback` when none are. A single value may list several
/// types separated by commas.
pub(crate) fn media_types(
    annotation: Option<&Annotation>,
    key: &str,
    fallback: &BTreeSet<String>,
) -> BTreeSet<String> {
    let declared: BTreeSet<String> = annotation
        .map(|a| a.values(key))
        .unwrap_or_default()
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();
    if declared.is_empty() {
        fallback.clone()
    } else {
        declared
    }
}

pub(crate) fn wildcard_media_types() -> BTreeSet<String> {
    BTreeSet::from([WILDCARD_MEDIA_TYPE.to_string()])
}

/// Path values of a mapping annotation, under `value` or `path`.
pub(crate) fn mapping_paths(annotation: &Annotation) -> Vec<String> {
    annotation
        .values(VALUE)
        .iter()
        .chain(annotation.values("path"))
        .cloned()
        .collect()
}

/// Assembles an operation from the parts every flavor shares.
pub(crate) fn build_operation(
    endpoint: &Element,
    method: &MethodElement,
    methods: BTreeSet<HttpMethod>,
    path: String,
    consumes: BTreeSet<String>,
    produces: BTreeSet<String>,
    entity_parameter: Option<EntityParameter>,
) -> Operation {
    let resource_group = method
        .element
        .annotation("resource_group")
        .and_then(Annotation::value)
        .or_else(|| {
            endpoint
                .annotation("resource_group")
                .and_then(Annotation::value)
        })
        .map(str::to_string);

    let facets = [endpoint.annotation("facet"), method.element.annotation("facet")]
        .into_iter()
        .flatten()
        .flat_map(|facet| facet.values(VALUE).iter().cloned())
        .collect();

    Operation {
        name: method.element.simple_name.clone(),
        qualified_name: method.element.qualified_name.clone(),
        endpoint: endpoint.qualified_name.clone(),
        methods,
        path,
        consumes,
        produces,
        entity_parameter,
        representation: RepresentationMetadata::from_return_type(method.return_type.as_ref()),
        resource_group,
        facets,
    }
}

/// Label override of an endpoint, from `#[label("...")]`.
pub(crate) fn endpoint_label(element: &Element) -> Option<String> {
    element
        .annotation("label")
        .and_then(Annotation::value)
        .map(str::to_string)
}
