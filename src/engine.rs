//! Runs the analysis modules over a program model and assembles the produced [`ApiModel`].

use crate::api::jaxrs::JaxrsModule;
use crate::api::spring_web::SpringWebModule;
use crate::config::{AnalysisConfig, ApiFlavor, GroupingStrategy, PathSortStrategy};
use crate::detector::DetectionResult;
use crate::endpoint::{Endpoint, HttpMethod};
use crate::error::Result;
use crate::grouping::{group_operations, type_name, ConfiguredFacetFilter, ResourceGroup};
use crate::module::{resolve_dependencies, AnalysisModule};
use crate::registry::ApiContext;
use crate::representation::json::JsonModule;
use crate::representation::xml::XmlModule;
use crate::representation::{DataType, MediaTypeModule};
use crate::source_model::ProgramModel;
use crate::traversal::DataTypeTraversal;
use log::{debug, info};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Everything the analysis produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiModel {
    /// One entry per flavor that found at least one endpoint or provider
    pub resource_apis: Vec<ResourceApi>,
    /// Documented data types by representation module name, sorted by qualified name
    pub data_types: BTreeMap<String, Vec<DataType>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceApi {
    pub name: String,
    pub context_path: String,
    pub grouping_strategy: GroupingStrategy,
    pub path_sort: PathSortStrategy,
    pub endpoints: Vec<EndpointSummary>,
    pub providers: Vec<String>,
    pub resource_groups: Vec<ResourceGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointSummary {
    pub name: String,
    pub qualified_name: String,
    pub base_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub operations: Vec<OperationSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationSummary {
    pub name: String,
    pub methods: BTreeSet<HttpMethod>,
    pub path: String,
    pub consumes: BTreeSet<String>,
    pub produces: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_parameter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representation: Option<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub facets: BTreeSet<String>,
}

impl From<&Endpoint> for EndpointSummary {
    fn from(endpoint: &Endpoint) -> Self {
        EndpointSummary {
            name: endpoint.simple_name().to_string(),
            qualified_name: endpoint.qualified_name().to_string(),
            base_path: endpoint.base_path.clone(),
            label: endpoint.label.clone(),
            operations: endpoint
                .operations
                .iter()
                .map(|operation| OperationSummary {
                    name: operation.name.clone(),
                    methods: operation.methods.clone(),
                    path: operation.path.clone(),
                    consumes: operation.consumes.clone(),
                    produces: operation.produces.clone(),
                    entity_parameter: operation
                        .entity_parameter
                        .as_ref()
                        .and_then(|entity| type_name(&entity.ty)),
                    representation: operation
                        .representation
                        .as_ref()
                        .and_then(|representation| type_name(&representation.ty)),
                    facets: operation.facets.clone(),
                })
                .collect(),
        }
    }
}

/// Builds the module set: enabled API flavors first, then representation modules.
///
/// A flavor without an explicit `enabled` setting runs only when it was detected.
pub fn build_modules(
    config: &AnalysisConfig,
    detected: &DetectionResult,
) -> Vec<Box<dyn AnalysisModule>> {
    let has_included_roots = !config.include_paths.is_empty();
    let mut modules: Vec<Box<dyn AnalysisModule>> = Vec::new();

    for flavor in ApiFlavor::ALL {
        let module_config = config.api_module(flavor);
        let enabled = module_config
            .enabled
            .unwrap_or_else(|| detected.contains(flavor));
        if !enabled {
            debug!("API flavor {} is disabled", flavor.name());
            continue;
        }
        modules.push(match flavor {
            ApiFlavor::Jaxrs => Box::new(JaxrsModule::new(module_config, has_included_roots)),
            ApiFlavor::SpringWeb => {
                Box::new(SpringWebModule::new(module_config, has_included_roots))
            }
        });
    }

    if config.json.enabled {
        modules.push(Box::new(JsonModule::new(
            config.json.datatype_detection,
            has_included_roots,
        )));
    }
    if config.xml.enabled {
        modules.push(Box::new(XmlModule::new(
            config.xml.datatype_detection,
            has_included_roots,
        )));
    }
    modules
}

/// Runs a full analysis of `model`.
pub fn analyze(
    config: &AnalysisConfig,
    model: &dyn ProgramModel,
    detected: &DetectionResult,
) -> Result<ApiModel> {
    let modules = build_modules(config, detected);
    run_modules(config, model, modules)
}

/// Runs an already built module set: resolves dependencies, lets each API provider discover
/// its endpoints and push their data types to its collaborators, then lets representation
/// modules detect their own types.
pub fn run_modules(
    config: &AnalysisConfig,
    model: &dyn ProgramModel,
    mut modules: Vec<Box<dyn AnalysisModule>>,
) -> Result<ApiModel> {
    let names: Vec<&str> = modules.iter().map(|m| m.name()).collect();
    info!("Running modules: {}", names.join(", "));

    let wiring = resolve_dependencies(&mut modules)?;
    for (dependent, dependency) in wiring.pairs() {
        debug!("{} -> {}", dependent, dependency);
    }

    let mut traversal = DataTypeTraversal::new(model);

    for index in 0..modules.len() {
        if modules[index].as_api_provider().is_none() {
            continue;
        }
        let dependencies = wiring.dependencies_of(index);

        let mut provider = None;
        let mut collaborators: Vec<&mut dyn MediaTypeModule> = Vec::new();
        for (position, module) in modules.iter_mut().enumerate() {
            if position == index {
                provider = module.as_api_provider();
            } else if dependencies.contains(&position) {
                if let Some(media) = module.as_media_type_module() {
                    collaborators.push(media);
                }
            }
        }

        if let Some(provider) = provider {
            provider.discover(model)?;
            traversal.traverse_context(provider.context(), &mut collaborators)?;
        }
    }

    for module in modules.iter_mut() {
        if let Some(media) = module.as_media_type_module() {
            media.detect_own(&mut traversal)?;
        }
    }

    let filter = ConfiguredFacetFilter::new(&config.facets);
    let mut resource_apis = Vec::new();
    let mut data_types = BTreeMap::new();

    for module in modules.iter_mut() {
        let name = module.name();
        if let Some(provider) = module.as_api_provider() {
            let context = provider.context();
            if context.is_empty() {
                debug!("{} found nothing, leaving it out of the model", name);
            } else {
                resource_apis.push(resource_api(name, context, &filter));
            }
        }
        if let Some(media) = module.as_media_type_module() {
            data_types.insert(media.format_name().to_string(), media.data_types());
        }
    }

    info!(
        "Analysis produced {} resource APIs and {} data types",
        resource_apis.len(),
        data_types.values().map(Vec::len).sum::<usize>()
    );
    Ok(ApiModel {
        resource_apis,
        data_types,
    })
}

fn resource_api(name: &str, context: &ApiContext, filter: &ConfiguredFacetFilter) -> ResourceApi {
    ResourceApi {
        name: name.to_string(),
        context_path: context.context_path().to_string(),
        grouping_strategy: context.grouping,
        path_sort: context.path_sort,
        endpoints: context.endpoints().map(EndpointSummary::from).collect(),
        providers: context
            .providers()
            .map(|provider| provider.qualified_name.clone())
            .collect(),
        resource_groups: group_operations(context, filter),
    }
}
