//! Resource classes in the `#[path]` style.
//!
//! A struct annotated `#[path("/widgets")]` is an endpoint; each of its methods carrying a verb
//! annotation (`#[get]`, `#[post]`, ..., or `#[http_method("PROPFIND")]`) is an operation.

use super::{
    build_operation, candidate_types, endpoint_label, media_types, wildcard_media_types,
    ApiProviderModule,
};
use crate::config::{ApiFlavor, ApiModuleConfig, DataTypeDetectionStrategy};
use crate::element::{MethodElement, TypeElement, VALUE};
use crate::endpoint::{join_paths, normalize_path, Endpoint, EntityParameter, HttpMethod, Operation};
use crate::error::Result;
use crate::module::{AnalysisModule, Capabilities, DependencySpec, MediaTypeDependencySpec};
use crate::registry::ApiContext;
use crate::source_model::ProgramModel;
use log::{debug, info, warn};
use std::collections::BTreeSet;

const VERBS: [(&str, HttpMethod); 7] = [
    ("get", HttpMethod::Get),
    ("post", HttpMethod::Post),
    ("put", HttpMethod::Put),
    ("delete", HttpMethod::Delete),
    ("patch", HttpMethod::Patch),
    ("head", HttpMethod::Head),
    ("options", HttpMethod::Options),
];

/// Annotations binding a parameter to something other than the request body.
const PARAMETER_BINDINGS: [&str; 8] = [
    "path_param",
    "query_param",
    "header_param",
    "cookie_param",
    "form_param",
    "matrix_param",
    "bean_param",
    "context",
];

pub struct JaxrsModule {
    configured: ApiModuleConfig,
    pushed_default: Option<DataTypeDetectionStrategy>,
    has_included_roots: bool,
    context: ApiContext,
}

impl JaxrsModule {
    pub fn new(config: &ApiModuleConfig, has_included_roots: bool) -> Self {
        Self {
            configured: config.clone(),
            pushed_default: None,
            has_included_roots,
            context: ApiContext::new(config.grouping, config.path_sort),
        }
    }

    fn endpoint(&self, model: &dyn ProgramModel, ty: &TypeElement, base: &str) -> Endpoint {
        let base_path = normalize_path(base);
        let consumes = media_types(
            ty.element.annotation("consumes"),
            VALUE,
            &wildcard_media_types(),
        );
        let produces = media_types(
            ty.element.annotation("produces"),
            VALUE,
            &wildcard_media_types(),
        );

        let operations = model
            .methods_of(ty, true)
            .iter()
            .filter_map(|method| self.operation(ty, method, &base_path, &consumes, &produces))
            .collect();

        Endpoint {
            element: ty.element.clone(),
            base_path,
            label: endpoint_label(&ty.element),
            operations,
        }
    }

    fn operation(
        &self,
        ty: &TypeElement,
        method: &MethodElement,
        base_path: &str,
        type_consumes: &BTreeSet<String>,
        type_produces: &BTreeSet<String>,
    ) -> Option<Operation> {
        let mut verbs: BTreeSet<HttpMethod> = VERBS
            .iter()
            .filter(|(name, _)| method.element.has_annotation(name))
            .map(|(_, verb)| verb.clone())
            .collect();
        if let Some(custom) = method.element.annotation("http_method") {
            verbs.extend(custom.values(VALUE).iter().map(|v| HttpMethod::parse(v)));
        }
        if verbs.is_empty() {
            debug!("{} has no HTTP method, not an operation", method.element.qualified_name);
            return None;
        }

        let sub_path = match method.element.annotation("path") {
            Some(path) if path.is_malformed() => {
                warn!(
                    "Skipping operation {}: malformed path",
                    method.element.qualified_name
                );
                return None;
            }
            Some(path) => path.value().unwrap_or_default(),
            None => "",
        };

        Some(build_operation(
            &ty.element,
            method,
            verbs,
            join_paths(base_path, sub_path),
            media_types(method.element.annotation("consumes"), VALUE, type_consumes),
            media_types(method.element.annotation("produces"), VALUE, type_produces),
            entity_parameter(method),
        ))
    }
}

/// The parameter marked `#[entity]`, else the first parameter without a binding annotation.
fn entity_parameter(method: &MethodElement) -> Option<EntityParameter> {
    let explicit = method
        .parameters
        .iter()
        .find(|p| p.element.has_annotation("entity"));
    let unbound: Vec<_> = method
        .parameters
        .iter()
        .filter(|p| {
            !PARAMETER_BINDINGS
                .iter()
                .any(|binding| p.element.has_annotation(binding))
        })
        .collect();
    if explicit.is_none() && unbound.len() > 1 {
        warn!(
            "{} has {} unannotated parameters, using the first as the request body",
            method.element.qualified_name,
            unbound.len()
        );
    }

    explicit
        .or_else(|| unbound.first().copied())
        .map(|parameter| EntityParameter {
            name: parameter.element.simple_name.clone(),
            ty: parameter.ty.clone(),
        })
}

impl ApiProviderModule for JaxrsModule {
    fn flavor(&self) -> ApiFlavor {
        ApiFlavor::Jaxrs
    }

    fn set_default_detection_strategy(&mut self, strategy: DataTypeDetectionStrategy) {
        self.pushed_default = Some(strategy);
    }

    fn detection_strategy(&self) -> DataTypeDetectionStrategy {
        DataTypeDetectionStrategy::resolve(
            self.configured.datatype_detection,
            self.pushed_default,
            self.has_included_roots,
        )
    }

    fn discover(&mut self, model: &dyn ProgramModel) -> Result<()> {
        let strategy = self.detection_strategy();
        let mut application_path: Option<String> = None;

        for ty in candidate_types(model, strategy) {
            if let Some(value) = ty
                .element
                .annotation("application_path")
                .and_then(|a| a.value())
            {
                debug!("Application path '{}' declared by {}", value, ty.qualified_name());
                application_path.get_or_insert_with(|| value.to_string());
            }

            if ty.element.has_annotation("provider") {
                self.context.add_provider(ty.element.clone());
            }

            if let Some(path) = ty.element.annotation("path") {
                if path.is_malformed() {
                    warn!("Skipping resource {}: malformed path", ty.qualified_name());
                    continue;
                }
                let base = path.value().unwrap_or_default().to_string();
                let endpoint = self.endpoint(model, ty, &base);
                self.context.add_endpoint(endpoint);
            }
        }

        let context_path = self
            .configured
            .application_path
            .clone()
            .or(application_path)
            .unwrap_or_default();
        self.context.set_context_path(&context_path);

        info!(
            "JAX-RS: {} endpoints, {} providers (detection: {:?})",
            self.context.endpoints().count(),
            self.context.providers().count(),
            strategy
        );
        Ok(())
    }

    fn context(&self) -> &ApiContext {
        &self.context
    }
}

impl AnalysisModule for JaxrsModule {
    fn name(&self) -> &'static str {
        ApiFlavor::Jaxrs.name()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            api_provider: true,
            media_types: false,
        }
    }

    fn dependency_specs(&self) -> Vec<Box<dyn DependencySpec>> {
        vec![Box::new(MediaTypeDependencySpec)]
    }

    fn as_api_provider(&mut self) -> Option<&mut dyn ApiProviderModule> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoration::{Decorate, TypeOccurrence};
    use crate::parser::ParsedFile;
    use crate::source_model::SourceModel;
    use pretty_assertions::assert_eq;

    fn discover(code: &str, config: ApiModuleConfig) -> JaxrsModule {
        let model = SourceModel::new(&[ParsedFile::from_source(&["api"], code).unwrap()]);
        let mut module = JaxrsModule::new(&config, false);
        module.discover(&model).unwrap();
        module
    }

    const WIDGETS: &str = r#"
        #[application_path("rest/")]
        pub struct WidgetApplication;

        #[path("/widgets/")]
        #[produces("application/json")]
        pub struct WidgetResource;

        impl WidgetResource {
            #[get]
            pub fn list(&self, #[query_param("page")] page: u32) -> Vec<Widget> { vec![] }

            #[get]
            #[path("/{id}")]
            #[produces("application/xml")]
            pub fn get(&self, #[path_param("id")] id: u64) -> Result<Widget, ApiError> { todo!() }

            #[post]
            #[consumes("application/json")]
            pub fn create(&self, widget: Widget) {}

            #[http_method("PROPFIND")]
            #[path("{id}/properties")]
            pub fn properties(&self, #[path_param("id")] id: u64, #[entity] query: Query, other: String) {}

            pub fn helper(&self) {}
        }

        #[provider]
        pub struct ErrorMapper;

        pub struct Widget { pub id: u64 }
    "#;

    #[test]
    fn test_discovers_endpoint_and_operations() {
        let module = discover(WIDGETS, ApiModuleConfig::default());
        let context = module.context();

        assert_eq!(context.context_path(), "/rest");
        let endpoints: Vec<&Endpoint> = context.endpoints().collect();
        assert_eq!(endpoints.len(), 1);
        let resource = endpoints[0];
        assert_eq!(resource.qualified_name(), "api::WidgetResource");
        assert_eq!(resource.base_path, "/widgets");

        let summary: Vec<(String, Vec<String>, String)> = resource
            .operations
            .iter()
            .map(|op| {
                (
                    op.name.clone(),
                    op.methods.iter().map(ToString::to_string).collect(),
                    op.path.clone(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("list".to_string(), vec!["GET".to_string()], "/widgets".to_string()),
                ("get".to_string(), vec!["GET".to_string()], "/widgets/{id}".to_string()),
                ("create".to_string(), vec!["POST".to_string()], "/widgets".to_string()),
                (
                    "properties".to_string(),
                    vec!["PROPFIND".to_string()],
                    "/widgets/{id}/properties".to_string()
                ),
            ]
        );

        let providers: Vec<&str> = context
            .providers()
            .map(|p| p.qualified_name.as_str())
            .collect();
        assert_eq!(providers, vec!["api::ErrorMapper"]);
    }

    #[test]
    fn test_media_types_and_entities() {
        let module = discover(WIDGETS, ApiModuleConfig::default());
        let resource = module.context().endpoints().next().unwrap();
        let op = |name: &str| resource.operations.iter().find(|o| o.name == name).unwrap();

        let list = op("list");
        assert_eq!(list.produces, BTreeSet::from(["application/json".to_string()]));
        assert_eq!(list.consumes, BTreeSet::from(["*/*".to_string()]));
        assert!(list.entity_parameter.is_none());

        let get = op("get");
        assert_eq!(get.produces, BTreeSet::from(["application/xml".to_string()]));
        let representation = get.representation.as_ref().unwrap().ty.decorate().unwrap();
        assert_eq!(representation.to_string(), "Widget");

        let create = op("create");
        assert_eq!(create.entity_parameter.as_ref().unwrap().name, "widget");
        assert!(create.representation.is_none());

        let properties = op("properties");
        assert_eq!(properties.entity_parameter.as_ref().unwrap().name, "query");
        assert!(matches!(
            properties.entity_parameter.as_ref().unwrap().ty.decorate().unwrap(),
            TypeOccurrence::Declared(_)
        ));
    }

    #[test]
    fn test_configured_context_path_wins() {
        let config = ApiModuleConfig {
            application_path: Some("/".to_string()),
            ..ApiModuleConfig::default()
        };
        let module = discover(WIDGETS, config);
        assert_eq!(module.context().context_path(), "");
    }

    #[test]
    fn test_malformed_method_path_skips_operation_only() {
        let module = discover(
            r#"
                #[path("/things")]
                pub struct ThingResource;
                impl ThingResource {
                    #[get]
                    #[path(1 + 2)]
                    pub fn broken(&self) {}
                    #[get]
                    pub fn list(&self) {}
                }
            "#,
            ApiModuleConfig::default(),
        );
        let resource = module.context().endpoints().next().unwrap();
        assert_eq!(resource.operations.len(), 1);
        assert_eq!(resource.operations[0].name, "list");
    }

    #[test]
    fn test_inherited_operations_from_trait() {
        let module = discover(
            r#"
                pub trait ThingApi {
                    #[get]
                    #[path("{id}")]
                    fn get(&self, #[path_param("id")] id: u64) -> Thing;
                }

                #[path("things")]
                pub struct ThingResource;

                impl ThingApi for ThingResource {
                    fn get(&self, id: u64) -> Thing { todo!() }
                }
            "#,
            ApiModuleConfig::default(),
        );
        let resource = module.context().endpoints().next().unwrap();
        assert_eq!(resource.operations.len(), 1);
        assert_eq!(resource.operations[0].path, "/things/{id}");
        assert!(resource.operations[0].entity_parameter.is_none());
    }

    #[test]
    fn test_passive_discovers_nothing() {
        let config = ApiModuleConfig {
            datatype_detection: Some(DataTypeDetectionStrategy::Passive),
            ..ApiModuleConfig::default()
        };
        let module = discover(WIDGETS, config);
        assert!(module.context().is_empty());
    }

    #[test]
    fn test_grouping_annotations_and_facets() {
        let module = discover(
            r#"
                #[path("/a")]
                #[resource_group("Alpha")]
                #[facet("internal")]
                #[label("Things")]
                pub struct ThingResource;
                impl ThingResource {
                    #[get]
                    #[facet("beta")]
                    pub fn one(&self) {}
                    #[get]
                    #[path("two")]
                    #[resource_group("Beta")]
                    pub fn two(&self) {}
                }
            "#,
            ApiModuleConfig::default(),
        );
        let resource = module.context().endpoints().next().unwrap();
        assert_eq!(resource.label.as_deref(), Some("Things"));
        assert_eq!(resource.operations[0].resource_group.as_deref(), Some("Alpha"));
        assert_eq!(
            resource.operations[0].facets,
            BTreeSet::from(["beta".to_string(), "internal".to_string()])
        );
        assert_eq!(resource.operations[1].resource_group.as_deref(), Some("Beta"));
    }
}
