//! Controllers in the `#[controller]` / `#[request_mapping]` style.

use super::{
    build_operation, candidate_types, endpoint_label, mapping_paths, media_types,
    wildcard_media_types, ApiProviderModule,
};
use crate::config::{ApiFlavor, ApiModuleConfig, DataTypeDetectionStrategy};
use crate::element::{Annotation, MethodElement, TypeElement};
use crate::endpoint::{join_paths, normalize_path, Endpoint, EntityParameter, HttpMethod, Operation};
use crate::error::Result;
use crate::module::{AnalysisModule, Capabilities, DependencySpec, MediaTypeDependencySpec};
use crate::registry::ApiContext;
use crate::source_model::ProgramModel;
use log::{debug, info, warn};
use std::collections::BTreeSet;

const CONTROLLERS: [&str; 2] = ["controller", "rest_controller"];
const ADVICE: [&str; 2] = ["controller_advice", "rest_controller_advice"];
const REQUEST_MAPPING: &str = "request_mapping";

const SHORTCUTS: [(&str, HttpMethod); 5] = [
    ("get_mapping", HttpMethod::Get),
    ("post_mapping", HttpMethod::Post),
    ("put_mapping", HttpMethod::Put),
    ("delete_mapping", HttpMethod::Delete),
    ("patch_mapping", HttpMethod::Patch),
];

/// Methods covered by a `#[request_mapping]` that names none.
const UNRESTRICTED: [HttpMethod; 5] = [
    HttpMethod::Get,
    HttpMethod::Post,
    HttpMethod::Put,
    HttpMethod::Delete,
    HttpMethod::Patch,
];

pub struct SpringWebModule {
    configured: ApiModuleConfig,
    pushed_default: Option<DataTypeDetectionStrategy>,
    has_included_roots: bool,
    context: ApiContext,
}

struct MethodMapping<'a> {
    annotation: &'a Annotation,
    methods: BTreeSet<HttpMethod>,
}

impl SpringWebModule {
    pub fn new(config: &ApiModuleConfig, has_included_roots: bool) -> Self {
        Self {
            configured: config.clone(),
            pushed_default: None,
            has_included_roots,
            context: ApiContext::new(config.grouping, config.path_sort),
        }
    }

    fn endpoint(&self, model: &dyn ProgramModel, ty: &TypeElement) -> Option<Endpoint> {
        let mapping = ty.element.annotation(REQUEST_MAPPING);
        if mapping.map(Annotation::is_malformed).unwrap_or(false) {
            warn!("Skipping controller {}: malformed request mapping", ty.qualified_name());
            return None;
        }

        let mut base_paths = mapping.map(mapping_paths).unwrap_or_default();
        if base_paths.is_empty() {
            base_paths.push(String::new());
        }
        let consumes = media_types(mapping, "consumes", &wildcard_media_types());
        let produces = media_types(mapping, "produces", &wildcard_media_types());

        let mut operations = Vec::new();
        for method in model.methods_of(ty, true) {
            operations.extend(self.operations(ty, &method, &base_paths, &consumes, &produces));
        }

        Some(Endpoint {
            element: ty.element.clone(),
            base_path: normalize_path(&base_paths[0]),
            label: endpoint_label(&ty.element),
            operations,
        })
    }

    /// One operation per (base path, method path) combination.
    fn operations(
        &self,
        ty: &TypeElement,
        method: &MethodElement,
        base_paths: &[String],
        type_consumes: &BTreeSet<String>,
        type_produces: &BTreeSet<String>,
    ) -> Vec<Operation> {
        let Some(mapping) = method_mapping(method) else {
            return Vec::new();
        };
        if mapping.annotation.is_malformed() {
            warn!(
                "Skipping operation {}: malformed mapping",
                method.element.qualified_name
            );
            return Vec::new();
        }

        let mut method_paths = mapping_paths(mapping.annotation);
        if method_paths.is_empty() {
            method_paths.push(String::new());
        }
        let consumes = media_types(Some(mapping.annotation), "consumes", type_consumes);
        let produces = media_types(Some(mapping.annotation), "produces", type_produces);
        let entity = entity_parameter(method);

        let mut operations = Vec::new();
        for base in base_paths {
            for sub_path in &method_paths {
                operations.push(build_operation(
                    &ty.element,
                    method,
                    mapping.methods.clone(),
                    join_paths(base, sub_path),
                    consumes.clone(),
                    produces.clone(),
                    entity.clone(),
                ));
            }
        }
        operations
    }
}

fn method_mapping(method: &MethodElement) -> Option<MethodMapping<'_>> {
    if let Some(annotation) = method.element.annotation(REQUEST_MAPPING) {
        let mut methods: BTreeSet<HttpMethod> = annotation
            .values("method")
            .iter()
            .map(|m| HttpMethod::parse(m))
            .collect();
        if methods.is_empty() {
            methods.extend(UNRESTRICTED.iter().cloned());
        }
        return Some(MethodMapping {
            annotation,
            methods,
        });
    }

    SHORTCUTS.iter().find_map(|(name, verb)| {
        method.element.annotation(name).map(|annotation| MethodMapping {
            annotation,
            methods: BTreeSet::from([verb.clone()]),
        })
    })
}

fn entity_parameter(method: &MethodElement) -> Option<EntityParameter> {
    method
        .parameters
        .iter()
        .find(|p| p.element.has_annotation("request_body"))
        .map(|parameter| EntityParameter {
            name: parameter.element.simple_name.clone(),
            ty: parameter.ty.clone(),
        })
}

impl ApiProviderModule for SpringWebModule {
    fn flavor(&self) -> ApiFlavor {
        ApiFlavor::SpringWeb
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

        for ty in candidate_types(model, strategy) {
            if ADVICE.iter().any(|marker| ty.element.has_annotation(marker)) {
                self.context.add_provider(ty.element.clone());
            }
            if CONTROLLERS.iter().any(|marker| ty.element.has_annotation(marker)) {
                debug!("Found controller {}", ty.qualified_name());
                if let Some(endpoint) = self.endpoint(model, ty) {
                    self.context.add_endpoint(endpoint);
                }
            }
        }

        let context_path = self.configured.application_path.clone().unwrap_or_default();
        self.context.set_context_path(&context_path);

        info!(
            "Spring Web: {} controllers, {} advice (detection: {:?})",
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

impl AnalysisModule for SpringWebModule {
    fn name(&self) -> &'static str {
        ApiFlavor::SpringWeb.name()
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
    use crate::parser::ParsedFile;
    use crate::source_model::SourceModel;
    use pretty_assertions::assert_eq;

    fn discover(code: &str) -> SpringWebModule {
        let model = SourceModel::new(&[ParsedFile::from_source(&["web"], code).unwrap()]);
        let mut module = SpringWebModule::new(&ApiModuleConfig::default(), false);
        module.discover(&model).unwrap();
        module
    }

    fn routes(endpoint: &Endpoint) -> Vec<(String, String, String)> {
        endpoint
            .operations
            .iter()
            .map(|op| {
                let methods: Vec<&str> = op.methods.iter().map(HttpMethod::as_str).collect();
                (op.name.clone(), methods.join(","), op.path.clone())
            })
            .collect()
    }

    #[test]
    fn test_controller_mappings() {
        let module = discover(
            r#"
                #[rest_controller]
                #[request_mapping(value = ["/orders", "/v1/orders/"], produces = "application/json")]
                pub struct OrderController;

                impl OrderController {
                    #[get_mapping("/{id}")]
                    pub fn get(&self, #[path_variable] id: u64) -> ResponseEntity<Order> { todo!() }

                    #[post_mapping(consumes = "application/json")]
                    pub fn create(&self, #[request_body] order: Order) -> Order { todo!() }

                    #[request_mapping(value = "/search", method = RequestMethod::GET)]
                    pub fn search(&self, #[request_param] q: String) -> Vec<Order> { vec![] }

                    pub fn not_mapped(&self) {}
                }

                pub struct Order { pub id: u64 }
            "#,
        );
        let controller = module.context().endpoints().next().unwrap();
        assert_eq!(controller.base_path, "/orders");
        assert_eq!(
            routes(controller),
            vec![
                ("get".to_string(), "GET".to_string(), "/orders/{id}".to_string()),
                ("get".to_string(), "GET".to_string(), "/v1/orders/{id}".to_string()),
                ("create".to_string(), "POST".to_string(), "/orders".to_string()),
                ("create".to_string(), "POST".to_string(), "/v1/orders".to_string()),
                ("search".to_string(), "GET".to_string(), "/orders/search".to_string()),
                ("search".to_string(), "GET".to_string(), "/v1/orders/search".to_string()),
            ]
        );

        let create = &controller.operations[2];
        assert_eq!(create.entity_parameter.as_ref().unwrap().name, "order");
        assert_eq!(create.consumes, BTreeSet::from(["application/json".to_string()]));
        assert_eq!(create.produces, BTreeSet::from(["application/json".to_string()]));

        let get = &controller.operations[0];
        assert!(get.entity_parameter.is_none());
        assert!(get.representation.is_some());
    }

    #[test]
    fn test_mapping_without_method_covers_all_verbs() {
        let module = discover(
            r#"
                #[controller]
                pub struct PingController;
                impl PingController {
                    #[request_mapping("/ping")]
                    pub fn ping(&self) {}
                }
            "#,
        );
        let controller = module.context().endpoints().next().unwrap();
        assert_eq!(controller.base_path, "/");
        assert_eq!(
            routes(controller),
            vec![(
                "ping".to_string(),
                "GET,POST,PUT,DELETE,PATCH".to_string(),
                "/ping".to_string()
            )]
        );
    }

    #[test]
    fn test_controller_advice_is_provider() {
        let module = discover(
            r#"
                #[controller_advice]
                pub struct GlobalErrors;
            "#,
        );
        let context = module.context();
        assert_eq!(context.endpoints().count(), 0);
        assert_eq!(context.providers().count(), 1);
        assert!(!context.is_empty());
    }

    #[test]
    fn test_malformed_class_mapping_skips_controller() {
        let module = discover(
            r#"
                #[rest_controller]
                #[request_mapping(value = 1 + 2)]
                pub struct Broken;
            "#,
        );
        assert!(module.context().is_empty());
    }
}
