// Endpoints, their impl blocks, their traits and their data types may live in different files
use api_model_from_source::config::{AnalysisConfig, ApiFlavor};
use api_model_from_source::detector::FlavorDetector;
use api_model_from_source::engine::analyze;
use api_model_from_source::parser::ParsedFile;
use api_model_from_source::source_model::{ProgramModel, SourceModel};
use pretty_assertions::assert_eq;

fn parsed_files() -> Vec<ParsedFile> {
    // File 1: the resource declaration
    let resource_code = r#"
        #[path("/users")]
        #[produces("application/json")]
        pub struct UserResource;
    "#;

    // File 2: the trait carrying the annotations
    let api_code = r#"
        pub trait UserApi {
            #[get]
            #[path("{id}")]
            fn get(&self, #[path_param("id")] id: u32) -> crate::model::User;

            #[get]
            fn list(&self) -> Vec<crate::model::User> {
                Vec::new()
            }
        }
    "#;

    // File 3: the impl, in yet another module
    let impl_code = r#"
        use crate::api::UserApi;
        use crate::resources::UserResource;

        impl UserApi for UserResource {
            fn get(&self, id: u32) -> crate::model::User {
                todo!()
            }
        }
    "#;

    // File 4: data types
    let model_code = r#"
        #[derive(Serialize)]
        pub struct User {
            pub id: u32,
            pub address: Address,
        }

        #[derive(Serialize)]
        pub struct Address {
            pub city: String,
        }
    "#;

    vec![
        ParsedFile::from_source(&["resources"], resource_code).expect("Failed to parse resources"),
        ParsedFile::from_source(&["api"], api_code).expect("Failed to parse api"),
        ParsedFile::from_source(&["handlers"], impl_code).expect("Failed to parse handlers"),
        ParsedFile::from_source(&["model"], model_code).expect("Failed to parse model"),
    ]
}

#[test]
fn test_cross_file_operation_resolution() {
    let parsed_files = parsed_files();
    let detection = FlavorDetector::detect(&parsed_files);
    assert_eq!(detection.flavors, vec![ApiFlavor::Jaxrs]);

    let model = SourceModel::new(&parsed_files);
    let result = analyze(&AnalysisConfig::default(), &model, &detection).unwrap();

    let jaxrs = &result.resource_apis[0];
    let operations: Vec<(&str, &str, Option<&str>)> = jaxrs.endpoints[0]
        .operations
        .iter()
        .map(|op| (op.name.as_str(), op.path.as_str(), op.representation.as_deref()))
        .collect();
    assert_eq!(
        operations,
        vec![
            ("get", "/users/{id}", Some("User")),
            ("list", "/users", Some("Vec<User>")),
        ]
    );

    let names: Vec<&str> = result.data_types["json"]
        .iter()
        .map(|d| d.qualified_name.as_str())
        .collect();
    assert_eq!(names, vec!["model::Address", "model::User"]);
}

#[test]
fn test_impl_methods_attach_to_type_in_other_file() {
    let model = SourceModel::new(&parsed_files());
    let resource = model
        .find_type(&["resources".to_string(), "UserResource".to_string()])
        .expect("Should find the resource");

    let inherent = model.methods_of(resource, false);
    assert!(inherent.is_empty());

    let inherited: Vec<String> = model
        .methods_of(resource, true)
        .iter()
        .map(|m| m.element.qualified_name.clone())
        .collect();
    assert_eq!(
        inherited,
        vec!["resources::UserResource::get", "resources::UserResource::list"]
    );
}

fn json_type_names(files: &[ParsedFile]) -> Vec<String> {
    let detection = FlavorDetector::detect(files);
    let model = SourceModel::new(files);
    let result = analyze(&AnalysisConfig::default(), &model, &detection).unwrap();
    result.data_types["json"]
        .iter()
        .map(|d| d.qualified_name.clone())
        .collect()
}

const V1_MODEL: &str = r#"
    #[derive(Serialize)]
    pub struct Widget { pub legacy: bool }

    #[derive(Serialize)]
    pub struct Part { pub serial: u64 }
"#;

#[test]
fn test_colliding_simple_names_resolve_from_the_referencing_module() {
    let v2 = r#"
        #[path("/widgets")]
        #[produces("application/json")]
        pub struct WidgetResource;

        impl WidgetResource {
            #[get]
            fn get(&self) -> Widget { todo!() }
        }

        #[derive(Serialize)]
        pub struct Widget { pub part: Part, pub coords: (f64, f64) }

        #[derive(Serialize)]
        pub struct Part { pub name: String }
    "#;
    let files = vec![
        ParsedFile::from_source(&["v1"], V1_MODEL).unwrap(),
        ParsedFile::from_source(&["v2"], v2).unwrap(),
    ];

    assert_eq!(json_type_names(&files), vec!["v2::Part", "v2::Widget"]);
}

#[test]
fn test_imported_and_anchored_names_pick_the_named_module() {
    let v2 = r#"
        use crate::v1::Widget;

        #[path("/widgets")]
        #[produces("application/json")]
        pub struct WidgetResource;

        impl WidgetResource {
            #[get]
            fn legacy(&self) -> Widget { todo!() }

            #[get]
            #[path("parts")]
            fn parts(&self) -> Vec<self::Part> { vec![] }
        }

        #[derive(Serialize)]
        pub struct Part { pub name: String }
    "#;
    let v3 = r#"
        #[derive(Serialize)]
        pub struct Widget { pub draft: bool }
    "#;
    let files = vec![
        ParsedFile::from_source(&["v3"], v3).unwrap(),
        ParsedFile::from_source(&["v1"], V1_MODEL).unwrap(),
        ParsedFile::from_source(&["v2"], v2).unwrap(),
    ];

    assert_eq!(json_type_names(&files), vec!["v1::Widget", "v2::Part"]);
}
