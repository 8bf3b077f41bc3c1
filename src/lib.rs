//! Builds a documentation-ready API model from annotated Rust source code.
//!
//! Endpoint types are recognized by their attributes, in one of two flavors: resources in the
//! `#[path]` style ([`api::jaxrs`]) and controllers in the `#[controller]` style
//! ([`api::spring_web`]). Every data type reachable from an endpoint's request and response
//! bodies is documented by the representation modules ([`representation::json`],
//! [`representation::xml`]) whose media types the endpoint declares. Operations are finally
//! clustered into named resource groups.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Walks the project and any included roots for Rust files
//! 2. [`parser`] - Parses files into syntax trees and derives their module paths
//! 3. [`source_model`] - Indexes types, impls and traits into annotated [`element`]s
//! 4. [`detector`] - Detects which API flavors the project uses
//! 5. [`module`] - Wires analysis modules together through their dependency specs
//! 6. [`api`] - Discovers endpoints and providers into a [`registry::ApiContext`]
//! 7. [`traversal`] - Walks the type graph from every operation using [`decoration`] and
//!    [`context`], registering each reachable type once per module
//! 8. [`grouping`] - Clusters operations into resource groups with unique slugs
//! 9. [`engine`] - Runs all of the above and assembles the [`engine::ApiModel`]
//! 10. [`serializer`] - Writes the model as YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use api_model_from_source::{
//!     config::AnalysisConfig,
//!     detector::FlavorDetector,
//!     engine::analyze,
//!     parser::AstParser,
//!     scanner::{FileScanner, SourceRoot},
//!     serializer::serialize_yaml,
//!     source_model::SourceModel,
//! };
//! use std::path::PathBuf;
//!
//! let scanner = FileScanner::new(vec![SourceRoot::local(PathBuf::from("./my-service"))]);
//! let scan_result = scanner.scan().unwrap();
//!
//! let parsed_files: Vec<_> = AstParser::parse_files(&scan_result.rust_files)
//!     .into_iter()
//!     .filter_map(Result::ok)
//!     .collect();
//!
//! let detection = FlavorDetector::detect(&parsed_files);
//! let model = SourceModel::new(&parsed_files);
//! let api_model = analyze(&AnalysisConfig::default(), &model, &detection).unwrap();
//!
//! println!("{}", serialize_yaml(&api_model).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod api;
pub mod cli;
pub mod config;
pub mod context;
pub mod decoration;
pub mod detector;
pub mod element;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod module;
pub mod parser;
pub mod registry;
pub mod representation;
pub mod scanner;
pub mod serializer;
pub mod source_model;
pub mod traversal;
