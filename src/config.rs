//! Analysis configuration.
//!
//! The YAML file is deserialized into loosely typed `Raw*` structures and validated once into
//! [`AnalysisConfig`]. Nothing downstream looks at strings again.

use crate::error::{Error, Result};
use clap::ValueEnum;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// An endpoint-discovering API flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiFlavor {
    /// `#[path]`-annotated resources
    Jaxrs,
    /// `#[controller]`-annotated controllers
    #[value(name = "spring-web")]
    SpringWeb,
}

impl ApiFlavor {
    pub const ALL: [ApiFlavor; 2] = [ApiFlavor::Jaxrs, ApiFlavor::SpringWeb];

    /// Module name, as used in the model and in configuration sections.
    pub fn name(&self) -> &'static str {
        match self {
            ApiFlavor::Jaxrs => "jaxrs",
            ApiFlavor::SpringWeb => "spring_web",
        }
    }
}

/// How a module finds the data types it documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataTypeDetectionStrategy {
    /// Start from elements of the analyzed project only
    Local,
    /// Start from every element, included roots too
    Aggressive,
    /// Detect nothing; only document what is pushed
    Passive,
}

impl DataTypeDetectionStrategy {
    /// Parses a configured value. Unknown values yield `None` so callers fall back to defaults.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "aggressive" => Some(Self::Aggressive),
            "passive" => Some(Self::Passive),
            _ => None,
        }
    }

    /// The effective strategy: configured, else pushed by a collaborator, else by roots.
    pub fn resolve(
        configured: Option<Self>,
        pushed_default: Option<Self>,
        has_included_roots: bool,
    ) -> Self {
        configured.or(pushed_default).unwrap_or(if has_included_roots {
            Self::Aggressive
        } else {
            Self::Local
        })
    }
}

/// How operations are clustered into resource groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    /// One group per endpoint
    #[default]
    #[value(alias = "resource_class")]
    Class,
    /// One group per distinct path
    Path,
    /// One group per `#[resource_group]` label
    Annotation,
}

impl GroupingStrategy {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "class" | "resource_class" => Ok(Self::Class),
            "path" => Ok(Self::Path),
            "annotation" => Ok(Self::Annotation),
            other => Err(Error::UnknownGroupingStrategy(other.to_string())),
        }
    }
}

/// Ordering of paths within and across path groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSortStrategy {
    /// Fewer segments first, then segment by segment
    #[default]
    BreadthFirst,
    /// Segment by segment, so children follow their parent
    DepthFirst,
}

impl PathSortStrategy {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "breadth_first" => Ok(Self::BreadthFirst),
            "depth_first" => Ok(Self::DepthFirst),
            other => Err(Error::UnknownPathSortStrategy(other.to_string())),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    include: Vec<PathBuf>,
    jaxrs: RawApiModule,
    spring_web: RawApiModule,
    json: RawRepresentation,
    xml: RawRepresentation,
    facets: RawFacets,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawApiModule {
    enabled: Option<bool>,
    datatype_detection: Option<String>,
    group_by: Option<String>,
    path_sort: Option<String>,
    application_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawRepresentation {
    enabled: Option<bool>,
    datatype_detection: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawFacets {
    include: Vec<String>,
    exclude: Vec<String>,
}

/// Settings of one API flavor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiModuleConfig {
    /// `None` means "enabled when detected in the sources"
    pub enabled: Option<bool>,
    pub datatype_detection: Option<DataTypeDetectionStrategy>,
    pub grouping: GroupingStrategy,
    pub path_sort: PathSortStrategy,
    /// Overrides any `#[application_path]` found in the sources
    pub application_path: Option<String>,
}

/// Settings of one representation module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepresentationConfig {
    pub enabled: bool,
    pub datatype_detection: Option<DataTypeDetectionStrategy>,
}

impl Default for RepresentationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            datatype_detection: None,
        }
    }
}

/// Facets to keep or drop from the produced model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FacetConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Validated configuration of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalysisConfig {
    /// Extra, non-local source roots
    pub include_paths: Vec<PathBuf>,
    pub jaxrs: ApiModuleConfig,
    pub spring_web: ApiModuleConfig,
    pub json: RepresentationConfig,
    pub xml: RepresentationConfig,
    pub facets: FacetConfig,
}

impl AnalysisConfig {
    /// Loads and validates a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let raw: RawConfig = if content.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| Error::InvalidConfig(e.to_string()))?
        };
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self> {
        Ok(Self {
            include_paths: raw.include,
            jaxrs: validate_api_module(ApiFlavor::Jaxrs, raw.jaxrs)?,
            spring_web: validate_api_module(ApiFlavor::SpringWeb, raw.spring_web)?,
            json: validate_representation("json", raw.json),
            xml: validate_representation("xml", raw.xml),
            facets: FacetConfig {
                include: raw.facets.include,
                exclude: raw.facets.exclude,
            },
        })
    }

    pub fn api_module(&self, flavor: ApiFlavor) -> &ApiModuleConfig {
        match flavor {
            ApiFlavor::Jaxrs => &self.jaxrs,
            ApiFlavor::SpringWeb => &self.spring_web,
        }
    }

    fn api_module_mut(&mut self, flavor: ApiFlavor) -> &mut ApiModuleConfig {
        match flavor {
            ApiFlavor::Jaxrs => &mut self.jaxrs,
            ApiFlavor::SpringWeb => &mut self.spring_web,
        }
    }

    /// Applies the same grouping strategy to every flavor.
    pub fn override_grouping(&mut self, grouping: GroupingStrategy) {
        for flavor in ApiFlavor::ALL {
            self.api_module_mut(flavor).grouping = grouping;
        }
    }

    /// Applies the same context path to every flavor.
    pub fn override_context_path(&mut self, context_path: &str) {
        for flavor in ApiFlavor::ALL {
            self.api_module_mut(flavor).application_path = Some(context_path.to_string());
        }
    }

    /// Enables exactly the given flavors.
    pub fn override_flavors(&mut self, flavors: &[ApiFlavor]) {
        for flavor in ApiFlavor::ALL {
            self.api_module_mut(flavor).enabled = Some(flavors.contains(&flavor));
        }
    }

    pub fn add_include_paths(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.include_paths.extend(paths);
    }
}

fn validate_api_module(flavor: ApiFlavor, raw: RawApiModule) -> Result<ApiModuleConfig> {
    Ok(ApiModuleConfig {
        enabled: raw.enabled,
        datatype_detection: detection_strategy(flavor.name(), raw.datatype_detection),
        grouping: raw
            .group_by
            .as_deref()
            .map(GroupingStrategy::parse)
            .transpose()?
            .unwrap_or_default(),
        path_sort: raw
            .path_sort
            .as_deref()
            .map(PathSortStrategy::parse)
            .transpose()?
            .unwrap_or_default(),
        application_path: raw.application_path,
    })
}

fn validate_representation(module: &str, raw: RawRepresentation) -> RepresentationConfig {
    RepresentationConfig {
        enabled: raw.enabled.unwrap_or(true),
        datatype_detection: detection_strategy(module, raw.datatype_detection),
    }
}

fn detection_strategy(module: &str, value: Option<String>) -> Option<DataTypeDetectionStrategy> {
    let value = value?;
    let parsed = DataTypeDetectionStrategy::parse(&value);
    if parsed.is_none() {
        warn!(
            "Unknown data type detection strategy '{}' for module {}, using defaults",
            value, module
        );
    }
    parsed
}
