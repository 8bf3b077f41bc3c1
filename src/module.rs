//! Analysis modules and the dependency resolver that wires them together.
//!
//! Modules declare what they are through [`Capabilities`] and the `as_*` accessors, and what
//! they need through [`DependencySpec`]s. The resolver offers modules to specs until nothing
//! changes, and records every acceptance as a [`WiringEdge`].

use crate::api::ApiProviderModule;
use crate::config::DataTypeDetectionStrategy;
use crate::error::{Error, Result};
use crate::representation::MediaTypeModule;
use log::{debug, info};

/// What a module can do for others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Discovers endpoints and pushes data types
    pub api_provider: bool,
    /// Documents data types for one wire format
    pub media_types: bool,
}

/// An independently developed analysis module.
pub trait AnalysisModule {
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    /// Fresh dependency specifications, in declaration order.
    fn dependency_specs(&self) -> Vec<Box<dyn DependencySpec>> {
        Vec::new()
    }

    fn as_media_type_module(&mut self) -> Option<&mut dyn MediaTypeModule> {
        None
    }

    fn as_api_provider(&mut self) -> Option<&mut dyn ApiProviderModule> {
        None
    }
}

/// A dependency one module has on others.
///
/// `accept` may have side effects on the accepted module.
pub trait DependencySpec {
    fn describe(&self) -> String;

    fn accept(&mut self, candidate: &mut dyn AnalysisModule) -> bool;

    fn is_fulfilled(&self) -> bool;
}

/// Declared by endpoint modules: every media type module becomes a collaborator, and is told
/// that its data types will be pushed, so it need not detect them itself.
#[derive(Debug, Default)]
pub struct MediaTypeDependencySpec;

impl DependencySpec for MediaTypeDependencySpec {
    fn describe(&self) -> String {
        "media type modules".to_string()
    }

    fn accept(&mut self, candidate: &mut dyn AnalysisModule) -> bool {
        match candidate.as_media_type_module() {
            Some(media) => {
                media.set_default_detection_strategy(DataTypeDetectionStrategy::Passive);
                true
            }
            None => false,
        }
    }

    fn is_fulfilled(&self) -> bool {
        true
    }
}

/// Declared by media type modules: records which endpoint modules push to them.
#[derive(Debug, Default)]
pub struct ApiProviderDependencySpec;

impl DependencySpec for ApiProviderDependencySpec {
    fn describe(&self) -> String {
        "api provider modules".to_string()
    }

    fn accept(&mut self, candidate: &mut dyn AnalysisModule) -> bool {
        candidate.capabilities().api_provider
    }

    fn is_fulfilled(&self) -> bool {
        true
    }
}

/// One accepted dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiringEdge {
    pub dependent: usize,
    pub dependent_name: &'static str,
    pub spec: String,
    pub dependency: usize,
    pub dependency_name: &'static str,
}

/// The result of dependency resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wiring {
    edges: Vec<WiringEdge>,
}

impl Wiring {
    pub fn edges(&self) -> &[WiringEdge] {
        &self.edges
    }

    /// Modules accepted by any spec of module `dependent`, in acceptance order.
    pub fn dependencies_of(&self, dependent: usize) -> Vec<usize> {
        let mut dependencies = Vec::new();
        for edge in self.edges.iter().filter(|e| e.dependent == dependent) {
            if !dependencies.contains(&edge.dependency) {
                dependencies.push(edge.dependency);
            }
        }
        dependencies
    }

    /// `(dependent, dependency)` name pairs, in acceptance order.
    pub fn pairs(&self) -> Vec<(&'static str, &'static str)> {
        self.edges
            .iter()
            .map(|e| (e.dependent_name, e.dependency_name))
            .collect()
    }
}

struct PendingSpec {
    owner: usize,
    spec: Box<dyn DependencySpec>,
    accepted: Vec<usize>,
}

/// Resolves the dependency specs of `modules`.
///
/// The first pass offers every other module to every spec, in spec declaration order and then
/// module registration order. Later passes revisit only unfulfilled specs with modules they have
/// not accepted yet, and stop once a pass accepts nothing.
pub fn resolve_dependencies(modules: &mut [Box<dyn AnalysisModule>]) -> Result<Wiring> {
    let mut pending: Vec<PendingSpec> = modules
        .iter()
        .enumerate()
        .flat_map(|(owner, module)| {
            module
                .dependency_specs()
                .into_iter()
                .map(move |spec| PendingSpec {
                    owner,
                    spec,
                    accepted: Vec::new(),
                })
        })
        .collect();
    debug!(
        "Resolving {} dependency specs across {} modules",
        pending.len(),
        modules.len()
    );

    let mut wiring = Wiring::default();
    let mut first_pass = true;
    loop {
        let mut progress = false;
        for entry in pending.iter_mut() {
            if !first_pass && entry.spec.is_fulfilled() {
                continue;
            }
            let dependent_name = modules[entry.owner].name();
            for (index, candidate) in modules.iter_mut().enumerate() {
                if index == entry.owner || entry.accepted.contains(&index) {
                    continue;
                }
                if entry.spec.accept(candidate.as_mut()) {
                    debug!(
                        "Module {} satisfies '{}' of {}",
                        candidate.name(),
                        entry.spec.describe(),
                        dependent_name
                    );
                    entry.accepted.push(index);
                    wiring.edges.push(WiringEdge {
                        dependent: entry.owner,
                        dependent_name,
                        spec: entry.spec.describe(),
                        dependency: index,
                        dependency_name: candidate.name(),
                    });
                    progress = true;
                }
            }
        }
        first_pass = false;

        if !progress || pending.iter().all(|entry| entry.spec.is_fulfilled()) {
            break;
        }
    }

    if let Some(unfulfilled) = pending.iter().find(|entry| !entry.spec.is_fulfilled()) {
        return Err(Error::UnfulfilledDependency {
            module: modules[unfulfilled.owner].name().to_string(),
            spec: unfulfilled.spec.describe(),
            tried: modules
                .iter()
                .enumerate()
                .filter(|(index, _)| *index != unfulfilled.owner)
                .map(|(_, module)| module.name().to_string())
                .collect(),
        });
    }

    info!("Wired {} module dependencies", wiring.edges.len());
    Ok(wiring)
}
