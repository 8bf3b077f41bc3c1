use crate::config::{GroupingStrategy, PathSortStrategy};
use crate::element::Element;
use crate::endpoint::{normalize_context_path, Endpoint, Operation};
use log::debug;
use std::collections::BTreeMap;

/// Everything one API flavor discovered during a run.
///
/// Endpoints and providers are keyed by qualified name, so iteration order is independent of
/// discovery order. The context is append-only while discovery runs and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ApiContext {
    endpoints: BTreeMap<String, Endpoint>,
    providers: BTreeMap<String, Element>,
    context_path: String,
    pub grouping: GroupingStrategy,
    pub path_sort: PathSortStrategy,
}

impl ApiContext {
    pub fn new(grouping: GroupingStrategy, path_sort: PathSortStrategy) -> Self {
        Self {
            grouping,
            path_sort,
            ..Self::default()
        }
    }

    pub fn add_endpoint(&mut self, endpoint: Endpoint) {
        debug!(
            "Registered endpoint {} with {} operations",
            endpoint.qualified_name(),
            endpoint.operations.len()
        );
        self.endpoints
            .entry(endpoint.qualified_name().to_string())
            .or_insert(endpoint);
    }

    pub fn add_provider(&mut self, provider: Element) {
        debug!("Registered provider {}", provider.qualified_name);
        self.providers
            .entry(provider.qualified_name.clone())
            .or_insert(provider);
    }

    pub fn set_context_path(&mut self, context_path: &str) {
        self.context_path = normalize_context_path(context_path);
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.values()
    }

    pub fn providers(&self) -> impl Iterator<Item = &Element> {
        self.providers.values()
    }

    /// All operations of all endpoints, in endpoint order.
    pub fn operations(&self) -> impl Iterator<Item = (&Endpoint, &Operation)> {
        self.endpoints()
            .flat_map(|endpoint| endpoint.operations.iter().map(move |op| (endpoint, op)))
    }

    /// The normalized context path; empty for the root.
    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty() && self.providers.is_empty()
    }
}
