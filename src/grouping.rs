//! Presentation grouping of discovered operations.
//!
//! Groups are derived views over an [`ApiContext`]; nothing here writes back into it.

use crate::config::{FacetConfig, GroupingStrategy, PathSortStrategy};
use crate::decoration::{Decorate, TypeRef};
use crate::endpoint::{absolute_path, Endpoint, HttpMethod, Operation};
use crate::registry::ApiContext;
use log::debug;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Label of the annotation group collecting operations without `#[resource_group]`.
pub const DEFAULT_GROUP_LABEL: &str = "Other";

/// Decides which operations are shown at all.
pub trait FacetFilter {
    fn accept(&self, operation: &Operation) -> bool;
}

/// Facet filter built from the `facets` configuration section.
///
/// An excluded facet always hides the operation. When an include list is set, only operations
/// carrying at least one included facet are shown.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredFacetFilter {
    include: BTreeSet<String>,
    exclude: BTreeSet<String>,
}

impl ConfiguredFacetFilter {
    pub fn new(config: &FacetConfig) -> Self {
        Self {
            include: config.include.iter().cloned().collect(),
            exclude: config.exclude.iter().cloned().collect(),
        }
    }
}

impl FacetFilter for ConfiguredFacetFilter {
    fn accept(&self, operation: &Operation) -> bool {
        if operation.facets.iter().any(|f| self.exclude.contains(f)) {
            return false;
        }
        self.include.is_empty() || operation.facets.iter().any(|f| self.include.contains(f))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceGroup {
    pub label: String,
    pub slug: String,
    pub resources: Vec<Resource>,
}

/// All methods of a group that share one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub slug: String,
    /// Path relative to the context path
    pub path: String,
    pub absolute_path: String,
    pub methods: Vec<ResourceMethod>,
}

/// One HTTP verb of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceMethod {
    pub slug: String,
    pub http_method: HttpMethod,
    /// Qualified name of the declaring method
    pub operation: String,
    pub endpoint: String,
    pub consumes: BTreeSet<String>,
    pub produces: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representation_type: Option<String>,
}

/// Hands out slugs that are unique within one grouping run.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    used: HashSet<String>,
}

impl SlugRegistry {
    /// Claims `base`, or `base_2`, `base_3`, ... when it is taken.
    pub fn claim(&mut self, base: &str) -> String {
        let base = slugify(base);
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", base, n);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Reduces `value` to `[A-Za-z0-9_]`, collapsing separators. An empty result becomes `root`.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("root");
    }
    slug
}

fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

pub fn compare_paths(strategy: PathSortStrategy, a: &str, b: &str) -> Ordering {
    let (a, b) = (path_segments(a), path_segments(b));
    match strategy {
        PathSortStrategy::BreadthFirst => a.len().cmp(&b.len()).then_with(|| a.cmp(&b)),
        PathSortStrategy::DepthFirst => a.cmp(&b),
    }
}

type Entry<'a> = (&'a Endpoint, &'a Operation);

/// A group before its resources are built.
struct PendingGroup<'a> {
    label: String,
    slug: String,
    entries: Vec<Entry<'a>>,
}

/// Groups the context's operations using its grouping and path sort strategies.
pub fn group_operations(context: &ApiContext, filter: &dyn FacetFilter) -> Vec<ResourceGroup> {
    let entries: Vec<Entry<'_>> = context
        .operations()
        .filter(|(_, operation)| {
            let accepted = filter.accept(operation);
            if !accepted {
                debug!("Facet filter hides {}", operation.qualified_name);
            }
            accepted
        })
        .collect();

    let mut pending = match context.grouping {
        GroupingStrategy::Class => by_class(&entries),
        GroupingStrategy::Path => by_path(&entries, context.context_path()),
        GroupingStrategy::Annotation => by_annotation(&entries),
    };

    match context.grouping {
        GroupingStrategy::Path => {
            pending.sort_by(|a, b| compare_paths(context.path_sort, &a.label, &b.label))
        }
        _ => pending.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.slug.cmp(&b.slug))),
    }

    let mut slugs = SlugRegistry::default();
    pending
        .into_iter()
        .map(|group| build_group(group, context, &mut slugs))
        .collect()
}

fn by_class<'a>(entries: &[Entry<'a>]) -> Vec<PendingGroup<'a>> {
    let mut by_endpoint: BTreeMap<&str, (&Endpoint, Vec<Entry<'a>>)> = BTreeMap::new();
    for &(endpoint, operation) in entries {
        by_endpoint
            .entry(endpoint.qualified_name())
            .or_insert_with(|| (endpoint, Vec::new()))
            .1
            .push((endpoint, operation));
    }

    let endpoints: Vec<&Endpoint> = by_endpoint.values().map(|(endpoint, _)| *endpoint).collect();
    let names = distinct_class_names(&endpoints);

    by_endpoint
        .into_values()
        .zip(names)
        .map(|((endpoint, entries), name)| PendingGroup {
            label: endpoint.label.clone().unwrap_or_else(|| name.join("::")),
            slug: name.join("_"),
            entries,
        })
        .collect()
}

/// Shortest trailing run of qualified-name segments whose slug tells each endpoint apart from
/// the others. Slugs still equal at full depth are left to [`SlugRegistry`].
fn distinct_class_names<'e>(endpoints: &[&'e Endpoint]) -> Vec<Vec<&'e str>> {
    let segments: Vec<Vec<&str>> = endpoints
        .iter()
        .map(|endpoint| endpoint.element.qualified_segments())
        .collect();
    let suffix = |segments: &[&'e str], depth: usize| -> Vec<&'e str> {
        segments[segments.len().saturating_sub(depth)..].to_vec()
    };

    let mut depths = vec![1; segments.len()];
    loop {
        let names: Vec<Vec<&str>> = segments
            .iter()
            .zip(&depths)
            .map(|(own, &depth)| suffix(own.as_slice(), depth))
            .collect();
        let slugs: Vec<String> = names.iter().map(|name| slugify(&name.join("_"))).collect();

        let mut extended = false;
        for (i, slug) in slugs.iter().enumerate() {
            let collides = slugs.iter().enumerate().any(|(j, other)| j != i && other == slug);
            if collides && depths[i] < segments[i].len() {
                depths[i] += 1;
                extended = true;
            }
        }
        if !extended {
            return names;
        }
    }
}

fn by_path<'a>(entries: &[Entry<'a>], context_path: &str) -> Vec<PendingGroup<'a>> {
    let mut by_path: BTreeMap<&str, Vec<Entry<'a>>> = BTreeMap::new();
    for &entry in entries {
        by_path.entry(entry.1.path.as_str()).or_default().push(entry);
    }
    by_path
        .into_iter()
        .map(|(path, entries)| PendingGroup {
            label: absolute_path(context_path, path),
            slug: path.to_string(),
            entries,
        })
        .collect()
}

fn by_annotation<'a>(entries: &[Entry<'a>]) -> Vec<PendingGroup<'a>> {
    let mut by_label: BTreeMap<&str, Vec<Entry<'a>>> = BTreeMap::new();
    for &entry in entries {
        let label = entry.1.resource_group.as_deref().unwrap_or(DEFAULT_GROUP_LABEL);
        by_label.entry(label).or_default().push(entry);
    }
    by_label
        .into_iter()
        .map(|(label, entries)| PendingGroup {
            label: label.to_string(),
            slug: label.to_string(),
            entries,
        })
        .collect()
}

fn build_group(
    group: PendingGroup<'_>,
    context: &ApiContext,
    slugs: &mut SlugRegistry,
) -> ResourceGroup {
    let group_slug = slugs.claim(&group.slug);

    let mut by_path: BTreeMap<&str, Vec<Entry<'_>>> = BTreeMap::new();
    for entry in group.entries {
        by_path.entry(entry.1.path.as_str()).or_default().push(entry);
    }
    let mut paths: Vec<(&str, Vec<Entry<'_>>)> = by_path.into_iter().collect();
    paths.sort_by(|a, b| compare_paths(context.path_sort, a.0, b.0));

    let resources = paths
        .into_iter()
        .map(|(path, mut entries)| {
            let slug = slugs.claim(&format!("{}_{}", group_slug, slugify(path)));
            entries.sort_by(|a, b| {
                a.1.methods
                    .iter()
                    .next()
                    .cmp(&b.1.methods.iter().next())
                    .then_with(|| a.1.qualified_name.cmp(&b.1.qualified_name))
            });
            let methods = entries
                .into_iter()
                .flat_map(|(endpoint, operation)| {
                    operation
                        .methods
                        .iter()
                        .map(move |verb| (endpoint, operation, verb))
                })
                .map(|(endpoint, operation, verb)| ResourceMethod {
                    slug: slugs.claim(&format!("{}_{}", slug, verb.as_str().to_lowercase())),
                    http_method: verb.clone(),
                    operation: operation.qualified_name.clone(),
                    endpoint: endpoint.qualified_name().to_string(),
                    consumes: operation.consumes.clone(),
                    produces: operation.produces.clone(),
                    entity_type: operation
                        .entity_parameter
                        .as_ref()
                        .and_then(|entity| type_name(&entity.ty)),
                    representation_type: operation
                        .representation
                        .as_ref()
                        .and_then(|representation| type_name(&representation.ty)),
                })
                .collect();
            Resource {
                slug,
                path: path.to_string(),
                absolute_path: absolute_path(context.context_path(), path),
                methods,
            }
        })
        .collect();

    ResourceGroup {
        label: group.label,
        slug: group_slug,
        resources,
    }
}

/// Display name of a type, or `None` when it cannot be decorated.
pub(crate) fn type_name(ty: &TypeRef) -> Option<String> {
    ty.decorate().ok().map(|occurrence| occurrence.to_string())
}
