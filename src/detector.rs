use crate::config::ApiFlavor;
use crate::parser::ParsedFile;
use log::debug;
use std::collections::BTreeSet;
use syn::visit::Visit;

const JAXRS_MARKERS: [&str; 2] = ["application_path", "provider"];
/// Only counts on a struct or enum; `#[path = "..."]` on a `mod` is the compiler's own.
const JAXRS_RESOURCE_MARKER: &str = "path";
const SPRING_WEB_MARKERS: [&str; 5] = [
    "controller",
    "rest_controller",
    "controller_advice",
    "rest_controller_advice",
    "request_mapping",
];

/// API flavor detector.
///
/// Looks for the marker attributes of each flavor anywhere in the parsed files: on types,
/// impl blocks, methods, trait items and parameters. The JAX-RS `path` marker counts only on
/// resource types. A flavor that is not enabled explicitly in the configuration runs only when
/// detected.
pub struct FlavorDetector;

/// Result of flavor detection.
pub struct DetectionResult {
    /// Detected flavors, in declaration order
    pub flavors: Vec<ApiFlavor>,
}

impl DetectionResult {
    pub fn contains(&self, flavor: ApiFlavor) -> bool {
        self.flavors.contains(&flavor)
    }
}

#[derive(Default)]
struct MarkerVisitor {
    detected: BTreeSet<ApiFlavor>,
}

impl MarkerVisitor {
    fn check_resource(&mut self, attrs: &[syn::Attribute]) {
        if attrs.iter().any(|attr| marker_name(attr).as_deref() == Some(JAXRS_RESOURCE_MARKER)) {
            self.detected.insert(ApiFlavor::Jaxrs);
        }
    }
}

fn marker_name(attr: &syn::Attribute) -> Option<String> {
    attr.path().segments.last().map(|segment| segment.ident.to_string())
}

impl<'ast> Visit<'ast> for MarkerVisitor {
    fn visit_item_struct(&mut self, node: &'ast syn::ItemStruct) {
        self.check_resource(&node.attrs);
        syn::visit::visit_item_struct(self, node);
    }

    fn visit_item_enum(&mut self, node: &'ast syn::ItemEnum) {
        self.check_resource(&node.attrs);
        syn::visit::visit_item_enum(self, node);
    }

    fn visit_attribute(&mut self, attr: &'ast syn::Attribute) {
        let Some(name) = marker_name(attr) else {
            return;
        };
        if JAXRS_MARKERS.contains(&name.as_str()) {
            self.detected.insert(ApiFlavor::Jaxrs);
        }
        if SPRING_WEB_MARKERS.contains(&name.as_str()) {
            self.detected.insert(ApiFlavor::SpringWeb);
        }
    }
}

impl FlavorDetector {
    pub fn detect(parsed_files: &[ParsedFile]) -> DetectionResult {
        debug!("Detecting API flavors in {} files", parsed_files.len());

        let mut visitor = MarkerVisitor::default();
        for parsed_file in parsed_files {
            visitor.visit_file(&parsed_file.syntax_tree);
        }

        let flavors: Vec<ApiFlavor> = visitor.detected.into_iter().collect();
        debug!("Detected flavors: {:?}", flavors);

        DetectionResult { flavors }
    }
}
