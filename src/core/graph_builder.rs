//! Resolution and graph building
//!
//! Building happens in two passes. Staging collects every parsed descriptor
//! keyed by name, first seen wins. Resolution then walks each staged
//! descriptor's symbolic references once, linking them to staged classes or to
//! memoized external stubs. Nothing recurses into referenced classes, so
//! reference cycles need no special handling.

use crate::core::package_tree::build_package_tree;
use crate::error::ImportError;
use crate::models::descriptor::{ClassDescriptor, DependencyKind};
use crate::models::graph::{ImportedGraph, JavaClass};
use crate::models::report::ImportReport;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct GraphBuilder {
    staged: Vec<ClassDescriptor>,
    by_name: HashMap<String, usize>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage one descriptor. A descriptor whose name is already staged is
    /// discarded and reported back as `DuplicateClassIgnored`.
    pub fn stage(&mut self, descriptor: ClassDescriptor) -> Option<ImportError> {
        if let Some(&existing) = self.by_name.get(&descriptor.name) {
            let kept = &self.staged[existing];
            return Some(ImportError::DuplicateClassIgnored {
                class_name: descriptor.name.clone(),
                kept: source_uri(kept),
                ignored: source_uri(&descriptor),
            });
        }
        self.by_name
            .insert(descriptor.name.clone(), self.staged.len());
        self.staged.push(descriptor);
        None
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Resolve every staged reference and assemble the graph
    pub fn build(self, mut report: ImportReport) -> ImportedGraph {
        let mut graph: DiGraph<JavaClass, DependencyKind> = DiGraph::with_capacity(
            self.staged.len(),
            self.staged.len() * 4,
        );
        let mut index: HashMap<String, NodeIndex> = HashMap::with_capacity(self.staged.len());

        // Staged classes come first, so node i is staged descriptor i
        let mut references = Vec::with_capacity(self.staged.len());
        for descriptor in self.staged {
            references.push(descriptor.referenced_class_names());
            let name = descriptor.name.clone();
            let node = graph.add_node(JavaClass::Imported(descriptor));
            index.insert(name, node);
        }
        let imported = references.len();

        for (position, class_references) in references.into_iter().enumerate() {
            let origin = NodeIndex::new(position);
            for reference in class_references {
                let target = match index.get(&reference.target) {
                    Some(&node) => node,
                    None => {
                        let node = graph.add_node(JavaClass::External {
                            name: reference.target.clone(),
                        });
                        index.insert(reference.target, node);
                        node
                    }
                };
                if target != origin {
                    graph.add_edge(origin, target, reference.kind);
                }
            }
        }

        let root = build_package_tree(
            graph
                .node_weights()
                .filter(|class| class.is_resolved())
                .map(JavaClass::name),
        );

        report.summary.classes_imported = imported;
        report.summary.external_classes = graph.node_count() - imported;
        tracing::debug!(
            classes = imported,
            external = graph.node_count() - imported,
            edges = graph.edge_count(),
            "Resolved class graph"
        );

        ImportedGraph::new(graph, index, root, report)
    }
}

fn source_uri(descriptor: &ClassDescriptor) -> String {
    descriptor
        .source
        .as_ref()
        .map(|location| location.uri().to_string())
        .unwrap_or_else(|| format!("<unknown location of {}>", descriptor.name))
}
