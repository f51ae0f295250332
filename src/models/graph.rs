//! The imported class graph
//!
//! [`ImportedGraph`] owns every class node, imported or external, in a
//! `petgraph` directed graph whose edges carry the [`DependencyKind`] of a
//! reference. [`ClassRef`] and [`PackageRef`] are cheap borrowed views into it;
//! all cross-references are resolved through the graph, never owned.

use super::descriptor::{package_of, ClassDescriptor, DependencyKind};
use super::location::Location;
use super::package::Package;
use super::report::ImportReport;
use crate::error::{ImportError, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use std::fmt;

/// Node payload: a class parsed from a location, or a placeholder for a
/// name that was referenced but never imported
#[derive(Debug, Clone)]
pub enum JavaClass {
    Imported(ClassDescriptor),
    External { name: String },
}

impl JavaClass {
    pub fn name(&self) -> &str {
        match self {
            JavaClass::Imported(descriptor) => &descriptor.name,
            JavaClass::External { name } => name,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, JavaClass::Imported(_))
    }

    pub fn descriptor(&self) -> Option<&ClassDescriptor> {
        match self {
            JavaClass::Imported(descriptor) => Some(descriptor),
            JavaClass::External { .. } => None,
        }
    }
}

pub struct ImportedGraph {
    graph: DiGraph<JavaClass, DependencyKind>,
    index: HashMap<String, NodeIndex>,
    root: Package,
    report: ImportReport,
}

impl ImportedGraph {
    pub(crate) fn new(
        graph: DiGraph<JavaClass, DependencyKind>,
        index: HashMap<String, NodeIndex>,
        root: Package,
        report: ImportReport,
    ) -> Self {
        Self {
            graph,
            index,
            root,
            report,
        }
    }

    fn view(&self, node: NodeIndex) -> ClassRef<'_> {
        ClassRef { graph: self, node }
    }

    /// Any node by name, imported or external
    pub fn lookup(&self, name: &str) -> Option<ClassRef<'_>> {
        self.index.get(name).map(|&node| self.view(node))
    }

    /// An imported class by fully-qualified name
    pub fn get(&self, name: &str) -> Option<ClassRef<'_>> {
        self.lookup(name).filter(ClassRef::is_resolved)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// An external stub by fully-qualified name
    pub fn external(&self, name: &str) -> Option<ClassRef<'_>> {
        self.lookup(name).filter(|class| !class.is_resolved())
    }

    /// Imported classes in name order
    pub fn classes(&self) -> Vec<ClassRef<'_>> {
        self.sorted_nodes(true)
    }

    /// External stubs in name order
    pub fn external_classes(&self) -> Vec<ClassRef<'_>> {
        self.sorted_nodes(false)
    }

    fn sorted_nodes(&self, resolved: bool) -> Vec<ClassRef<'_>> {
        let mut classes: Vec<ClassRef<'_>> = self
            .graph
            .node_indices()
            .filter(|&node| self.graph[node].is_resolved() == resolved)
            .map(|node| self.view(node))
            .collect();
        classes.sort_by(|a, b| a.name().cmp(b.name()));
        classes
    }

    /// Names of the imported classes in order
    pub fn class_names(&self) -> Vec<&str> {
        self.classes().into_iter().map(|class| class.name()).collect()
    }

    /// Number of imported classes
    pub fn len(&self) -> usize {
        self.graph
            .node_weights()
            .filter(|class| class.is_resolved())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn root_package(&self) -> PackageRef<'_> {
        PackageRef {
            graph: self,
            package: &self.root,
        }
    }

    /// Direct lookup by fully-qualified package name
    pub fn package(&self, name: &str) -> Result<PackageRef<'_>> {
        self.root_package().get_package(name)
    }

    pub fn contains_package(&self, name: &str) -> bool {
        self.root.find(name).is_some()
    }

    pub fn report(&self) -> &ImportReport {
        &self.report
    }

    pub(crate) fn report_mut(&mut self) -> &mut ImportReport {
        &mut self.report
    }

    pub fn is_complete(&self) -> bool {
        self.report.complete
    }
}

impl fmt::Debug for ImportedGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportedGraph")
            .field("classes", &self.len())
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .field("complete", &self.report.complete)
            .finish()
    }
}

/// One resolved reference between two graph nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency<'g> {
    pub origin: ClassRef<'g>,
    pub target: ClassRef<'g>,
    pub kind: DependencyKind,
}

impl fmt::Display for Dependency<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.origin, self.kind, self.target)
    }
}

/// Borrowed view of one class node
#[derive(Clone, Copy)]
pub struct ClassRef<'g> {
    graph: &'g ImportedGraph,
    node: NodeIndex,
}

impl<'g> ClassRef<'g> {
    fn class(&self) -> &'g JavaClass {
        &self.graph.graph[self.node]
    }

    pub fn name(&self) -> &'g str {
        self.class().name()
    }

    pub fn simple_name(&self) -> &'g str {
        match self.class() {
            JavaClass::Imported(descriptor) => descriptor.simple_name(),
            JavaClass::External { name } => {
                let local = name
                    .rsplit_once('.')
                    .map(|(_, simple)| simple)
                    .unwrap_or(name.as_str());
                local.rsplit_once('$').map(|(_, inner)| inner).unwrap_or(local)
            }
        }
    }

    pub fn package_name(&self) -> &'g str {
        package_of(self.name())
    }

    /// False for external stubs
    pub fn is_resolved(&self) -> bool {
        self.class().is_resolved()
    }

    pub fn descriptor(&self) -> Option<&'g ClassDescriptor> {
        self.class().descriptor()
    }

    pub fn source(&self) -> Option<&'g Location> {
        self.descriptor().and_then(|descriptor| descriptor.source.as_ref())
    }

    pub fn superclass(&self) -> Option<ClassRef<'g>> {
        let name = self.descriptor()?.super_class.as_deref()?;
        self.graph.lookup(name)
    }

    /// Implemented interfaces in declaration order
    pub fn interfaces(&self) -> Vec<ClassRef<'g>> {
        self.descriptor()
            .map(|descriptor| {
                descriptor
                    .interfaces
                    .iter()
                    .filter_map(|name| self.graph.lookup(name))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn enclosing_class(&self) -> Option<ClassRef<'g>> {
        let name = self.descriptor()?.enclosing_class.as_deref()?;
        self.graph.lookup(name)
    }

    /// Outgoing references, ordered by target name then kind
    pub fn direct_dependencies(&self) -> Vec<Dependency<'g>> {
        let mut dependencies: Vec<Dependency<'g>> = self
            .graph
            .graph
            .edges_directed(self.node, Direction::Outgoing)
            .map(|edge| Dependency {
                origin: *self,
                target: self.graph.view(edge.target()),
                kind: *edge.weight(),
            })
            .collect();
        dependencies.sort_by(|a, b| (a.target.name(), a.kind).cmp(&(b.target.name(), b.kind)));
        dependencies
    }

    /// Incoming references from imported classes; external stubs have none
    pub fn dependents(&self) -> Vec<Dependency<'g>> {
        if !self.is_resolved() {
            return Vec::new();
        }
        let mut dependents: Vec<Dependency<'g>> = self
            .graph
            .graph
            .edges_directed(self.node, Direction::Incoming)
            .map(|edge| Dependency {
                origin: self.graph.view(edge.source()),
                target: *self,
                kind: *edge.weight(),
            })
            .filter(|dependency| dependency.origin.is_resolved())
            .collect();
        dependents.sort_by(|a, b| (a.origin.name(), a.kind).cmp(&(b.origin.name(), b.kind)));
        dependents
    }

    fn dependents_of_kind(&self, kind: DependencyKind) -> Vec<ClassRef<'g>> {
        self.dependents()
            .into_iter()
            .filter(|dependency| dependency.kind == kind)
            .map(|dependency| dependency.origin)
            .collect()
    }

    /// Imported classes extending this class directly
    pub fn subclasses(&self) -> Vec<ClassRef<'g>> {
        self.dependents_of_kind(DependencyKind::Extends)
    }

    /// Imported classes implementing this interface directly
    pub fn implementations(&self) -> Vec<ClassRef<'g>> {
        self.dependents_of_kind(DependencyKind::Implements)
    }

    /// Package holding this class; `None` for external stubs
    pub fn package(&self) -> Option<PackageRef<'g>> {
        if !self.is_resolved() {
            return None;
        }
        self.graph.package(self.package_name()).ok()
    }
}

impl PartialEq for ClassRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.node == other.node
    }
}

impl Eq for ClassRef<'_> {}

impl fmt::Debug for ClassRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRef")
            .field("name", &self.name())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl fmt::Display for ClassRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Borrowed view of one package node
#[derive(Clone, Copy)]
pub struct PackageRef<'g> {
    graph: &'g ImportedGraph,
    package: &'g Package,
}

impl<'g> PackageRef<'g> {
    pub fn name(&self) -> &'g str {
        self.package.name()
    }

    pub fn full_name(&self) -> &'g str {
        self.package.full_name()
    }

    pub fn parent(&self) -> Option<PackageRef<'g>> {
        let parent = self.package.parent_name()?;
        self.graph.root.find(parent).map(|package| PackageRef {
            graph: self.graph,
            package,
        })
    }

    pub fn subpackages(&self) -> Vec<PackageRef<'g>> {
        self.package
            .subpackages()
            .map(|package| PackageRef {
                graph: self.graph,
                package,
            })
            .collect()
    }

    /// Descendant by dotted path relative to this package
    pub fn get_package(&self, relative: &str) -> Result<PackageRef<'g>> {
        self.package
            .find(relative)
            .map(|package| PackageRef {
                graph: self.graph,
                package,
            })
            .ok_or_else(|| ImportError::PackageNotFound {
                name: join_name(self.full_name(), relative),
            })
    }

    pub fn contains_package(&self, relative: &str) -> bool {
        self.package.find(relative).is_some()
    }

    /// Classes directly in this package
    pub fn classes(&self) -> Vec<ClassRef<'g>> {
        self.package
            .class_names()
            .filter_map(|name| self.graph.get(name))
            .collect()
    }

    /// Classes of this package and every subpackage
    pub fn all_classes(&self) -> Vec<ClassRef<'g>> {
        self.package
            .all_class_names()
            .into_iter()
            .filter_map(|name| self.graph.get(name))
            .collect()
    }

    pub fn contains_class(&self, simple_name: &str) -> bool {
        self.package
            .contains_class(&join_name(self.full_name(), simple_name))
    }

    /// The imported `package-info` class of this package
    pub fn package_info(&self) -> Option<ClassRef<'g>> {
        self.graph
            .get(&join_name(self.full_name(), "package-info"))
    }
}

impl PartialEq for PackageRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.package, other.package)
    }
}

impl fmt::Debug for PackageRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageRef")
            .field("full_name", &self.full_name())
            .finish()
    }
}

fn join_name(parent: &str, child: &str) -> String {
    match (parent.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (false, true) => parent.to_string(),
        (false, false) => format!("{}.{}", parent, child),
    }
}
