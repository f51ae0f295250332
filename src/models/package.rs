//! Package namespace tree
//!
//! Packages own their subpackages; the parent of a package is recovered by
//! truncating its full name, so the tree never holds upward references.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Last segment of the name; empty for the root (default) package
    name: String,
    full_name: String,
    subpackages: BTreeMap<String, Package>,
    /// Fully-qualified names of the classes directly in this package
    classes: BTreeSet<String>,
}

impl Package {
    /// The unnamed root package
    pub fn root() -> Self {
        Self::default()
    }

    fn child_of(parent: &str, segment: &str) -> Self {
        let full_name = if parent.is_empty() {
            segment.to_string()
        } else {
            format!("{}.{}", parent, segment)
        };
        Self {
            name: segment.to_string(),
            full_name,
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn is_root(&self) -> bool {
        self.full_name.is_empty()
    }

    /// Full name of the enclosing package; `None` for the root
    pub fn parent_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        Some(
            self.full_name
                .rsplit_once('.')
                .map(|(parent, _)| parent)
                .unwrap_or(""),
        )
    }

    /// Get or create the direct subpackage named `segment`
    pub(crate) fn subpackage_mut(&mut self, segment: &str) -> &mut Package {
        let parent = self.full_name.clone();
        self.subpackages
            .entry(segment.to_string())
            .or_insert_with(|| Package::child_of(&parent, segment))
    }

    pub(crate) fn add_class(&mut self, class_name: &str) {
        self.classes.insert(class_name.to_string());
    }

    /// Look up a descendant by a dotted path relative to this package; the
    /// empty path denotes this package
    pub fn find(&self, relative: &str) -> Option<&Package> {
        if relative.is_empty() {
            return Some(self);
        }
        relative
            .split('.')
            .try_fold(self, |package, segment| package.subpackages.get(segment))
    }

    pub fn subpackages(&self) -> impl Iterator<Item = &Package> {
        self.subpackages.values()
    }

    /// Classes directly in this package, in name order
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    /// Classes of this package and all its descendants, in name order
    pub fn all_class_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_class_names(&mut names);
        names.sort_unstable();
        names
    }

    fn collect_class_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.extend(self.class_names());
        for package in self.subpackages.values() {
            package.collect_class_names(out);
        }
    }

    pub fn contains_class(&self, class_name: &str) -> bool {
        self.classes.contains(class_name)
    }
}
