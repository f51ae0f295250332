//! Location filters
//!
//! Filters look at a location's identity only (URI, kind, module) and never
//! open its bytes. All filters registered for one import are combined with
//! AND; an empty filter set includes everything.

use crate::error::Result;
use crate::models::config::Settings;
use crate::models::location::Location;
use glob::Pattern;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Name of the base runtime module every other module depends on
pub const BASE_MODULE: &str = "java.base";

const PACKAGE_INFO_ENTRY: &str = "package-info.class";

/// Predicate over locations
pub trait LocationFilter: Send + Sync {
    fn includes(&self, location: &Location) -> bool;
}

impl<F> LocationFilter for F
where
    F: Fn(&Location) -> bool + Send + Sync,
{
    fn includes(&self, location: &Location) -> bool {
        self(location)
    }
}

/// Built-in filter presets
#[derive(Debug, Clone)]
pub enum ImportFilter {
    /// Drop jar entries and runtime-module entries
    DoNotIncludeArchives,
    DoNotIncludeJars,
    DoNotIncludeRuntimeModules,
    /// Drop locations under Maven, Gradle or IntelliJ test output directories
    DoNotIncludeTests,
    OnlyIncludeTests,
    DoNotIncludePackageInfos,
    /// Drop locations whose URI matches any of the patterns
    ExcludePatterns(Vec<Pattern>),
    /// Keep only runtime-module entries of the named modules
    OnlyModules(BTreeSet<String>),
}

impl ImportFilter {
    pub fn exclude_patterns<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let compiled = patterns
            .into_iter()
            .map(|pattern| Pattern::new(pattern.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ImportFilter::ExcludePatterns(compiled))
    }

    pub fn only_modules<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ImportFilter::OnlyModules(modules.into_iter().map(Into::into).collect())
    }

    /// Keep only classes of the base runtime module
    pub fn only_base_module() -> Self {
        Self::only_modules([BASE_MODULE])
    }
}

impl LocationFilter for ImportFilter {
    fn includes(&self, location: &Location) -> bool {
        match self {
            ImportFilter::DoNotIncludeArchives => !location.is_archive(),
            ImportFilter::DoNotIncludeJars => !location.is_jar(),
            ImportFilter::DoNotIncludeRuntimeModules => !location.is_runtime_module(),
            ImportFilter::DoNotIncludeTests => !is_test_location(location.uri()),
            ImportFilter::OnlyIncludeTests => is_test_location(location.uri()),
            ImportFilter::DoNotIncludePackageInfos => !is_package_info(location.entry()),
            ImportFilter::ExcludePatterns(patterns) => {
                !patterns.iter().any(|pattern| location.matches(pattern))
            }
            ImportFilter::OnlyModules(modules) => location
                .module()
                .map(|module| modules.contains(module))
                .unwrap_or(false),
        }
    }
}

/// Ordered set of filters combined with AND
#[derive(Clone, Default)]
pub struct ImportFilters {
    filters: Vec<Arc<dyn LocationFilter>>,
}

impl ImportFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters derived from the exclusion settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut filters = Self::new();
        if !settings.exclude_patterns.is_empty() {
            filters.push(ImportFilter::exclude_patterns(&settings.exclude_patterns)?);
        }
        if settings.exclude_tests {
            filters.push(ImportFilter::DoNotIncludeTests);
        }
        if settings.exclude_package_infos {
            filters.push(ImportFilter::DoNotIncludePackageInfos);
        }
        Ok(filters)
    }

    pub fn with(mut self, filter: impl LocationFilter + 'static) -> Self {
        self.push(filter);
        self
    }

    pub fn with_fn<F>(self, predicate: F) -> Self
    where
        F: Fn(&Location) -> bool + Send + Sync + 'static,
    {
        self.with(predicate)
    }

    pub fn push(&mut self, filter: impl LocationFilter + 'static) {
        self.filters.push(Arc::new(filter));
    }

    /// This set followed by every filter of `other`
    pub fn extend(mut self, other: &ImportFilters) -> Self {
        self.filters.extend(other.filters.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn includes(&self, location: &Location) -> bool {
        self.filters.iter().all(|filter| filter.includes(location))
    }
}

impl fmt::Debug for ImportFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportFilters")
            .field("filters", &self.filters.len())
            .finish()
    }
}

/// Restricts which runtime modules are opened at all
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModuleFilter {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl ModuleFilter {
    pub fn only<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ModuleFilter::Only(modules.into_iter().map(Into::into).collect())
    }

    pub fn base_only() -> Self {
        Self::only([BASE_MODULE])
    }

    pub fn includes(&self, module: &str) -> bool {
        match self {
            ModuleFilter::All => true,
            ModuleFilter::Only(modules) => modules.contains(module),
        }
    }
}

/// Whether a URI points into a test output directory of a common build layout
pub fn is_test_location(uri: &str) -> bool {
    if uri.contains("/target/test-classes/") || uri.contains("/out/test/") {
        return true;
    }
    // Gradle: build/classes/test/ or build/classes/<language>/test/
    let mut rest = uri;
    while let Some(pos) = rest.find("/build/classes/") {
        let after = &rest[pos + "/build/classes/".len()..];
        if after.starts_with("test/") {
            return true;
        }
        if let Some((_, tail)) = after.split_once('/') {
            if tail.starts_with("test/") {
                return true;
            }
        }
        rest = after;
    }
    false
}

fn is_package_info(entry: &str) -> bool {
    entry == PACKAGE_INFO_ENTRY || entry.ends_with(&format!("/{}", PACKAGE_INFO_ENTRY))
}
