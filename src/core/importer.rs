//! Import entry points
//!
//! Every import runs the same pipeline: enumerate filtered locations, parse
//! them (in parallel), stage the descriptors and resolve them into an
//! [`ImportedGraph`]. Each call builds its own staging pool and graph; an
//! importer can be reused and shared between threads.

use crate::core::classpath::{Classpath, RuntimeModuleStore};
use crate::core::enumerator::{Enumeration, SourceEnumerator};
use crate::core::filter::{ImportFilters, LocationFilter, ModuleFilter};
use crate::core::graph_builder::GraphBuilder;
use crate::core::parallel::{ParsePhase, ProgressCallback, ProgressUpdate};
use crate::error::{log_error, ImportError, Result};
use crate::models::config::Settings;
use crate::models::descriptor::package_of;
use crate::models::graph::ImportedGraph;
use crate::models::location::Location;
use crate::models::report::ImportReport;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Imports class files into a resolved class graph
#[derive(Clone)]
pub struct ClassFileImporter {
    settings: Settings,
    filters: ImportFilters,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl ClassFileImporter {
    /// Importer with default settings and no filters
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            filters: ImportFilters::new(),
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Importer whose filters start from the exclusion settings
    pub fn with_settings(settings: Settings) -> Result<Self> {
        let filters = ImportFilters::from_settings(&settings)?;
        Ok(Self {
            settings,
            filters,
            ..Self::new()
        })
    }

    /// Add a filter; all filters must include a location for it to be imported
    pub fn with_filter(mut self, filter: impl LocationFilter + 'static) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_filters(mut self, filters: &ImportFilters) -> Self {
        self.filters = self.filters.extend(filters);
        self
    }

    /// Report parse progress to `callback`, possibly from worker threads
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Use `token` to cancel imports started by this importer
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn filters(&self) -> &ImportFilters {
        &self.filters
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Import exactly the given locations, minus those the filters reject
    /// and repeats of an earlier URI. An empty list yields an empty graph.
    pub fn import_locations<I>(&self, locations: I) -> Result<ImportedGraph>
    where
        I: IntoIterator<Item = Location>,
    {
        let started = Instant::now();
        let mut enumeration = Enumeration::default();
        for location in locations {
            enumeration.push(location, &self.filters);
        }
        Ok(self.import(enumeration, started))
    }

    /// Import directories, archives and single class files
    pub fn import_roots<P: AsRef<Path>>(&self, paths: &[P]) -> Result<ImportedGraph> {
        let started = Instant::now();
        let enumeration = self.enumerator().enumerate_roots(paths)?;
        Ok(self.import(enumeration, started))
    }

    pub fn import_path<P: AsRef<Path>>(&self, path: P) -> Result<ImportedGraph> {
        self.import_roots(&[path])
    }

    pub fn import_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<ImportedGraph> {
        self.import_roots(paths)
    }

    pub fn import_archive<P: AsRef<Path>>(&self, path: P) -> Result<ImportedGraph> {
        self.import_roots(&[path])
    }

    pub fn import_archives<P: AsRef<Path>>(&self, paths: &[P]) -> Result<ImportedGraph> {
        self.import_roots(paths)
    }

    /// Import the classpath without archive-origin locations
    pub fn import_classpath(&self) -> Result<ImportedGraph> {
        let started = Instant::now();
        let classpath = Classpath::from_settings(&self.settings);
        // Runtime modules are archive-origin and would be dropped anyway
        let enumeration = self.enumerator().enumerate_classpath(&classpath, None)?;
        Ok(self.import(enumeration, started))
    }

    /// Import the classpath with `extra` filters instead of the default
    /// archive exclusion
    pub fn import_classpath_with(&self, extra: &ImportFilters) -> Result<ImportedGraph> {
        self.clone().with_filters(extra).import_entire_classpath()
    }

    /// Import every classpath root, archives included, and every runtime module
    pub fn import_entire_classpath(&self) -> Result<ImportedGraph> {
        let started = Instant::now();
        let classpath = Classpath::from_settings(&self.settings);
        let store = self.runtime_store();
        let enumeration = self
            .enumerator()
            .enumerate_entire_classpath(&classpath, store.as_ref())?;
        Ok(self.import(enumeration, started))
    }

    /// Import the named packages, including their subpackages, from the
    /// classpath and the runtime module store
    pub fn import_packages<S: AsRef<str>>(&self, packages: &[S]) -> Result<ImportedGraph> {
        let started = Instant::now();
        let classpath = Classpath::from_settings(&self.settings);
        let store = self.runtime_store();
        let enumeration = self
            .enumerator()
            .enumerate_packages(&classpath, store.as_ref(), packages)?;
        Ok(self.import(enumeration, started))
    }

    pub fn import_package(&self, package: &str) -> Result<ImportedGraph> {
        self.import_packages(&[package])
    }

    /// Import the packages owning the given fully-qualified class names
    pub fn import_classes_of<I, S>(&self, class_names: I) -> Result<ImportedGraph>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let packages: BTreeSet<String> = class_names
            .into_iter()
            .map(|name| package_of(name.as_ref()).to_string())
            .collect();
        let packages: Vec<String> = packages.into_iter().collect();
        self.import_packages(&packages)
    }

    /// Import the runtime modules accepted by `modules`
    pub fn import_runtime_modules(&self, modules: &ModuleFilter) -> Result<ImportedGraph> {
        let started = Instant::now();
        let store = match self.runtime_store() {
            Some(store) => store,
            None => {
                return Err(ImportError::NoImportableLocations {
                    requested: "the runtime module store".to_string(),
                })
            }
        };
        let enumeration = self
            .enumerator()
            .enumerate_runtime_modules(&store, modules)?;
        Ok(self.import(enumeration, started))
    }

    fn enumerator(&self) -> SourceEnumerator {
        SourceEnumerator::with_settings(self.filters.clone(), &self.settings)
    }

    fn runtime_store(&self) -> Option<RuntimeModuleStore> {
        let java_home: PathBuf = RuntimeModuleStore::locate(&self.settings)?;
        match RuntimeModuleStore::discover(&java_home) {
            Ok(store) => Some(store),
            Err(err) => {
                tracing::warn!(
                    java_home = %java_home.display(),
                    error = %err,
                    "Ignoring unusable runtime module store"
                );
                None
            }
        }
    }

    fn import(&self, enumeration: Enumeration, started: Instant) -> ImportedGraph {
        let mut report = ImportReport::new();
        report.summary.locations_enumerated = enumeration.locations.len();
        for failure in enumeration.failures {
            record(&mut report, failure);
        }

        tracing::debug!(
            locations = enumeration.locations.len(),
            excluded = enumeration.excluded,
            repeated = enumeration.repeated,
            "Parsing class files"
        );
        let outcome = ParsePhase::new(self.settings.effective_worker_threads(), &self.cancel)
            .with_progress(self.progress.as_ref())
            .run(&enumeration.locations);

        report.summary.classes_parsed = outcome.descriptors.len();
        report.complete = outcome.is_complete();
        if !report.complete {
            tracing::warn!(skipped = outcome.skipped, "Import cancelled, graph is partial");
        }
        for failure in outcome.failures {
            record(&mut report, failure);
        }

        let mut builder = GraphBuilder::new();
        for descriptor in outcome.descriptors {
            if let Some(duplicate) = builder.stage(descriptor) {
                record(&mut report, duplicate);
            }
        }

        let mut graph = builder.build(report);
        let report = graph.report_mut();
        report.set_duration(started.elapsed());
        tracing::info!(
            classes = report.summary.classes_imported,
            external = report.summary.external_classes,
            duplicates = report.summary.duplicates_ignored,
            failures = report.summary.failures,
            complete = report.complete,
            duration_ms = report.summary.duration.as_millis() as u64,
            "Import finished"
        );
        graph
    }
}

impl Default for ClassFileImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClassFileImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassFileImporter")
            .field("settings", &self.settings)
            .field("filters", &self.filters)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

fn record(report: &mut ImportReport, error: ImportError) {
    report.record(&error);
    // Per-location failures are never critical
    let _ = log_error(error);
}
