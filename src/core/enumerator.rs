//! Source enumeration
//!
//! Turns import roots (directories, archives, class files, packages,
//! the classpath, runtime modules) into filtered [`Location`]s. Every call
//! starts from scratch and keeps no iteration state between calls.
//!
//! Locations come out in a stable order: roots in the order requested,
//! directory entries sorted by file name, archive entries sorted by name,
//! runtime modules sorted by module name. Duplicate resolution relies on it.

use crate::core::archive::{is_archive, ArchiveReader};
use crate::core::classpath::{Classpath, ModuleSource, RuntimeModule, RuntimeModuleStore};
use crate::core::filter::{ImportFilter, ImportFilters, ModuleFilter};
use crate::error::{ImportError, Result};
use crate::models::config::Settings;
use crate::models::location::{absolute_path, Location, Storage, CLASS_FILE_EXTENSION};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MODULE_INFO: &str = "module-info.class";
const JMOD_CLASSES_PREFIX: &str = "classes/";

/// Outcome of one enumeration pass
#[derive(Debug, Default)]
pub struct Enumeration {
    /// Included locations in enumeration order
    pub locations: Vec<Location>,
    /// Recoverable failures: unreadable roots, directories or nested archives
    pub failures: Vec<ImportError>,
    /// Number of locations rejected by the filters
    pub excluded: usize,
    /// Number of locations reached again through overlapping roots
    pub repeated: usize,
    seen: HashSet<String>,
}

impl Enumeration {
    /// Keep `location` unless the filters reject it or its URI was already
    /// enumerated; the first occurrence keeps its position
    pub(crate) fn push(&mut self, location: Location, filters: &ImportFilters) {
        if self.seen.contains(location.uri()) {
            self.repeated += 1;
        } else if filters.includes(&location) {
            self.seen.insert(location.uri().to_string());
            self.locations.push(location);
        } else {
            self.excluded += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// One requested source root
#[derive(Debug, Clone)]
enum Root {
    /// Directory, archive or single class file, optionally restricted to a
    /// package subtree (`p/q/`)
    Path {
        path: PathBuf,
        prefix: Option<String>,
    },
    Module {
        store_root: PathBuf,
        module: RuntimeModule,
        prefix: Option<String>,
    },
}

impl Root {
    fn describe(&self) -> String {
        match self {
            Root::Path { path, .. } => path.display().to_string(),
            Root::Module { module, .. } => format!("jrt:/{}", module.name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceEnumerator {
    filters: ImportFilters,
    follow_links: bool,
    max_depth: Option<usize>,
}

impl SourceEnumerator {
    pub fn new(filters: ImportFilters) -> Self {
        Self {
            filters,
            follow_links: false,
            max_depth: None,
        }
    }

    /// Enumerator honouring the traversal settings
    pub fn with_settings(filters: ImportFilters, settings: &Settings) -> Self {
        Self {
            filters,
            follow_links: settings.follow_links,
            max_depth: settings.max_depth,
        }
    }

    pub fn filters(&self) -> &ImportFilters {
        &self.filters
    }

    /// Walk each directory, archive or class file given
    pub fn enumerate_roots<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Enumeration> {
        let roots = paths
            .iter()
            .map(|path| Root::Path {
                path: absolute_path(path.as_ref()),
                prefix: None,
            })
            .collect();
        self.enumerate(roots, || describe_paths(paths))
    }

    /// Classpath roots and runtime modules, without archive-origin locations
    pub fn enumerate_classpath(
        &self,
        classpath: &Classpath,
        store: Option<&RuntimeModuleStore>,
    ) -> Result<Enumeration> {
        let restricted = Self {
            filters: self.filters.clone().with(ImportFilter::DoNotIncludeArchives),
            ..self.clone()
        };
        restricted.enumerate_entire_classpath(classpath, store)
    }

    /// Classpath roots, including archives, followed by every runtime module
    pub fn enumerate_entire_classpath(
        &self,
        classpath: &Classpath,
        store: Option<&RuntimeModuleStore>,
    ) -> Result<Enumeration> {
        let mut roots: Vec<Root> = classpath
            .roots()
            .iter()
            .map(|path| Root::Path {
                path: path.clone(),
                prefix: None,
            })
            .collect();
        if let Some(store) = store {
            roots.extend(module_roots(store, &ModuleFilter::All, None));
        }
        self.enumerate(roots, || "the classpath".to_string())
    }

    /// The subtrees of the named packages in every classpath root and
    /// runtime module
    pub fn enumerate_packages<S: AsRef<str>>(
        &self,
        classpath: &Classpath,
        store: Option<&RuntimeModuleStore>,
        packages: &[S],
    ) -> Result<Enumeration> {
        let mut roots = Vec::new();
        for package in packages {
            let prefix = package_prefix(package.as_ref());
            roots.extend(classpath.roots().iter().map(|path| Root::Path {
                path: path.clone(),
                prefix: Some(prefix.clone()),
            }));
            if let Some(store) = store {
                roots.extend(module_roots(store, &ModuleFilter::All, Some(prefix.as_str())));
            }
        }
        self.enumerate(roots, || {
            let names: Vec<&str> = packages.iter().map(AsRef::as_ref).collect();
            format!("packages [{}]", names.join(", "))
        })
    }

    /// Every module of the store accepted by `modules`
    pub fn enumerate_runtime_modules(
        &self,
        store: &RuntimeModuleStore,
        modules: &ModuleFilter,
    ) -> Result<Enumeration> {
        let roots = module_roots(store, modules, None).collect();
        self.enumerate(roots, || store.describe())
    }

    fn enumerate<D>(&self, roots: Vec<Root>, describe: D) -> Result<Enumeration>
    where
        D: FnOnce() -> String,
    {
        let mut enumeration = Enumeration::default();
        let mut readable = 0;

        for root in &roots {
            tracing::debug!(root = %root.describe(), "Enumerating root");
            let result = match root {
                Root::Path { path, prefix } => {
                    self.enumerate_path(path, prefix.as_deref(), &mut enumeration)
                }
                Root::Module {
                    store_root,
                    module,
                    prefix,
                } => self.enumerate_module(store_root, module, prefix.as_deref(), &mut enumeration),
            };
            match result {
                Ok(()) => readable += 1,
                Err(err) => {
                    tracing::warn!(root = %root.describe(), error = %err, "Skipping unreadable root");
                    enumeration
                        .failures
                        .push(ImportError::unreadable(root.describe(), err));
                }
            }
        }

        if readable == 0 {
            return Err(ImportError::NoImportableLocations {
                requested: describe(),
            });
        }

        tracing::debug!(
            locations = enumeration.locations.len(),
            excluded = enumeration.excluded,
            repeated = enumeration.repeated,
            failures = enumeration.failures.len(),
            "Enumeration finished"
        );
        Ok(enumeration)
    }

    fn enumerate_path(&self, path: &Path, prefix: Option<&str>, out: &mut Enumeration) -> Result<()> {
        let metadata = std::fs::metadata(path)?;
        if metadata.is_dir() {
            self.walk_directory(path, prefix, out)
        } else if is_archive(path) {
            self.read_archive(path, prefix.unwrap_or(""), out)
        } else if is_class_file(path) {
            // A single class file belongs to no package subtree
            if prefix.is_none() {
                let parent = path.parent().unwrap_or_else(|| Path::new(""));
                out.push(Location::file(parent, path), &self.filters);
            }
            Ok(())
        } else {
            Err(ImportError::InvalidPath {
                path: path.to_path_buf(),
            })
        }
    }

    /// Walk `root` (or its `prefix` subtree) in file-name order; class files
    /// become file locations and archives found on the way are expanded
    fn walk_directory(&self, root: &Path, prefix: Option<&str>, out: &mut Enumeration) -> Result<()> {
        let start = match prefix {
            Some(prefix) => root.join(prefix),
            None => root.to_path_buf(),
        };
        if !start.is_dir() {
            // The package simply is not present in this root
            return Ok(());
        }

        for entry in self.walker(&start) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let location = err
                        .path()
                        .map(|path| path.display().to_string())
                        .unwrap_or_else(|| start.display().to_string());
                    out.failures.push(ImportError::unreadable(location, err));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if is_class_file(path) {
                if is_module_info(path) {
                    continue;
                }
                out.push(Location::file(root, path), &self.filters);
            } else if is_archive(path) && prefix.is_none() {
                if let Err(err) = self.read_archive(path, "", out) {
                    out.failures
                        .push(ImportError::unreadable(path.display().to_string(), err));
                }
            }
        }
        Ok(())
    }

    fn walker(&self, start: &Path) -> walkdir::IntoIter {
        let mut walker = WalkDir::new(start)
            .follow_links(self.follow_links)
            .sort_by_file_name();
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }
        walker.into_iter()
    }

    /// Class entries of a jar or zip archive; the handle is released when
    /// this returns
    fn read_archive(&self, path: &Path, prefix: &str, out: &mut Enumeration) -> Result<()> {
        let reader = ArchiveReader::open(path)?;
        for name in reader.class_entries(prefix) {
            out.push(Location::jar_entry(path, &name), &self.filters);
        }
        Ok(())
    }

    fn enumerate_module(
        &self,
        store_root: &Path,
        module: &RuntimeModule,
        prefix: Option<&str>,
        out: &mut Enumeration,
    ) -> Result<()> {
        match &module.source {
            ModuleSource::Exploded(dir) => {
                let start = match prefix {
                    Some(prefix) => dir.join(prefix),
                    None => dir.clone(),
                };
                if !start.is_dir() {
                    return Ok(());
                }
                for entry in self.walker(&start) {
                    let entry = match entry {
                        Ok(entry) => entry,
                        Err(err) => {
                            out.failures
                                .push(ImportError::unreadable(format!("jrt:/{}", module.name), err));
                            continue;
                        }
                    };
                    let path = entry.path();
                    if !entry.file_type().is_file() || !is_class_file(path) || is_module_info(path) {
                        continue;
                    }
                    let relative = path.strip_prefix(dir).map_err(|_| ImportError::InvalidPath {
                        path: path.to_path_buf(),
                    })?;
                    let location = Location::runtime_module(
                        store_root,
                        &module.name,
                        &entry_name(relative),
                        Storage::Loose(path.to_path_buf()),
                    );
                    out.push(location, &self.filters);
                }
                Ok(())
            }
            ModuleSource::Jmod(archive) => {
                let reader = ArchiveReader::open(archive)?;
                let prefix = format!("{}{}", JMOD_CLASSES_PREFIX, prefix.unwrap_or(""));
                for name in reader.class_entries(&prefix) {
                    let entry = &name[JMOD_CLASSES_PREFIX.len()..];
                    let location = Location::runtime_module(
                        store_root,
                        &module.name,
                        entry,
                        Storage::ArchiveEntry {
                            archive: archive.clone(),
                            name: name.clone(),
                        },
                    );
                    out.push(location, &self.filters);
                }
                Ok(())
            }
        }
    }
}

fn module_roots<'a>(
    store: &'a RuntimeModuleStore,
    filter: &'a ModuleFilter,
    prefix: Option<&'a str>,
) -> impl Iterator<Item = Root> + 'a {
    store
        .modules()
        .iter()
        .filter(move |module| filter.includes(&module.name))
        .map(move |module| Root::Module {
            store_root: store.root().to_path_buf(),
            module: module.clone(),
            prefix: prefix.map(str::to_string),
        })
}

/// `p.q` becomes `p/q/`, so that `p.q` never matches `p/qr`
pub fn package_prefix(package: &str) -> String {
    let trimmed = package.trim_matches('.');
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{}/", trimmed.replace('.', "/"))
}

fn describe_paths<P: AsRef<Path>>(paths: &[P]) -> String {
    if paths.is_empty() {
        return "an empty list of roots".to_string();
    }
    paths
        .iter()
        .map(|path| path.as_ref().display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_class_file(path: &Path) -> bool {
    path.to_string_lossy().ends_with(CLASS_FILE_EXTENSION)
}

fn is_module_info(path: &Path) -> bool {
    path.file_name().map(|name| name == MODULE_INFO).unwrap_or(false)
}

fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
