//! Classpath and runtime module store discovery
//!
//! Both are collected once, at enumeration time, into immutable lists; nothing
//! reads ambient process state afterwards.

use crate::core::archive::is_jmod;
use crate::error::{ImportError, Result};
use crate::models::config::Settings;
use crate::models::location::absolute_path;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CLASSPATH_ENV: &str = "CLASSPATH";
pub const JAVA_HOME_ENV: &str = "JAVA_HOME";
/// Packed jimage of a runtime installation, not readable here
pub const PACKED_IMAGE: &str = "lib/modules";

/// Ordered, duplicate-free list of classpath roots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classpath {
    roots: Vec<PathBuf>,
}

impl Classpath {
    /// Roots are made absolute before wildcard expansion and deduplication,
    /// so `lib` and `./lib` name the same root
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut seen = HashSet::new();
        let mut roots = Vec::new();
        let entries = entries
            .into_iter()
            .filter(|entry| !entry.as_os_str().is_empty())
            .map(|entry| absolute_path(&entry))
            .flat_map(expand_wildcard);
        for entry in entries {
            if seen.insert(entry.clone()) {
                roots.push(entry);
            }
        }
        Self { roots }
    }

    /// Roots from the `CLASSPATH` environment variable
    pub fn from_env() -> Self {
        match env::var_os(CLASSPATH_ENV) {
            Some(value) => Self::new(env::split_paths(&value)),
            None => Self::default(),
        }
    }

    /// Explicit roots from the settings, falling back to the environment
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.classpath.is_empty() {
            Self::from_env()
        } else {
            Self::new(settings.classpath.iter().cloned())
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// A `dir/*` entry stands for every jar in `dir`, in name order
fn expand_wildcard(entry: PathBuf) -> Vec<PathBuf> {
    if entry.file_name().map(|name| name != "*").unwrap_or(true) {
        return vec![entry];
    }
    let dir = entry.parent().unwrap_or_else(|| Path::new("."));
    let pattern = dir.join("*.[jJ][aA][rR]");
    let mut jars: Vec<PathBuf> = match glob::glob(&pattern.to_string_lossy()) {
        Ok(paths) => paths.filter_map(|path| path.ok()).collect(),
        Err(err) => {
            tracing::warn!(entry = %entry.display(), error = %err, "Ignoring classpath wildcard");
            Vec::new()
        }
    };
    jars.sort();
    jars
}

/// Physical layout of one runtime module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSource {
    /// `jmods/<module>.jmod`, a zip archive with class entries under `classes/`
    Jmod(PathBuf),
    /// `modules/<module>/`, an exploded module directory
    Exploded(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeModule {
    pub name: String,
    pub source: ModuleSource,
}

/// Built-in module repository of a Java runtime installation
#[derive(Debug, Clone)]
pub struct RuntimeModuleStore {
    root: PathBuf,
    modules: Vec<RuntimeModule>,
    packed_image: bool,
}

impl RuntimeModuleStore {
    /// Store root from the settings, falling back to `JAVA_HOME`
    pub fn locate(settings: &Settings) -> Option<PathBuf> {
        settings
            .java_home
            .clone()
            .or_else(|| env::var_os(JAVA_HOME_ENV).map(PathBuf::from))
    }

    /// Scan `java_home` for exploded modules and `.jmod` files. A module
    /// present in both layouts is taken from the exploded directory.
    pub fn discover(java_home: &Path) -> Result<Self> {
        if !java_home.is_dir() {
            return Err(ImportError::InvalidPath {
                path: java_home.to_path_buf(),
            });
        }

        let mut modules: Vec<RuntimeModule> = Vec::new();
        let mut names = HashSet::new();

        let exploded = java_home.join("modules");
        if exploded.is_dir() {
            for path in sorted_children(&exploded)? {
                if !path.is_dir() {
                    continue;
                }
                if let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) {
                    if names.insert(name.clone()) {
                        modules.push(RuntimeModule {
                            name,
                            source: ModuleSource::Exploded(path),
                        });
                    }
                }
            }
        }

        let jmods = java_home.join("jmods");
        if jmods.is_dir() {
            for path in sorted_children(&jmods)? {
                if !is_jmod(&path) {
                    continue;
                }
                if let Some(name) = path.file_stem().map(|n| n.to_string_lossy().to_string()) {
                    if names.insert(name.clone()) {
                        modules.push(RuntimeModule {
                            name,
                            source: ModuleSource::Jmod(path),
                        });
                    }
                }
            }
        }

        modules.sort_by(|a, b| a.name.cmp(&b.name));
        let packed_image = java_home.join(PACKED_IMAGE).is_file();
        tracing::debug!(
            root = %java_home.display(),
            modules = modules.len(),
            packed_image,
            "Discovered runtime module store"
        );
        if modules.is_empty() && packed_image {
            tracing::warn!(
                root = %java_home.display(),
                "Only the packed lib/modules jimage is present and it is not read; \
                 runtime modules need an exploded modules/ directory or jmods/"
            );
        }

        Ok(Self {
            root: java_home.to_path_buf(),
            modules,
            packed_image,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Modules in name order
    pub fn modules(&self) -> &[RuntimeModule] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&RuntimeModule> {
        self.modules.iter().find(|module| module.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// True when the only module content is the packed `lib/modules` image
    pub fn is_packed_only(&self) -> bool {
        self.modules.is_empty() && self.packed_image
    }

    /// What an import of this store covers, for error messages
    pub fn describe(&self) -> String {
        if self.is_packed_only() {
            format!(
                "runtime modules of {} (only the packed {} image is present, which is not supported)",
                self.root.display(),
                PACKED_IMAGE
            )
        } else {
            format!("runtime modules of {}", self.root.display())
        }
    }
}

fn sorted_children(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut children = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .collect::<Vec<_>>();
    children.sort();
    Ok(children)
}
