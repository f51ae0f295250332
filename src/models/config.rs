//! Configuration-related data structures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration settings for the importer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Explicit classpath roots; empty means the `CLASSPATH` environment variable
    pub classpath: Vec<PathBuf>,

    /// Root of the runtime module store; unset means `JAVA_HOME`
    pub java_home: Option<PathBuf>,

    /// Glob patterns matched against location URIs; matches are excluded
    pub exclude_patterns: Vec<String>,

    /// Whether to skip test output directories
    pub exclude_tests: bool,

    /// Whether to skip `package-info` class files
    pub exclude_package_infos: bool,

    /// Whether to parse class files on a worker pool
    pub parallel: bool,

    /// Size of the worker pool; defaults to the number of available cores
    pub worker_threads: Option<usize>,

    /// Whether to follow symbolic links during directory traversal
    pub follow_links: bool,

    /// Maximum directory depth to traverse
    pub max_depth: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            classpath: Vec::new(),
            java_home: None,
            exclude_patterns: Vec::new(),
            exclude_tests: false,
            exclude_package_infos: false,
            parallel: true,
            worker_threads: None,
            follow_links: false,
            max_depth: None,
        }
    }
}

impl Settings {
    /// Effective size of the parse worker pool
    pub fn effective_worker_threads(&self) -> usize {
        if !self.parallel {
            return 1;
        }
        self.worker_threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// Partial settings for configuration merging
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialSettings {
    pub classpath: Option<Vec<PathBuf>>,
    pub java_home: Option<PathBuf>,
    pub exclude_patterns: Option<Vec<String>>,
    pub exclude_tests: Option<bool>,
    pub exclude_package_infos: Option<bool>,
    pub parallel: Option<bool>,
    pub worker_threads: Option<usize>,
    pub follow_links: Option<bool>,
    pub max_depth: Option<usize>,
}

impl PartialSettings {
    /// Merge another PartialSettings into this one
    /// Fields from `other` take precedence over existing fields
    pub fn merge_from(&mut self, other: PartialSettings) {
        if other.classpath.is_some() {
            self.classpath = other.classpath;
        }
        if other.java_home.is_some() {
            self.java_home = other.java_home;
        }
        if other.exclude_patterns.is_some() {
            self.exclude_patterns = other.exclude_patterns;
        }
        if other.exclude_tests.is_some() {
            self.exclude_tests = other.exclude_tests;
        }
        if other.exclude_package_infos.is_some() {
            self.exclude_package_infos = other.exclude_package_infos;
        }
        if other.parallel.is_some() {
            self.parallel = other.parallel;
        }
        if other.worker_threads.is_some() {
            self.worker_threads = other.worker_threads;
        }
        if other.follow_links.is_some() {
            self.follow_links = other.follow_links;
        }
        if other.max_depth.is_some() {
            self.max_depth = other.max_depth;
        }
    }

    /// Convert partial settings to full settings
    /// Uses defaults for any fields that are None
    pub fn to_settings(&self) -> Settings {
        let mut settings = Settings::default();

        if let Some(classpath) = &self.classpath {
            settings.classpath = classpath.clone();
        }
        if let Some(java_home) = &self.java_home {
            settings.java_home = Some(java_home.clone());
        }
        if let Some(exclude_patterns) = &self.exclude_patterns {
            settings.exclude_patterns = exclude_patterns.clone();
        }
        if let Some(exclude_tests) = self.exclude_tests {
            settings.exclude_tests = exclude_tests;
        }
        if let Some(exclude_package_infos) = self.exclude_package_infos {
            settings.exclude_package_infos = exclude_package_infos;
        }
        if let Some(parallel) = self.parallel {
            settings.parallel = parallel;
        }
        if let Some(worker_threads) = self.worker_threads {
            settings.worker_threads = Some(worker_threads);
        }
        if let Some(follow_links) = self.follow_links {
            settings.follow_links = follow_links;
        }
        if let Some(max_depth) = self.max_depth {
            settings.max_depth = Some(max_depth);
        }

        settings
    }
}
