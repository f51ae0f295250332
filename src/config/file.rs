//! Configuration file and environment sources

use std::env;
use std::path::{Path, PathBuf};

use super::{parser, ConfigSource};
use crate::error::{ImportError, Result};
use crate::models::config::PartialSettings;

pub use super::parser::DEFAULT_CONFIG_FILE;

/// Default environment variable prefix
pub const DEFAULT_ENV_PREFIX: &str = "CLASSIMPORT";

/// Configuration file source
pub struct FileConfig {
    path: PathBuf,
    name: String,
    priority: u8,
}

impl FileConfig {
    /// Create a new file configuration source with the default path
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CONFIG_FILE),
            name: "default config file".to_string(),
            priority: 10,
        }
    }

    /// Create a new file configuration source with a custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            name: format!("config file ({})", path.as_ref().display()),
            priority: 10,
        }
    }

    /// Set the priority for this configuration source
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Set a custom name for this configuration source
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a default configuration file at this location
    pub fn create_default(&self) -> Result<()> {
        parser::create_default_config(&self.path)
    }
}

impl ConfigSource for FileConfig {
    fn load(&self) -> Result<PartialSettings> {
        if !self.is_available() {
            return Err(ImportError::ConfigNotFound {
                path: self.path.clone(),
            });
        }

        parser::parse_config_file(&self.path)
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u8 {
        self.priority
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment variable configuration source
///
/// Reads `<PREFIX>_CLASSPATH` (platform path list), `<PREFIX>_JAVA_HOME`,
/// `<PREFIX>_EXCLUDE` (comma separated globs), `<PREFIX>_WORKER_THREADS`,
/// `<PREFIX>_EXCLUDE_TESTS` and `<PREFIX>_PARALLEL`.
pub struct EnvConfig {
    prefix: String,
    name: String,
    priority: u8,
}

const ENV_KEYS: [&str; 6] = [
    "CLASSPATH",
    "JAVA_HOME",
    "EXCLUDE",
    "WORKER_THREADS",
    "EXCLUDE_TESTS",
    "PARALLEL",
];

impl EnvConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            name: format!("{} environment variables", &prefix),
            prefix,
            priority: 20,
        }
    }

    /// Set the priority for this configuration source
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    fn var(&self, key: &str) -> Option<String> {
        env::var(format!("{}_{}", self.prefix, key)).ok()
    }

    fn flag(&self, key: &str) -> Result<Option<bool>> {
        match self.var(key) {
            None => Ok(None),
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(Some(true)),
                "0" | "false" | "no" | "off" => Ok(Some(false)),
                other => Err(ImportError::config_error(format!(
                    "{}_{} must be a boolean, got '{}'",
                    self.prefix, key, other
                ))),
            },
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_PREFIX)
    }
}

impl ConfigSource for EnvConfig {
    fn load(&self) -> Result<PartialSettings> {
        let mut settings = PartialSettings::default();

        if let Some(classpath) = self.var("CLASSPATH") {
            settings.classpath = Some(env::split_paths(&classpath).collect());
        }

        if let Some(java_home) = self.var("JAVA_HOME") {
            settings.java_home = Some(PathBuf::from(java_home));
        }

        if let Some(exclude) = self.var("EXCLUDE") {
            settings.exclude_patterns = Some(
                exclude
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }

        if let Some(threads) = self.var("WORKER_THREADS") {
            let threads = threads.trim().parse().map_err(|_| {
                ImportError::config_error(format!(
                    "{}_WORKER_THREADS must be a positive number, got '{}'",
                    self.prefix, threads
                ))
            })?;
            settings.worker_threads = Some(threads);
        }

        settings.exclude_tests = self.flag("EXCLUDE_TESTS")?;
        settings.parallel = self.flag("PARALLEL")?;

        Ok(settings)
    }

    fn is_available(&self) -> bool {
        ENV_KEYS.iter().any(|key| self.var(key).is_some())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u8 {
        self.priority
    }
}
