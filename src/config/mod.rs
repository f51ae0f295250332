//! Configuration management
//!
//! Settings are layered: the default config file, then `CLASSIMPORT_*`
//! environment variables, then settings supplied by the caller. Later layers
//! override earlier ones field by field.

pub mod file;
pub mod parser;
pub mod settings;

use crate::error::Result;
use crate::models::config::{PartialSettings, Settings};

pub use file::{EnvConfig, FileConfig, DEFAULT_ENV_PREFIX};
pub use parser::{
    create_default_config, find_default_config, parse_config_content, parse_config_file,
    DEFAULT_CONFIG_FILE,
};
pub use settings::SettingsValidator;

/// Trait for configuration sources
pub trait ConfigSource {
    /// Load configuration from this source
    fn load(&self) -> Result<PartialSettings>;

    /// Check if this configuration source is available
    fn is_available(&self) -> bool;

    /// Get the name of this configuration source for logging
    fn name(&self) -> &str;

    /// Get the priority of this source (higher numbers take precedence)
    fn priority(&self) -> u8 {
        10
    }
}

/// Configuration builder for merging multiple sources
pub struct ConfigBuilder {
    partial: PartialSettings,
}

impl ConfigBuilder {
    /// Create a new configuration builder with defaults
    pub fn new() -> Self {
        Self {
            partial: PartialSettings::default(),
        }
    }

    /// Merge settings from a partial configuration
    pub fn merge(mut self, partial: PartialSettings) -> Self {
        self.partial.merge_from(partial);
        self
    }

    /// Load and merge settings from a configuration source
    pub fn load_from<S: ConfigSource + ?Sized>(self, source: &S) -> Result<Self> {
        if source.is_available() {
            tracing::debug!(source = source.name(), "Loading configuration");
            let partial = source.load()?;
            Ok(self.merge(partial))
        } else {
            Ok(self)
        }
    }

    /// Try to load from a source, ignoring it if unavailable or broken
    pub fn try_load_from<S: ConfigSource + ?Sized>(self, source: &S) -> Self {
        if !source.is_available() {
            return self;
        }
        match source.load() {
            Ok(partial) => self.merge(partial),
            Err(err) => {
                tracing::warn!(source = source.name(), error = %err, "Ignoring configuration source");
                self
            }
        }
    }

    /// Load every source, lowest priority first
    pub fn load_all(mut self, sources: &[&dyn ConfigSource]) -> Result<Self> {
        let mut ordered = sources.to_vec();
        ordered.sort_by_key(|source| source.priority());
        for source in ordered {
            self = self.load_from(source)?;
        }
        Ok(self)
    }

    /// Add configuration from a file
    pub fn add_config_file(self, path: &std::path::Path) -> Result<Self> {
        let partial = FileConfig::with_path(path).load()?;
        Ok(self.merge(partial))
    }

    /// Try to add configuration from the default config file
    pub fn try_add_default_config_file(self) -> Self {
        match parser::find_default_config() {
            Ok(Some(default_config)) => self.merge(default_config),
            Ok(None) => self,
            Err(err) => {
                tracing::warn!(error = %err, "Ignoring default configuration file");
                self
            }
        }
    }

    /// Build the final settings with validation
    pub fn build(self) -> Result<Settings> {
        let settings = self.partial.to_settings();
        SettingsValidator::validate(&settings)?;
        Ok(settings)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration from the default file, the `CLASSIMPORT_*` environment
/// and `overrides`, in increasing precedence
pub fn load_config(overrides: PartialSettings) -> Result<Settings> {
    load_config_with_env_prefix(overrides, DEFAULT_ENV_PREFIX)
}

/// Load configuration with a custom environment variable prefix
pub fn load_config_with_env_prefix(overrides: PartialSettings, env_prefix: &str) -> Result<Settings> {
    ConfigBuilder::new()
        .try_add_default_config_file()
        .load_from(&EnvConfig::new(env_prefix))?
        .merge(overrides)
        .build()
}

/// Load configuration from an explicit file instead of the default locations
pub fn load_config_from_file(
    path: &std::path::Path,
    overrides: PartialSettings,
    env_prefix: &str,
) -> Result<Settings> {
    ConfigBuilder::new()
        .add_config_file(path)?
        .load_from(&EnvConfig::new(env_prefix))?
        .merge(overrides)
        .build()
}
