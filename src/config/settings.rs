//! Settings validation

use crate::error::{ImportError, Result, ResultExt};
use crate::models::config::Settings;

/// Settings validator for ensuring configuration is valid
pub struct SettingsValidator;

impl SettingsValidator {
    /// Validate settings and return errors if invalid
    pub fn validate(settings: &Settings) -> Result<()> {
        for entry in &settings.classpath {
            if entry.as_os_str().is_empty() {
                return Err(ImportError::config_error("Classpath entries must not be empty"));
            }
        }

        if let Some(java_home) = &settings.java_home {
            if java_home.as_os_str().is_empty() {
                return Err(ImportError::config_error("java_home must not be empty"));
            }
        }

        for pattern in &settings.exclude_patterns {
            glob::Pattern::new(pattern)
                .with_context(|| format!("Invalid exclude pattern: {}", pattern))?;
        }

        if settings.worker_threads == Some(0) {
            return Err(ImportError::config_error("Worker threads must be at least 1"));
        }

        if settings.max_depth == Some(0) {
            return Err(ImportError::config_error("Max depth must be at least 1"));
        }

        Ok(())
    }
}
