//! Error context utilities for the importer
//!
//! This module provides utilities for adding context to errors and reporting
//! recoverable errors in a consistent way throughout the crate.

use crate::error::{ErrorSeverity, ImportError, Result};

/// Extension trait for Result to add context to errors
pub trait ResultExt<T, E> {
    /// Turn the error into a configuration error carrying a custom message
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;

    /// Turn the error into an `UnreadableLocation` for the given location
    fn with_location_context(self, location: impl std::fmt::Display) -> Result<T>;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error + 'static,
{
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|err| ImportError::Config {
            message: format!("{}: {}", context(), err),
        })
    }

    fn with_location_context(self, location: impl std::fmt::Display) -> Result<T> {
        self.map_err(|err| ImportError::UnreadableLocation {
            location: location.to_string(),
            reason: err.to_string(),
        })
    }
}

/// Emit a recorded error as a tracing event at a level matching its severity
///
/// Returns the error back when it is critical so callers can abort.
pub fn log_error(err: ImportError) -> Option<ImportError> {
    match err.severity() {
        ErrorSeverity::Warning => {
            tracing::warn!("{}", err.user_message());
            None
        }
        ErrorSeverity::Error => {
            tracing::warn!(error = %err, "{}", err.user_message());
            None
        }
        ErrorSeverity::Critical => {
            tracing::error!("{}", err.user_message());
            Some(err)
        }
    }
}

/// Extension trait for Option to convert to Result with a custom error
pub trait OptionExt<T> {
    /// Convert Option to Result with a custom error
    fn ok_or_error<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> ImportError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_error<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> ImportError,
    {
        self.ok_or_else(err_fn)
    }
}
