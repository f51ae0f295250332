//! Error handling for the class importer
//!
//! This module provides the error taxonomy of an import, result aliases, and
//! error context utilities.

pub mod context;
pub mod types;

pub use context::{log_error, OptionExt, ResultExt};
pub use types::{ErrorSeverity, ImportError, Result};
