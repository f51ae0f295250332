//! Error types and definitions for the class importer
//!
//! Per-location failures (`MalformedClassFile`, `UnreadableLocation`) and
//! duplicate notices are recorded in the import report and never abort an
//! import; only `NoImportableLocations` and configuration errors do.

use crate::parsers::classfile::ClassParseError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error severity levels for different error types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    /// Warning level errors - operation can continue
    Warning,
    /// Error level - the current location fails but the import continues
    Error,
    /// Critical level - the import call fails
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "WARNING"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Main error type for import operations
#[derive(Debug, Error)]
pub enum ImportError {
    /// Standard IO errors
    #[error("IO error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    /// Archive (jar/zip/jmod) structure errors
    #[error("archive error in {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// A class file could not be decoded
    #[error("malformed class file at {location}: {source}")]
    MalformedClassFile {
        location: String,
        #[source]
        source: ClassParseError,
    },

    /// A location or root could not be read
    #[error("unreadable location {location}: {reason}")]
    UnreadableLocation { location: String, reason: String },

    /// Package lookup on the package tree failed
    #[error("package '{name}' not found")]
    PackageNotFound { name: String },

    /// A second class with an already imported name was discarded
    #[error("duplicate class {class_name} at {ignored} ignored, keeping {kept}")]
    DuplicateClassIgnored {
        class_name: String,
        kept: String,
        ignored: String,
    },

    /// No requested source produced any readable content
    #[error("no importable locations found in {requested}")]
    NoImportableLocations { requested: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Configuration file not found
    #[error("Configuration file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration file read errors
    #[error("Error reading configuration file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file parse errors
    #[error("Error parsing configuration file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Glob pattern errors
    #[error("Glob pattern error: {source}")]
    GlobPattern {
        #[source]
        source: glob::PatternError,
    },

    /// Invalid path errors
    #[error("Invalid path: {path}")]
    InvalidPath { path: PathBuf },

    /// Report serialization errors
    #[error("JSON serialization error: {source}")]
    JsonSerialize {
        #[source]
        source: serde_json::Error,
    },
}

impl ImportError {
    /// Get the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ImportError::DuplicateClassIgnored { .. } => ErrorSeverity::Warning,

            ImportError::NoImportableLocations { .. } => ErrorSeverity::Critical,
            ImportError::Config { .. } => ErrorSeverity::Critical,
            ImportError::ConfigNotFound { .. } => ErrorSeverity::Critical,
            ImportError::ConfigRead { .. } => ErrorSeverity::Critical,
            ImportError::ConfigParse { .. } => ErrorSeverity::Critical,
            ImportError::GlobPattern { .. } => ErrorSeverity::Critical,

            _ => ErrorSeverity::Error,
        }
    }

    /// Check if this is a critical error that should abort the import call
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Locations this error refers to, in the order they were involved
    pub fn locations(&self) -> Vec<String> {
        match self {
            ImportError::MalformedClassFile { location, .. }
            | ImportError::UnreadableLocation { location, .. } => vec![location.clone()],
            ImportError::DuplicateClassIgnored { kept, ignored, .. } => {
                vec![kept.clone(), ignored.clone()]
            }
            ImportError::Zip { path, .. } | ImportError::InvalidPath { path } => {
                vec![path.display().to_string()]
            }
            _ => Vec::new(),
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ImportError::MalformedClassFile { location, source } => {
                format!("Skipped '{}': not a valid class file ({}).", location, source)
            }
            ImportError::UnreadableLocation { location, reason } => {
                format!("Skipped '{}': {}.", location, reason)
            }
            ImportError::DuplicateClassIgnored {
                class_name,
                kept,
                ignored,
            } => {
                format!(
                    "Class '{}' found more than once; using '{}' and ignoring '{}'.",
                    class_name, kept, ignored
                )
            }
            ImportError::NoImportableLocations { requested } => {
                format!(
                    "Nothing could be imported from {}. Check that the paths exist and are readable.",
                    requested
                )
            }
            ImportError::InvalidPath { path } => {
                format!("Invalid path: '{}'. Please provide an existing directory or archive.", path.display())
            }
            ImportError::ConfigNotFound { path } => {
                format!("Configuration file not found at '{}'.", path.display())
            }
            // For other errors, use the standard Display implementation
            _ => self.to_string(),
        }
    }

    /// Create an IO error
    pub fn io_error(source: std::io::Error) -> Self {
        ImportError::Io { source }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        ImportError::Config {
            message: message.into(),
        }
    }

    /// Create an unreadable-location error
    pub fn unreadable(location: impl Into<String>, reason: impl fmt::Display) -> Self {
        ImportError::UnreadableLocation {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a malformed-class-file error
    pub fn malformed(location: impl Into<String>, source: ClassParseError) -> Self {
        ImportError::MalformedClassFile {
            location: location.into(),
            source,
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::io_error(err)
    }
}

impl From<glob::PatternError> for ImportError {
    fn from(err: glob::PatternError) -> Self {
        ImportError::GlobPattern { source: err }
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::JsonSerialize { source: err }
    }
}

/// Result type alias for import operations
pub type Result<T> = std::result::Result<T, ImportError>;
