//! classimport - Imports compiled Java class files into a queryable class graph
//!
//! This library enumerates class files from directories, jar/zip archives, the
//! classpath and the Java runtime module store, decodes them without running a
//! JVM, and resolves every symbolic class reference into an [`ImportedGraph`]
//! with a package tree. Classes that are referenced but never imported become
//! external stubs instead of errors.
//!
//! ```no_run
//! use classimport::{ClassFileImporter, ImportFilter};
//!
//! let graph = ClassFileImporter::new()
//!     .with_filter(ImportFilter::DoNotIncludeTests)
//!     .import_path("target/classes")?;
//!
//! for class in graph.package("com.example")?.all_classes() {
//!     println!("{} extends {:?}", class.name(), class.superclass().map(|s| s.name()));
//! }
//! # Ok::<(), classimport::ImportError>(())
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod parsers;

// Re-export commonly used types
pub use crate::core::{
    ClassFileImporter, Classpath, ImportFilter, ImportFilters, LocationFilter, ModuleFilter,
    ProgressUpdate, RuntimeModuleStore,
};
pub use error::{ErrorSeverity, ImportError, OptionExt, Result, ResultExt};
pub use models::{
    ClassDescriptor, ClassRef, Dependency, DependencyKind, ImportReport, ImportedGraph, Location,
    PackageRef, PartialSettings, Settings,
};
pub use parsers::{parse_class, ClassParseError};
pub use tokio_util::sync::CancellationToken;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
