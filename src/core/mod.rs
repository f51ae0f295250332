//! Core functionality for enumerating, parsing and resolving class files

pub mod archive;
pub mod classpath;
pub mod enumerator;
pub mod filter;
pub mod graph_builder;
pub mod importer;
pub mod package_tree;
pub mod parallel;

pub use classpath::{Classpath, ModuleSource, RuntimeModule, RuntimeModuleStore};
pub use enumerator::{Enumeration, SourceEnumerator};
pub use filter::{ImportFilter, ImportFilters, LocationFilter, ModuleFilter, BASE_MODULE};
pub use graph_builder::GraphBuilder;
pub use importer::ClassFileImporter;
pub use parallel::{ParseOutcome, ProgressCallback, ProgressUpdate};
