//! Data models and structures for the class importer

pub mod config;
pub mod descriptor;
pub mod graph;
pub mod location;
pub mod package;
pub mod report;
pub mod types;

pub use config::{PartialSettings, Settings};
pub use descriptor::{
    AccessFlags, AnnotationDescriptor, AnnotationElement, ClassDescriptor, ClassKind,
    ClassReference, DependencyKind, ElementValue, FieldDescriptor, MethodDescriptor,
};
pub use graph::{ClassRef, Dependency, ImportedGraph, JavaClass, PackageRef};
pub use location::{Location, LocationKind, Storage};
pub use package::Package;
pub use report::{ImportIssue, ImportReport, ImportSummary, IssueKind};
pub use types::{JavaType, Primitive, TypeSignature};
