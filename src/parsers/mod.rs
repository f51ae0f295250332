//! Byte-level decoding of class files
//!
//! This module turns raw class-file bytes into [`ClassDescriptor`]s, including
//! descriptor strings, generic signatures and annotation values.
//!
//! [`ClassDescriptor`]: crate::models::ClassDescriptor

pub mod classfile;
pub mod descriptor;
pub mod signature;

pub use classfile::{parse_class, ClassParseError};
pub use descriptor::{parse_field_descriptor, parse_method_descriptor, MethodType};
pub use signature::{parse_class_signature, parse_field_signature, parse_method_signature};
