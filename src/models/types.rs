//! Type representations decoded from field/method descriptors and generic signatures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive types of the class-file type system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl Primitive {
    /// Map a descriptor tag (`B`, `C`, `D`, ...) to its primitive type
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'B' => Some(Primitive::Byte),
            b'C' => Some(Primitive::Char),
            b'D' => Some(Primitive::Double),
            b'F' => Some(Primitive::Float),
            b'I' => Some(Primitive::Int),
            b'J' => Some(Primitive::Long),
            b'S' => Some(Primitive::Short),
            b'Z' => Some(Primitive::Boolean),
            _ => None,
        }
    }

    /// Source-level keyword of the primitive
    pub fn keyword(&self) -> &'static str {
        match self {
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Double => "double",
            Primitive::Float => "float",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Short => "short",
            Primitive::Boolean => "boolean",
        }
    }
}

/// Erased type as written in a field or method descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JavaType {
    Primitive(Primitive),
    Void,
    /// Reference to a class, by fully-qualified dotted name
    Object(String),
    Array {
        element: Box<JavaType>,
        dimensions: u8,
    },
}

impl JavaType {
    /// The class name this type refers to, looking through array dimensions
    pub fn class_name(&self) -> Option<&str> {
        match self {
            JavaType::Object(name) => Some(name),
            JavaType::Array { element, .. } => element.class_name(),
            JavaType::Primitive(_) | JavaType::Void => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, JavaType::Array { .. })
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Primitive(primitive) => write!(f, "{}", primitive.keyword()),
            JavaType::Void => write!(f, "void"),
            JavaType::Object(name) => write!(f, "{}", name),
            JavaType::Array {
                element,
                dimensions,
            } => {
                write!(f, "{}", element)?;
                for _ in 0..*dimensions {
                    write!(f, "[]")?;
                }
                Ok(())
            }
        }
    }
}

/// Generic type as written in a `Signature` attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeSignature {
    Base(Primitive),
    Void,
    Class {
        /// Fully-qualified dotted name; inner-class suffixes are joined with `$`
        name: String,
        arguments: Vec<TypeArgument>,
    },
    TypeVariable(String),
    Array(Box<TypeSignature>),
}

/// Argument of a parameterized class type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeArgument {
    /// `?`
    Unbounded,
    /// `? extends T`
    Extends(TypeSignature),
    /// `? super T`
    Super(TypeSignature),
    Exact(TypeSignature),
}

impl TypeArgument {
    pub fn bound(&self) -> Option<&TypeSignature> {
        match self {
            TypeArgument::Unbounded => None,
            TypeArgument::Extends(sig) | TypeArgument::Super(sig) | TypeArgument::Exact(sig) => {
                Some(sig)
            }
        }
    }
}

/// Formal type parameter with its class and interface bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParameter {
    pub name: String,
    pub bounds: Vec<TypeSignature>,
}

/// Decoded class `Signature` attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub superclass: TypeSignature,
    pub interfaces: Vec<TypeSignature>,
}

/// Decoded method `Signature` attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<TypeSignature>,
    pub return_type: TypeSignature,
    pub throws: Vec<TypeSignature>,
}

impl TypeSignature {
    /// Collect the names of every class mentioned by this signature, including
    /// the classes used as type arguments
    pub fn collect_class_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeSignature::Class { name, arguments } => {
                out.push(name);
                for argument in arguments {
                    if let Some(bound) = argument.bound() {
                        bound.collect_class_names(out);
                    }
                }
            }
            TypeSignature::Array(element) => element.collect_class_names(out),
            TypeSignature::Base(_) | TypeSignature::Void | TypeSignature::TypeVariable(_) => {}
        }
    }

    /// Collect only the classes used as type arguments, skipping the outermost
    /// class itself (which is already known from the erased descriptor)
    pub fn collect_argument_class_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeSignature::Class { arguments, .. } => {
                for argument in arguments {
                    if let Some(bound) = argument.bound() {
                        bound.collect_class_names(out);
                    }
                }
            }
            TypeSignature::Array(element) => element.collect_argument_class_names(out),
            TypeSignature::Base(_) | TypeSignature::Void | TypeSignature::TypeVariable(_) => {}
        }
    }
}

impl TypeParameter {
    pub fn collect_class_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        for bound in &self.bounds {
            bound.collect_class_names(out);
        }
    }
}
