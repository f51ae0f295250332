//! Structural descriptors produced by the class-file parser
//!
//! A [`ClassDescriptor`] is built from exactly one class-file byte stream and
//! holds purely symbolic (name) references to other classes. Linking those
//! names to graph nodes happens later, in the graph builder.

use super::location::Location;
use super::types::{ClassSignature, JavaType, MethodSignature, TypeSignature};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Raw access flags of a class, field or method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AccessFlags(pub u16);

impl AccessFlags {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const SYNCHRONIZED: u16 = 0x0020;
    pub const VOLATILE: u16 = 0x0040;
    pub const BRIDGE: u16 = 0x0040;
    pub const TRANSIENT: u16 = 0x0080;
    pub const VARARGS: u16 = 0x0080;
    pub const NATIVE: u16 = 0x0100;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
    pub const STRICT: u16 = 0x0800;
    pub const SYNTHETIC: u16 = 0x1000;
    pub const ANNOTATION: u16 = 0x2000;
    pub const ENUM: u16 = 0x4000;
    pub const MODULE: u16 = 0x8000;

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn contains(&self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    pub fn is_public(&self) -> bool {
        self.contains(Self::PUBLIC)
    }

    pub fn is_private(&self) -> bool {
        self.contains(Self::PRIVATE)
    }

    pub fn is_protected(&self) -> bool {
        self.contains(Self::PROTECTED)
    }

    pub fn is_static(&self) -> bool {
        self.contains(Self::STATIC)
    }

    pub fn is_final(&self) -> bool {
        self.contains(Self::FINAL)
    }

    pub fn is_interface(&self) -> bool {
        self.contains(Self::INTERFACE)
    }

    pub fn is_abstract(&self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    pub fn is_synthetic(&self) -> bool {
        self.contains(Self::SYNTHETIC)
    }

    pub fn is_annotation(&self) -> bool {
        self.contains(Self::ANNOTATION)
    }

    pub fn is_enum(&self) -> bool {
        self.contains(Self::ENUM)
    }

    pub fn is_module(&self) -> bool {
        self.contains(Self::MODULE)
    }
}

/// Kind of a type declaration, derived from access flags and supertype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

/// How one class refers to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DependencyKind {
    Extends,
    Implements,
    FieldType,
    ParameterType,
    ReturnType,
    ThrowsType,
    AnnotationType,
    /// Class used as a generic type argument or type-parameter bound
    TypeArgument,
    EnclosingClass,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DependencyKind::Extends => "extends",
            DependencyKind::Implements => "implements",
            DependencyKind::FieldType => "has field of type",
            DependencyKind::ParameterType => "has parameter of type",
            DependencyKind::ReturnType => "has return type",
            DependencyKind::ThrowsType => "declares to throw",
            DependencyKind::AnnotationType => "is annotated with",
            DependencyKind::TypeArgument => "has generic type argument",
            DependencyKind::EnclosingClass => "is enclosed by",
        };
        write!(f, "{}", label)
    }
}

/// One symbolic reference from a descriptor to another class name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassReference {
    pub target: String,
    pub kind: DependencyKind,
}

/// Value of an annotation element or a constant field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementValue {
    Boolean(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Enum { type_name: String, constant: String },
    Class(JavaType),
    Annotation(Box<AnnotationDescriptor>),
    Array(Vec<ElementValue>),
}

impl ElementValue {
    fn collect_class_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ElementValue::Enum { type_name, .. } => out.push(type_name),
            ElementValue::Class(ty) => {
                if let Some(name) = ty.class_name() {
                    out.push(name);
                }
            }
            ElementValue::Annotation(annotation) => annotation.collect_class_names(out),
            ElementValue::Array(values) => {
                for value in values {
                    value.collect_class_names(out);
                }
            }
            _ => {}
        }
    }
}

/// Named element of an annotation instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationElement {
    pub name: String,
    pub value: ElementValue,
}

/// Annotation instance attached to a class, member or parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDescriptor {
    pub type_name: String,
    /// Whether the annotation is retained at runtime (`RuntimeVisible*`)
    pub visible: bool,
    pub elements: Vec<AnnotationElement>,
}

impl AnnotationDescriptor {
    pub fn element(&self, name: &str) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find(|element| element.name == name)
            .map(|element| &element.value)
    }

    fn collect_class_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(&self.type_name);
        for element in &self.elements {
            element.value.collect_class_names(out);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub access: AccessFlags,
    pub field_type: JavaType,
    pub signature: Option<TypeSignature>,
    pub constant_value: Option<ElementValue>,
    pub annotations: Vec<AnnotationDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub access: AccessFlags,
    pub parameters: Vec<JavaType>,
    pub return_type: JavaType,
    pub exceptions: Vec<String>,
    pub signature: Option<MethodSignature>,
    pub annotations: Vec<AnnotationDescriptor>,
    pub parameter_annotations: Vec<Vec<AnnotationDescriptor>>,
}

impl MethodDescriptor {
    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == "<clinit>"
    }
}

/// Structural description of one parsed class file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    /// Fully-qualified dotted name, nested classes keep their `$` separator
    pub name: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub access: AccessFlags,
    pub major_version: u16,
    pub minor_version: u16,
    pub fields: Vec<FieldDescriptor>,
    pub methods: Vec<MethodDescriptor>,
    pub annotations: Vec<AnnotationDescriptor>,
    pub signature: Option<ClassSignature>,
    pub source_file: Option<String>,
    /// Declaring class of a member, local or anonymous class
    pub enclosing_class: Option<String>,
    /// Location the bytes were read from; unset for bytes parsed in isolation
    pub source: Option<Location>,
}

impl ClassDescriptor {
    /// Attach the location this descriptor was parsed from
    pub fn with_source(mut self, source: Location) -> Self {
        self.source = Some(source);
        self
    }

    pub fn package_name(&self) -> &str {
        package_of(&self.name)
    }

    /// Simple name as it appears in source; empty for anonymous classes
    pub fn simple_name(&self) -> &str {
        let local = simple_part(&self.name);
        match &self.enclosing_class {
            Some(enclosing) => {
                let prefix = simple_part(enclosing);
                match local
                    .strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix('$'))
                {
                    Some(rest) => rest.trim_start_matches(|ch: char| ch.is_ascii_digit()),
                    None => local,
                }
            }
            None => local,
        }
    }

    pub fn kind(&self) -> ClassKind {
        if self.access.is_annotation() {
            ClassKind::Annotation
        } else if self.access.is_interface() {
            ClassKind::Interface
        } else if self.access.is_enum() {
            ClassKind::Enum
        } else if self.super_class.as_deref() == Some("java.lang.Record") {
            ClassKind::Record
        } else {
            ClassKind::Class
        }
    }

    pub fn is_package_info(&self) -> bool {
        simple_part(&self.name) == "package-info"
    }

    pub fn is_nested(&self) -> bool {
        self.enclosing_class.is_some()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodDescriptor> {
        self.methods.iter().filter(move |method| method.name == name)
    }

    pub fn annotation(&self, type_name: &str) -> Option<&AnnotationDescriptor> {
        self.annotations
            .iter()
            .find(|annotation| annotation.type_name == type_name)
    }

    /// Every symbolic class reference of this descriptor, deduplicated by
    /// (target, kind) and excluding references to the class itself
    pub fn referenced_class_names(&self) -> Vec<ClassReference> {
        let mut collector = ReferenceCollector::new(&self.name);

        if let Some(super_class) = &self.super_class {
            collector.add(super_class, DependencyKind::Extends);
        }
        for interface in &self.interfaces {
            collector.add(interface, DependencyKind::Implements);
        }
        if let Some(enclosing) = &self.enclosing_class {
            collector.add(enclosing, DependencyKind::EnclosingClass);
        }
        if let Some(signature) = &self.signature {
            let mut names = Vec::new();
            for parameter in &signature.type_parameters {
                parameter.collect_class_names(&mut names);
            }
            signature.superclass.collect_argument_class_names(&mut names);
            for interface in &signature.interfaces {
                interface.collect_argument_class_names(&mut names);
            }
            collector.add_all(names, DependencyKind::TypeArgument);
        }
        collector.add_annotations(&self.annotations);

        for field in &self.fields {
            if let Some(name) = field.field_type.class_name() {
                collector.add(name, DependencyKind::FieldType);
            }
            if let Some(signature) = &field.signature {
                let mut names = Vec::new();
                signature.collect_argument_class_names(&mut names);
                collector.add_all(names, DependencyKind::TypeArgument);
            }
            collector.add_annotations(&field.annotations);
        }

        for method in &self.methods {
            for parameter in &method.parameters {
                if let Some(name) = parameter.class_name() {
                    collector.add(name, DependencyKind::ParameterType);
                }
            }
            if let Some(name) = method.return_type.class_name() {
                collector.add(name, DependencyKind::ReturnType);
            }
            for exception in &method.exceptions {
                collector.add(exception, DependencyKind::ThrowsType);
            }
            if let Some(signature) = &method.signature {
                let mut names = Vec::new();
                for parameter in &signature.type_parameters {
                    parameter.collect_class_names(&mut names);
                }
                for parameter in &signature.parameters {
                    parameter.collect_argument_class_names(&mut names);
                }
                signature.return_type.collect_argument_class_names(&mut names);
                collector.add_all(names, DependencyKind::TypeArgument);
            }
            collector.add_annotations(&method.annotations);
            for annotations in &method.parameter_annotations {
                collector.add_annotations(annotations);
            }
        }

        collector.finish()
    }
}

struct ReferenceCollector<'a> {
    owner: &'a str,
    seen: HashSet<(String, DependencyKind)>,
    references: Vec<ClassReference>,
}

impl<'a> ReferenceCollector<'a> {
    fn new(owner: &'a str) -> Self {
        Self {
            owner,
            seen: HashSet::new(),
            references: Vec::new(),
        }
    }

    fn add(&mut self, target: &str, kind: DependencyKind) {
        if target == self.owner {
            return;
        }
        if self.seen.insert((target.to_string(), kind)) {
            self.references.push(ClassReference {
                target: target.to_string(),
                kind,
            });
        }
    }

    fn add_all(&mut self, targets: Vec<&str>, kind: DependencyKind) {
        for target in targets {
            self.add(target, kind);
        }
    }

    fn add_annotations(&mut self, annotations: &[AnnotationDescriptor]) {
        let mut names = Vec::new();
        for annotation in annotations {
            annotation.collect_class_names(&mut names);
        }
        self.add_all(names, DependencyKind::AnnotationType);
    }

    fn finish(self) -> Vec<ClassReference> {
        self.references
    }
}

/// Package part of a fully-qualified class name; empty for the default package
pub fn package_of(class_name: &str) -> &str {
    class_name
        .rsplit_once('.')
        .map(|(package, _)| package)
        .unwrap_or("")
}

fn simple_part(class_name: &str) -> &str {
    class_name
        .rsplit_once('.')
        .map(|(_, simple)| simple)
        .unwrap_or(class_name)
}
