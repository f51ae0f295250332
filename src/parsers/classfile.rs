//! Class-file decoding
//!
//! [`parse_class`] turns the bytes of one class file into a [`ClassDescriptor`].
//! Every read is bounds-checked, so truncated input or an attribute whose
//! declared length overruns the buffer fails with [`ClassParseError`] instead
//! of panicking. Method bodies (`Code`) and unknown attributes are skipped by
//! length.

use crate::models::descriptor::{
    AccessFlags, AnnotationDescriptor, AnnotationElement, ClassDescriptor, ElementValue,
    FieldDescriptor, MethodDescriptor,
};
use crate::models::types::{JavaType, Primitive};
use crate::parsers::descriptor::{internal_to_dotted, parse_field_descriptor, parse_method_descriptor};
use crate::parsers::signature::{parse_class_signature, parse_field_signature, parse_method_signature};
use thiserror::Error;

const MAGIC: u32 = 0xCAFE_BABE;

/// Oldest supported major version (JDK 1.1)
pub const MIN_MAJOR_VERSION: u16 = 45;
/// Newest supported major version (Java 25)
pub const MAX_MAJOR_VERSION: u16 = 69;

#[derive(Debug, Error)]
pub enum ClassParseError {
    #[error("unexpected end of class file")]
    UnexpectedEof,
    #[error("invalid class file magic header")]
    InvalidMagic,
    #[error("unsupported class file major version {major}")]
    UnsupportedVersion { major: u16 },
    #[error("unsupported constant pool tag {tag}")]
    UnsupportedConstant { tag: u8 },
    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },
    #[error("malformed descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("malformed generic signature: {0}")]
    InvalidSignature(String),
    #[error("invalid annotation element tag '{tag}'")]
    InvalidElementValue { tag: char },
    #[error("invalid modified UTF-8 string in constant pool")]
    Utf8Decode,
}

pub fn parse_class(bytes: &[u8]) -> Result<ClassDescriptor, ClassParseError> {
    let mut reader = ClassReader::new(bytes);
    reader.expect_magic()?;
    let minor_version = reader.read_u2()?;
    let major_version = reader.read_u2()?;
    if !(MIN_MAJOR_VERSION..=MAX_MAJOR_VERSION).contains(&major_version) {
        return Err(ClassParseError::UnsupportedVersion {
            major: major_version,
        });
    }
    let pool = ConstantPool::parse(&mut reader)?;

    let mut access = AccessFlags(reader.read_u2()?);
    let this_class = reader.read_u2()?;
    let name = pool.class_name(this_class)?;
    let super_index = reader.read_u2()?;
    let super_class = if super_index == 0 {
        None
    } else {
        Some(pool.class_name(super_index)?)
    };

    let interfaces_count = reader.read_u2()?;
    let mut interfaces = Vec::with_capacity(interfaces_count as usize);
    for _ in 0..interfaces_count {
        interfaces.push(pool.class_name(reader.read_u2()?)?);
    }

    let fields_count = reader.read_u2()?;
    let mut fields = Vec::with_capacity(fields_count as usize);
    for _ in 0..fields_count {
        fields.push(parse_field(&mut reader, &pool)?);
    }

    let methods_count = reader.read_u2()?;
    let mut methods = Vec::with_capacity(methods_count as usize);
    for _ in 0..methods_count {
        methods.push(parse_method(&mut reader, &pool)?);
    }

    let mut annotations = Vec::new();
    let mut signature = None;
    let mut source_file = None;
    let mut enclosing_class = None;

    let attributes_count = reader.read_u2()?;
    for _ in 0..attributes_count {
        let (attribute, mut body) = read_attribute(&mut reader, &pool)?;
        match attribute {
            "Signature" => {
                signature = Some(parse_class_signature(pool.utf8(body.read_u2()?)?)?);
            }
            "SourceFile" => {
                source_file = Some(pool.utf8(body.read_u2()?)?.to_string());
            }
            "InnerClasses" => {
                let count = body.read_u2()?;
                for _ in 0..count {
                    let inner_index = body.read_u2()?;
                    let outer_index = body.read_u2()?;
                    let _inner_name_index = body.read_u2()?;
                    let inner_flags = body.read_u2()?;
                    if inner_index == this_class || pool.class_name(inner_index)? == name {
                        // Source-level modifiers of a nested class live here
                        access = AccessFlags(inner_flags);
                        if outer_index != 0 {
                            enclosing_class = Some(pool.class_name(outer_index)?);
                        }
                    }
                }
            }
            "EnclosingMethod" => {
                enclosing_class = Some(pool.class_name(body.read_u2()?)?);
            }
            "RuntimeVisibleAnnotations" => {
                annotations.extend(parse_annotations(&mut body, &pool, true)?);
            }
            "RuntimeInvisibleAnnotations" => {
                annotations.extend(parse_annotations(&mut body, &pool, false)?);
            }
            _ => {}
        }
    }

    Ok(ClassDescriptor {
        name,
        super_class,
        interfaces,
        access,
        major_version,
        minor_version,
        fields,
        methods,
        annotations,
        signature,
        source_file,
        enclosing_class,
        source: None,
    })
}

fn parse_field(reader: &mut ClassReader<'_>, pool: &ConstantPool) -> Result<FieldDescriptor, ClassParseError> {
    let access = AccessFlags(reader.read_u2()?);
    let name = pool.utf8(reader.read_u2()?)?.to_string();
    let field_type = parse_field_descriptor(pool.utf8(reader.read_u2()?)?)?;

    let mut signature = None;
    let mut constant_value = None;
    let mut annotations = Vec::new();

    let attributes_count = reader.read_u2()?;
    for _ in 0..attributes_count {
        let (attribute, mut body) = read_attribute(reader, pool)?;
        match attribute {
            "Signature" => {
                signature = Some(parse_field_signature(pool.utf8(body.read_u2()?)?)?);
            }
            "ConstantValue" => {
                constant_value = Some(pool.constant_for_field(body.read_u2()?, &field_type)?);
            }
            "RuntimeVisibleAnnotations" => {
                annotations.extend(parse_annotations(&mut body, pool, true)?);
            }
            "RuntimeInvisibleAnnotations" => {
                annotations.extend(parse_annotations(&mut body, pool, false)?);
            }
            _ => {}
        }
    }

    Ok(FieldDescriptor {
        name,
        access,
        field_type,
        signature,
        constant_value,
        annotations,
    })
}

fn parse_method(reader: &mut ClassReader<'_>, pool: &ConstantPool) -> Result<MethodDescriptor, ClassParseError> {
    let access = AccessFlags(reader.read_u2()?);
    let name = pool.utf8(reader.read_u2()?)?.to_string();
    let method_type = parse_method_descriptor(pool.utf8(reader.read_u2()?)?)?;

    let mut exceptions = Vec::new();
    let mut signature = None;
    let mut annotations = Vec::new();
    let mut parameter_annotations: Vec<Vec<AnnotationDescriptor>> = Vec::new();

    let attributes_count = reader.read_u2()?;
    for _ in 0..attributes_count {
        let (attribute, mut body) = read_attribute(reader, pool)?;
        match attribute {
            "Signature" => {
                signature = Some(parse_method_signature(pool.utf8(body.read_u2()?)?)?);
            }
            "Exceptions" => {
                let count = body.read_u2()?;
                for _ in 0..count {
                    exceptions.push(pool.class_name(body.read_u2()?)?);
                }
            }
            "RuntimeVisibleAnnotations" => {
                annotations.extend(parse_annotations(&mut body, pool, true)?);
            }
            "RuntimeInvisibleAnnotations" => {
                annotations.extend(parse_annotations(&mut body, pool, false)?);
            }
            "RuntimeVisibleParameterAnnotations" => {
                merge_parameter_annotations(
                    &mut parameter_annotations,
                    parse_parameter_annotations(&mut body, pool, true)?,
                );
            }
            "RuntimeInvisibleParameterAnnotations" => {
                merge_parameter_annotations(
                    &mut parameter_annotations,
                    parse_parameter_annotations(&mut body, pool, false)?,
                );
            }
            _ => {}
        }
    }

    Ok(MethodDescriptor {
        name,
        access,
        parameters: method_type.parameters,
        return_type: method_type.return_type,
        exceptions,
        signature,
        annotations,
        parameter_annotations,
    })
}

/// Read an attribute header and return its name with a reader over exactly
/// its body; the outer reader is advanced past the body
fn read_attribute<'a, 'p>(
    reader: &mut ClassReader<'a>,
    pool: &'p ConstantPool,
) -> Result<(&'p str, ClassReader<'a>), ClassParseError> {
    let name = pool.utf8(reader.read_u2()?)?;
    let length = reader.read_u4()? as usize;
    let body = reader.read_slice(length)?;
    Ok((name, ClassReader::new(body)))
}

fn parse_annotations(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<Vec<AnnotationDescriptor>, ClassParseError> {
    let count = reader.read_u2()?;
    let mut annotations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        annotations.push(parse_annotation(reader, pool, visible)?);
    }
    Ok(annotations)
}

fn parse_parameter_annotations(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<Vec<Vec<AnnotationDescriptor>>, ClassParseError> {
    let parameters = reader.read_u1()?;
    let mut result = Vec::with_capacity(parameters as usize);
    for _ in 0..parameters {
        result.push(parse_annotations(reader, pool, visible)?);
    }
    Ok(result)
}

fn merge_parameter_annotations(
    target: &mut Vec<Vec<AnnotationDescriptor>>,
    parsed: Vec<Vec<AnnotationDescriptor>>,
) {
    if target.len() < parsed.len() {
        target.resize_with(parsed.len(), Vec::new);
    }
    for (slot, annotations) in target.iter_mut().zip(parsed) {
        slot.extend(annotations);
    }
}

fn parse_annotation(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<AnnotationDescriptor, ClassParseError> {
    let type_name = object_type_name(pool.utf8(reader.read_u2()?)?)?;
    let pairs = reader.read_u2()?;
    let mut elements = Vec::with_capacity(pairs as usize);
    for _ in 0..pairs {
        let name = pool.utf8(reader.read_u2()?)?.to_string();
        let value = parse_element_value(reader, pool, visible)?;
        elements.push(AnnotationElement { name, value });
    }
    Ok(AnnotationDescriptor {
        type_name,
        visible,
        elements,
    })
}

fn parse_element_value(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<ElementValue, ClassParseError> {
    let tag = reader.read_u1()?;
    let value = match tag {
        b'B' => ElementValue::Byte(pool.integer(reader.read_u2()?)? as i8),
        b'C' => ElementValue::Char(to_char(pool.integer(reader.read_u2()?)?)),
        b'S' => ElementValue::Short(pool.integer(reader.read_u2()?)? as i16),
        b'Z' => ElementValue::Boolean(pool.integer(reader.read_u2()?)? != 0),
        b'I' => ElementValue::Int(pool.integer(reader.read_u2()?)?),
        b'J' => ElementValue::Long(pool.long(reader.read_u2()?)?),
        b'F' => ElementValue::Float(pool.float(reader.read_u2()?)?),
        b'D' => ElementValue::Double(pool.double(reader.read_u2()?)?),
        b's' => ElementValue::String(pool.utf8(reader.read_u2()?)?.to_string()),
        b'e' => {
            let type_name = object_type_name(pool.utf8(reader.read_u2()?)?)?;
            let constant = pool.utf8(reader.read_u2()?)?.to_string();
            ElementValue::Enum {
                type_name,
                constant,
            }
        }
        b'c' => {
            let descriptor = pool.utf8(reader.read_u2()?)?;
            if descriptor == "V" {
                ElementValue::Class(JavaType::Void)
            } else {
                ElementValue::Class(parse_field_descriptor(descriptor)?)
            }
        }
        b'@' => ElementValue::Annotation(Box::new(parse_annotation(reader, pool, visible)?)),
        b'[' => {
            let count = reader.read_u2()?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(parse_element_value(reader, pool, visible)?);
            }
            ElementValue::Array(values)
        }
        other => {
            return Err(ClassParseError::InvalidElementValue {
                tag: other as char,
            })
        }
    };
    Ok(value)
}

/// Dotted class name of an object type descriptor such as `Ljava/lang/Deprecated;`
fn object_type_name(descriptor: &str) -> Result<String, ClassParseError> {
    match parse_field_descriptor(descriptor)? {
        JavaType::Object(name) => Ok(name),
        _ => Err(ClassParseError::InvalidDescriptor(descriptor.to_string())),
    }
}

fn to_char(value: i32) -> char {
    char::from_u32(value as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
}

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    Other,
    Unusable,
}

struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    fn parse(reader: &mut ClassReader<'_>) -> Result<Self, ClassParseError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable); // index 0 unused

        let mut index = 1;
        while index < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = reader.read_u2()? as usize;
                    Constant::Utf8(decode_modified_utf8(reader.read_slice(length)?)?)
                }
                3 => Constant::Integer(reader.read_u4()? as i32),
                4 => Constant::Float(f32::from_bits(reader.read_u4()?)),
                5 | 6 => {
                    let high = reader.read_u4()? as u64;
                    let low = reader.read_u4()? as u64;
                    let bits = (high << 32) | low;
                    // Eight-byte constants take up two pool slots
                    entries.push(if tag == 5 {
                        Constant::Long(bits as i64)
                    } else {
                        Constant::Double(f64::from_bits(bits))
                    });
                    entries.push(Constant::Unusable);
                    index += 2;
                    continue;
                }
                7 => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                8 => Constant::String {
                    string_index: reader.read_u2()?,
                },
                // Fieldref, Methodref, InterfaceMethodref, NameAndType
                9..=12 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                15 => {
                    reader.skip(3)?;
                    Constant::Other
                }
                16 => {
                    reader.skip(2)?;
                    Constant::Other
                }
                // Dynamic, InvokeDynamic
                17 | 18 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                // Module, Package
                19 | 20 => {
                    reader.skip(2)?;
                    Constant::Other
                }
                other => return Err(ClassParseError::UnsupportedConstant { tag: other }),
            };

            entries.push(entry);
            index += 1;
        }

        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&Constant, ClassParseError> {
        self.entries
            .get(index as usize)
            .ok_or(ClassParseError::InvalidConstantIndex { index })
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value.as_str()),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    /// Dotted name of a `CONSTANT_Class` entry
    fn class_name(&self, index: u16) -> Result<String, ClassParseError> {
        match self.get(index)? {
            Constant::Class { name_index } => Ok(internal_to_dotted(self.utf8(*name_index)?)),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    fn integer(&self, index: u16) -> Result<i32, ClassParseError> {
        match self.get(index)? {
            Constant::Integer(value) => Ok(*value),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    fn long(&self, index: u16) -> Result<i64, ClassParseError> {
        match self.get(index)? {
            Constant::Long(value) => Ok(*value),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    fn float(&self, index: u16) -> Result<f32, ClassParseError> {
        match self.get(index)? {
            Constant::Float(value) => Ok(*value),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    fn double(&self, index: u16) -> Result<f64, ClassParseError> {
        match self.get(index)? {
            Constant::Double(value) => Ok(*value),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    /// Value of a `ConstantValue` attribute, typed after the field it belongs to
    fn constant_for_field(&self, index: u16, field_type: &JavaType) -> Result<ElementValue, ClassParseError> {
        let value = match (self.get(index)?, field_type) {
            (Constant::Integer(v), JavaType::Primitive(Primitive::Boolean)) => ElementValue::Boolean(*v != 0),
            (Constant::Integer(v), JavaType::Primitive(Primitive::Byte)) => ElementValue::Byte(*v as i8),
            (Constant::Integer(v), JavaType::Primitive(Primitive::Char)) => ElementValue::Char(to_char(*v)),
            (Constant::Integer(v), JavaType::Primitive(Primitive::Short)) => ElementValue::Short(*v as i16),
            (Constant::Integer(v), _) => ElementValue::Int(*v),
            (Constant::Long(v), _) => ElementValue::Long(*v),
            (Constant::Float(v), _) => ElementValue::Float(*v),
            (Constant::Double(v), _) => ElementValue::Double(*v),
            (Constant::String { string_index }, _) => {
                ElementValue::String(self.utf8(*string_index)?.to_string())
            }
            _ => return Err(ClassParseError::InvalidConstantIndex { index }),
        };
        Ok(value)
    }
}

/// Decode the modified UTF-8 used by class files: NUL is encoded in two bytes
/// and supplementary characters as surrogate pairs of three bytes each
fn decode_modified_utf8(bytes: &[u8]) -> Result<String, ClassParseError> {
    if bytes.iter().all(|&b| b != 0 && b < 0x80) {
        return String::from_utf8(bytes.to_vec()).map_err(|_| ClassParseError::Utf8Decode);
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        let first = bytes[pos];
        let continuation = |offset: usize| -> Result<u16, ClassParseError> {
            match bytes.get(pos + offset) {
                Some(&b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
                _ => Err(ClassParseError::Utf8Decode),
            }
        };
        match first {
            0x01..=0x7F => {
                units.push(first as u16);
                pos += 1;
            }
            0xC0..=0xDF => {
                units.push(((first as u16 & 0x1F) << 6) | continuation(1)?);
                pos += 2;
            }
            0xE0..=0xEF => {
                units.push(((first as u16 & 0x0F) << 12) | (continuation(1)? << 6) | continuation(2)?);
                pos += 3;
            }
            _ => return Err(ClassParseError::Utf8Decode),
        }
    }

    // Lone surrogates are legal in class files; keep them as replacement chars
    Ok(String::from_utf16_lossy(&units))
}

struct ClassReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ClassReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn expect_magic(&mut self) -> Result<(), ClassParseError> {
        if self.read_u4()? != MAGIC {
            return Err(ClassParseError::InvalidMagic);
        }
        Ok(())
    }

    fn read_u1(&mut self) -> Result<u8, ClassParseError> {
        let slice = self.read_slice(1)?;
        Ok(slice[0])
    }

    fn read_u2(&mut self) -> Result<u16, ClassParseError> {
        let slice = self.read_slice(2)?;
        Ok(u16::from_be_bytes([slice[0], slice[1]]))
    }

    fn read_u4(&mut self) -> Result<u32, ClassParseError> {
        let slice = self.read_slice(4)?;
        Ok(u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]))
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ClassParseError> {
        let end = self.pos.checked_add(len).ok_or(ClassParseError::UnexpectedEof)?;
        if end > self.data.len() {
            return Err(ClassParseError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), ClassParseError> {
        self.read_slice(len).map(|_| ())
    }
}
