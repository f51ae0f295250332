//! Field and method descriptor decoding

use crate::models::types::{JavaType, Primitive};
use crate::parsers::classfile::ClassParseError;

/// Decoded method descriptor `(params)return`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodType {
    pub parameters: Vec<JavaType>,
    pub return_type: JavaType,
}

pub fn parse_field_descriptor(descriptor: &str) -> Result<JavaType, ClassParseError> {
    let mut parser = DescriptorParser::new(descriptor);
    let ty = parser.parse_type()?;
    if parser.remaining() != 0 {
        return Err(ClassParseError::InvalidDescriptor(descriptor.to_string()));
    }
    Ok(ty)
}

pub fn parse_method_descriptor(descriptor: &str) -> Result<MethodType, ClassParseError> {
    let mut parser = DescriptorParser::new(descriptor);
    parser.expect(b'(')?;
    let mut parameters = Vec::new();
    while !parser.peek_is(b')')? {
        parameters.push(parser.parse_type()?);
    }
    parser.expect(b')')?;
    let return_type = if parser.peek_is(b'V')? {
        parser.advance(1);
        JavaType::Void
    } else {
        parser.parse_type()?
    };

    if parser.remaining() != 0 {
        return Err(ClassParseError::InvalidDescriptor(descriptor.to_string()));
    }

    Ok(MethodType {
        parameters,
        return_type,
    })
}

/// Convert an internal name (`java/lang/String`) into its dotted form
pub fn internal_to_dotted(name: &str) -> String {
    name.replace('/', ".")
}

struct DescriptorParser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DescriptorParser<'a> {
    fn new(descriptor: &'a str) -> Self {
        Self {
            source: descriptor,
            bytes: descriptor.as_bytes(),
            pos: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn error(&self) -> ClassParseError {
        ClassParseError::InvalidDescriptor(self.source.to_string())
    }

    fn expect(&mut self, ch: u8) -> Result<(), ClassParseError> {
        if self.remaining() < 1 || self.bytes[self.pos] != ch {
            return Err(self.error());
        }
        self.pos += 1;
        Ok(())
    }

    fn advance(&mut self, count: usize) {
        self.pos += count;
    }

    fn peek_is(&self, ch: u8) -> Result<bool, ClassParseError> {
        if self.remaining() < 1 {
            return Err(self.error());
        }
        Ok(self.bytes[self.pos] == ch)
    }

    fn parse_type(&mut self) -> Result<JavaType, ClassParseError> {
        if self.remaining() == 0 {
            return Err(self.error());
        }

        let tag = self.bytes[self.pos];
        if let Some(primitive) = Primitive::from_tag(tag) {
            self.pos += 1;
            return Ok(JavaType::Primitive(primitive));
        }
        match tag {
            b'L' => self.parse_object_type(),
            b'[' => self.parse_array_type(),
            _ => Err(self.error()),
        }
    }

    fn parse_object_type(&mut self) -> Result<JavaType, ClassParseError> {
        self.expect(b'L')?;
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b';' {
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() || self.pos == start {
            return Err(self.error());
        }
        let name = &self.source[start..self.pos];
        self.pos += 1; // consume ';'
        Ok(JavaType::Object(internal_to_dotted(name)))
    }

    fn parse_array_type(&mut self) -> Result<JavaType, ClassParseError> {
        let mut dimensions: u8 = 0;
        while self.remaining() > 0 && self.bytes[self.pos] == b'[' {
            dimensions = dimensions.checked_add(1).ok_or_else(|| self.error())?;
            self.pos += 1;
        }
        let element = self.parse_type()?;
        Ok(JavaType::Array {
            element: Box::new(element),
            dimensions,
        })
    }
}
