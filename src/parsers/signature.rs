//! Generic `Signature` attribute decoding
//!
//! Signatures carry the generic information erased from descriptors: type
//! parameters with their bounds, parameterized supertypes and member types.

use crate::models::types::{
    ClassSignature, MethodSignature, Primitive, TypeArgument, TypeParameter, TypeSignature,
};
use crate::parsers::classfile::ClassParseError;
use crate::parsers::descriptor::internal_to_dotted;

pub fn parse_class_signature(signature: &str) -> Result<ClassSignature, ClassParseError> {
    let mut parser = SignatureParser::new(signature);
    let type_parameters = parser.parse_type_parameters()?;
    let superclass = parser.parse_class_type()?;
    let mut interfaces = Vec::new();
    while !parser.at_end() {
        interfaces.push(parser.parse_class_type()?);
    }
    Ok(ClassSignature {
        type_parameters,
        superclass,
        interfaces,
    })
}

pub fn parse_method_signature(signature: &str) -> Result<MethodSignature, ClassParseError> {
    let mut parser = SignatureParser::new(signature);
    let type_parameters = parser.parse_type_parameters()?;
    parser.expect(b'(')?;
    let mut parameters = Vec::new();
    while parser.peek()? != b')' {
        parameters.push(parser.parse_java_type()?);
    }
    parser.expect(b')')?;
    let return_type = if parser.peek()? == b'V' {
        parser.pos += 1;
        TypeSignature::Void
    } else {
        parser.parse_java_type()?
    };
    let mut throws = Vec::new();
    while !parser.at_end() {
        parser.expect(b'^')?;
        throws.push(parser.parse_reference_type()?);
    }
    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
        throws,
    })
}

pub fn parse_field_signature(signature: &str) -> Result<TypeSignature, ClassParseError> {
    let mut parser = SignatureParser::new(signature);
    let ty = parser.parse_reference_type()?;
    if !parser.at_end() {
        return Err(parser.error());
    }
    Ok(ty)
}

struct SignatureParser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SignatureParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self) -> ClassParseError {
        ClassParseError::InvalidSignature(self.source.to_string())
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Result<u8, ClassParseError> {
        self.bytes.get(self.pos).copied().ok_or_else(|| self.error())
    }

    fn expect(&mut self, ch: u8) -> Result<(), ClassParseError> {
        if self.peek()? != ch {
            return Err(self.error());
        }
        self.pos += 1;
        Ok(())
    }

    /// Consume bytes up to (not including) the first byte in `stops`
    fn take_until(&mut self, stops: &[u8]) -> Result<&'a str, ClassParseError> {
        let start = self.pos;
        while self.pos < self.bytes.len() && !stops.contains(&self.bytes[self.pos]) {
            self.pos += 1;
        }
        if self.at_end() || self.pos == start {
            return Err(self.error());
        }
        Ok(&self.source[start..self.pos])
    }

    fn parse_type_parameters(&mut self) -> Result<Vec<TypeParameter>, ClassParseError> {
        let mut parameters = Vec::new();
        if self.at_end() || self.peek()? != b'<' {
            return Ok(parameters);
        }
        self.pos += 1;
        while self.peek()? != b'>' {
            let name = self.take_until(b":")?.to_string();
            let mut bounds = Vec::new();
            // class bound, possibly empty when only interface bounds follow
            self.expect(b':')?;
            if !matches!(self.peek()?, b':' | b'>') && !self.starts_type_parameter() {
                bounds.push(self.parse_reference_type()?);
            }
            while self.peek()? == b':' {
                self.pos += 1;
                bounds.push(self.parse_reference_type()?);
            }
            parameters.push(TypeParameter { name, bounds });
        }
        self.pos += 1;
        if parameters.is_empty() {
            return Err(self.error());
        }
        Ok(parameters)
    }

    /// After an empty class bound the next byte may start another type
    /// parameter identifier; reference types always start with `L`, `T` or `[`
    fn starts_type_parameter(&self) -> bool {
        !matches!(self.bytes.get(self.pos), Some(b'L') | Some(b'T') | Some(b'['))
    }

    fn parse_java_type(&mut self) -> Result<TypeSignature, ClassParseError> {
        let tag = self.peek()?;
        if let Some(primitive) = Primitive::from_tag(tag) {
            self.pos += 1;
            return Ok(TypeSignature::Base(primitive));
        }
        self.parse_reference_type()
    }

    fn parse_reference_type(&mut self) -> Result<TypeSignature, ClassParseError> {
        match self.peek()? {
            b'L' => self.parse_class_type(),
            b'T' => {
                self.pos += 1;
                let name = self.take_until(b";")?.to_string();
                self.pos += 1;
                Ok(TypeSignature::TypeVariable(name))
            }
            b'[' => {
                self.pos += 1;
                let element = self.parse_java_type()?;
                Ok(TypeSignature::Array(Box::new(element)))
            }
            _ => Err(self.error()),
        }
    }

    fn parse_class_type(&mut self) -> Result<TypeSignature, ClassParseError> {
        self.expect(b'L')?;
        let mut name = internal_to_dotted(self.take_until(b"<.;")?);
        let mut arguments = self.parse_type_arguments()?;
        while self.peek()? == b'.' {
            self.pos += 1;
            let inner = self.take_until(b"<.;")?;
            name.push('$');
            name.push_str(inner);
            arguments.extend(self.parse_type_arguments()?);
        }
        self.expect(b';')?;
        Ok(TypeSignature::Class { name, arguments })
    }

    fn parse_type_arguments(&mut self) -> Result<Vec<TypeArgument>, ClassParseError> {
        let mut arguments = Vec::new();
        if self.peek()? != b'<' {
            return Ok(arguments);
        }
        self.pos += 1;
        while self.peek()? != b'>' {
            let argument = match self.peek()? {
                b'*' => {
                    self.pos += 1;
                    TypeArgument::Unbounded
                }
                b'+' => {
                    self.pos += 1;
                    TypeArgument::Extends(self.parse_reference_type()?)
                }
                b'-' => {
                    self.pos += 1;
                    TypeArgument::Super(self.parse_reference_type()?)
                }
                _ => TypeArgument::Exact(self.parse_reference_type()?),
            };
            arguments.push(argument);
        }
        self.pos += 1;
        if arguments.is_empty() {
            return Err(self.error());
        }
        Ok(arguments)
    }
}
