//! Descriptor and generic signature decoding.
//!
//! All functions return internal (slash-delimited) class names; arrays are
//! unwrapped to their element type and primitives yield nothing. Array
//! dimensions and type argument nesting are bounded.

use crate::error::{FormatError, malformed};

/// Array dimension limit for descriptors and signatures.
pub const MAX_ARRAY_DIMENSIONS: usize = 255;

/// Type argument nesting limit for generic signatures.
pub const MAX_TYPE_ARGUMENT_DEPTH: usize = 255;

/// Converts an internal name (`com/example/Foo`) to its canonical form.
pub fn canonical_name(internal: &str) -> String {
    internal.replace('/', ".")
}

/// Resolves the name stored in a Class constant, which is either a plain
/// internal name or an array descriptor (`[[Lcom/example/Foo;`, `[I`).
pub fn class_entry_name(name: &str) -> Result<Option<String>, FormatError> {
    if name.starts_with('[') {
        let mut names = Vec::new();
        let mut cursor = DescriptorCursor::new(name);
        cursor.field_type(&mut names)?;
        cursor.finish()?;
        return Ok(names.pop());
    }
    if name.is_empty() {
        return Err(malformed!("empty class name"));
    }
    Ok(Some(name.to_string()))
}

/// Class names in a field descriptor or a method descriptor.
pub fn descriptor_classes(descriptor: &str) -> Result<Vec<String>, FormatError> {
    let mut names = Vec::new();
    let mut cursor = DescriptorCursor::new(descriptor);
    if cursor.peek() == Some(b'(') {
        cursor.bump();
        while cursor.peek() != Some(b')') {
            cursor.field_type(&mut names)?;
        }
        cursor.bump();
        if cursor.peek() == Some(b'V') {
            cursor.bump();
        } else {
            cursor.field_type(&mut names)?;
        }
    } else {
        cursor.field_type(&mut names)?;
    }
    cursor.finish()?;
    Ok(names)
}

/// Class names in a `Signature` attribute value: a class, method or field
/// signature with generic type arguments and type parameter bounds.
pub fn signature_classes(signature: &str) -> Result<Vec<String>, FormatError> {
    let mut names = Vec::new();
    let mut cursor = DescriptorCursor::new(signature);

    if cursor.peek() == Some(b'<') {
        cursor.type_parameters(&mut names)?;
    }

    if cursor.peek() == Some(b'(') {
        cursor.bump();
        while cursor.peek() != Some(b')') {
            cursor.type_signature(&mut names)?;
        }
        cursor.bump();
        if cursor.peek() == Some(b'V') {
            cursor.bump();
        } else {
            cursor.type_signature(&mut names)?;
        }
        while cursor.peek() == Some(b'^') {
            cursor.bump();
            cursor.type_signature(&mut names)?;
        }
    } else {
        // Field signature, or a superclass followed by interfaces.
        while cursor.peek().is_some() {
            cursor.type_signature(&mut names)?;
        }
    }

    cursor.finish()?;
    Ok(names)
}

struct DescriptorCursor<'a> {
    text: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> DescriptorCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn error(&self, what: &str) -> FormatError {
        malformed!("{} at position {} in {:?}", what, self.pos, self.text)
    }

    fn finish(&self) -> Result<(), FormatError> {
        if self.pos == self.text.len() {
            Ok(())
        } else {
            Err(self.error("unexpected trailing characters"))
        }
    }

    /// Consumes characters up to (not including) the first of `stops`.
    fn identifier(&mut self, stops: &[u8]) -> Result<&'a str, FormatError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start || self.peek().is_none() {
            return Err(self.error("unterminated identifier"));
        }
        Ok(&self.text[start..self.pos])
    }

    fn array_dimensions(&mut self) -> Result<(), FormatError> {
        let mut dimensions = 0;
        while self.peek() == Some(b'[') {
            dimensions += 1;
            if dimensions > MAX_ARRAY_DIMENSIONS {
                return Err(self.error("too many array dimensions"));
            }
            self.bump();
        }
        Ok(())
    }

    fn field_type(&mut self, names: &mut Vec<String>) -> Result<(), FormatError> {
        self.array_dimensions()?;
        match self.peek() {
            Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z') => {
                self.bump();
                Ok(())
            }
            Some(b'L') => {
                self.bump();
                let name = self.identifier(b";")?;
                self.bump();
                names.push(name.to_string());
                Ok(())
            }
            Some(_) => Err(self.error("invalid type")),
            None => Err(self.error("unexpected end of descriptor")),
        }
    }

    fn type_signature(&mut self, names: &mut Vec<String>) -> Result<(), FormatError> {
        self.array_dimensions()?;
        match self.peek() {
            Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z') => {
                self.bump();
                Ok(())
            }
            Some(b'T') => {
                self.bump();
                self.identifier(b";")?;
                self.bump();
                Ok(())
            }
            Some(b'L') => {
                self.bump();
                self.class_type_signature(names)
            }
            Some(_) => Err(self.error("invalid type signature")),
            None => Err(self.error("unexpected end of signature")),
        }
    }

    /// `pkg/Outer<args>.Inner<args>;` after the leading `L`. Each nested
    /// segment contributes the binary name `pkg/Outer$Inner`.
    fn class_type_signature(&mut self, names: &mut Vec<String>) -> Result<(), FormatError> {
        let mut name = self.identifier(b"<.;")?.to_string();
        loop {
            if self.peek() == Some(b'<') {
                self.type_arguments(names)?;
            }
            match self.peek() {
                Some(b'.') => {
                    self.bump();
                    let inner = self.identifier(b"<.;")?;
                    name.push('$');
                    name.push_str(inner);
                }
                Some(b';') => {
                    self.bump();
                    names.push(name);
                    return Ok(());
                }
                _ => return Err(self.error("malformed class type signature")),
            }
        }
    }

    fn type_arguments(&mut self, names: &mut Vec<String>) -> Result<(), FormatError> {
        if self.depth == MAX_TYPE_ARGUMENT_DEPTH {
            return Err(self.error("type arguments nested too deeply"));
        }
        self.depth += 1;
        let result = self.type_argument_list(names);
        self.depth -= 1;
        result
    }

    fn type_argument_list(&mut self, names: &mut Vec<String>) -> Result<(), FormatError> {
        self.bump();
        loop {
            match self.peek() {
                Some(b'>') => {
                    self.bump();
                    return Ok(());
                }
                Some(b'*') => self.bump(),
                Some(b'+' | b'-') => {
                    self.bump();
                    self.type_signature(names)?;
                }
                Some(_) => self.type_signature(names)?,
                None => return Err(self.error("unterminated type arguments")),
            }
        }
    }

    /// `<T:Lbound;U::Liface;>`; a class bound may be empty.
    fn type_parameters(&mut self, names: &mut Vec<String>) -> Result<(), FormatError> {
        self.bump();
        loop {
            match self.peek() {
                Some(b'>') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {
                    self.identifier(b":")?;
                    self.bump();
                    if !matches!(self.peek(), Some(b':' | b'>')) {
                        self.type_signature(names)?;
                    }
                    while self.peek() == Some(b':') {
                        self.bump();
                        self.type_signature(names)?;
                    }
                }
                None => return Err(self.error("unterminated type parameters")),
            }
        }
    }
}
