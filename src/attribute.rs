//! Attribute decoding.
//!
//! Attributes that can name a type are decoded into [`Attribute`]; every
//! other attribute (line numbers, source file, stack maps, ...) is stepped
//! over using its declared length and dropped.

use crate::bytecode::{PoolOperand, pool_operands};
use crate::error::{FormatError, malformed};
use crate::pool::ConstantPool;
use crate::reader::ByteReader;

/// Nesting limit for attributes inside attributes and for element values
/// inside annotations.
pub const MAX_NESTING_DEPTH: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Utf8 entry holding the annotation's field descriptor.
    pub type_index: u16,
    pub elements: Vec<ElementValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    /// Primitive or String constant.
    Const,
    Enum { type_name_index: u16 },
    /// Utf8 entry holding a return descriptor (`Lcom/example/Foo;`, `V`, `[I`).
    Class { class_info_index: u16 },
    Annotation(Annotation),
    Array(Vec<ElementValue>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBody {
    pub operands: Vec<PoolOperand>,
    /// Exception handler catch types; 0 (catch-all) entries are dropped.
    pub catch_types: Vec<u16>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnerClass {
    pub inner_class_info: u16,
    /// 0 for local and anonymous classes.
    pub outer_class_info: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordComponent {
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapMethod {
    pub method_ref: u16,
    pub arguments: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Code(CodeBody),
    Exceptions(Vec<u16>),
    Signature(u16),
    /// Any annotation table: visible, invisible, parameter or type annotations.
    Annotations(Vec<Annotation>),
    AnnotationDefault(ElementValue),
    InnerClasses(Vec<InnerClass>),
    EnclosingMethod {
        class_index: u16,
        /// NameAndType, or 0 when not enclosed by a method.
        method_index: u16,
    },
    NestHost(u16),
    NestMembers(Vec<u16>),
    PermittedSubclasses(Vec<u16>),
    Record(Vec<RecordComponent>),
    BootstrapMethods(Vec<BootstrapMethod>),
    /// Descriptor indices from a LocalVariableTable.
    LocalVariables(Vec<u16>),
    /// Signature indices from a LocalVariableTypeTable.
    LocalVariableTypes(Vec<u16>),
}

/// Reads `attributes_count` followed by that many attributes.
pub fn parse_attributes(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<Attribute>, FormatError> {
    parse_nested_attributes(reader, pool, 0)
}

fn parse_nested_attributes(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    depth: usize,
) -> Result<Vec<Attribute>, FormatError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(malformed!("attributes nested more than {} deep", MAX_NESTING_DEPTH));
    }
    let count = reader.read_u16()?;
    let mut attributes = Vec::new();

    for _ in 0..count {
        let name_index = reader.read_u16()?;
        let name = pool.utf8(name_index)?;
        let length = reader.read_u32()? as usize;
        let body = reader.read_bytes(length)?;

        let mut body_reader = ByteReader::new(body);
        let parsed = parse_attribute(name, &mut body_reader, pool, depth)
            .map_err(|e| malformed!("in {} attribute: {}", name, e.message))?;

        if let Some(attribute) = parsed {
            if body_reader.has_more_data() {
                return Err(malformed!(
                    "{} attribute declares {} bytes but only {} were used",
                    name,
                    length,
                    body_reader.pos()
                ));
            }
            attributes.push(attribute);
        }
    }

    Ok(attributes)
}

fn parse_attribute(
    name: &str,
    r: &mut ByteReader<'_>,
    pool: &ConstantPool,
    depth: usize,
) -> Result<Option<Attribute>, FormatError> {
    let attribute = match name {
        "Code" => Attribute::Code(parse_code(r, pool, depth + 1)?),
        "Exceptions" => Attribute::Exceptions(r.read_u16_list()?),
        "Signature" => Attribute::Signature(r.read_u16()?),
        "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
            Attribute::Annotations(parse_annotation_table(r)?)
        }
        "RuntimeVisibleParameterAnnotations" | "RuntimeInvisibleParameterAnnotations" => {
            let parameters = r.read_u8()?;
            let mut annotations = Vec::new();
            for _ in 0..parameters {
                annotations.extend(parse_annotation_table(r)?);
            }
            Attribute::Annotations(annotations)
        }
        "RuntimeVisibleTypeAnnotations" | "RuntimeInvisibleTypeAnnotations" => {
            let count = r.read_u16()?;
            let mut annotations = Vec::with_capacity(count as usize);
            for _ in 0..count {
                skip_type_annotation_target(r)?;
                annotations.push(parse_annotation(r, 0)?);
            }
            Attribute::Annotations(annotations)
        }
        "AnnotationDefault" => Attribute::AnnotationDefault(parse_element_value(r, 0)?),
        "InnerClasses" => {
            let count = r.read_u16()?;
            let mut classes = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let inner_class_info = r.read_u16()?;
                let outer_class_info = r.read_u16()?;
                r.skip(4)?; // inner_name_index, access flags
                classes.push(InnerClass {
                    inner_class_info,
                    outer_class_info,
                });
            }
            Attribute::InnerClasses(classes)
        }
        "EnclosingMethod" => Attribute::EnclosingMethod {
            class_index: r.read_u16()?,
            method_index: r.read_u16()?,
        },
        "NestHost" => Attribute::NestHost(r.read_u16()?),
        "NestMembers" => Attribute::NestMembers(r.read_u16_list()?),
        "PermittedSubclasses" => Attribute::PermittedSubclasses(r.read_u16_list()?),
        "Record" => {
            let count = r.read_u16()?;
            let mut components = Vec::with_capacity(count as usize);
            for _ in 0..count {
                r.skip(2)?; // name_index
                let descriptor_index = r.read_u16()?;
                let attributes = parse_nested_attributes(r, pool, depth + 1)?;
                components.push(RecordComponent {
                    descriptor_index,
                    attributes,
                });
            }
            Attribute::Record(components)
        }
        "BootstrapMethods" => {
            let count = r.read_u16()?;
            let mut methods = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let method_ref = r.read_u16()?;
                let arguments = r.read_u16_list()?;
                methods.push(BootstrapMethod {
                    method_ref,
                    arguments,
                });
            }
            Attribute::BootstrapMethods(methods)
        }
        "LocalVariableTable" => Attribute::LocalVariables(parse_local_variables(r)?),
        "LocalVariableTypeTable" => Attribute::LocalVariableTypes(parse_local_variables(r)?),
        _ => return Ok(None),
    };
    Ok(Some(attribute))
}

fn parse_code(
    r: &mut ByteReader<'_>,
    pool: &ConstantPool,
    depth: usize,
) -> Result<CodeBody, FormatError> {
    r.skip(4)?; // max_stack, max_locals
    let code_length = r.read_u32()? as usize;
    let code = r.read_bytes(code_length)?;
    let operands = pool_operands(code)?;

    let handlers = r.read_u16()?;
    let mut catch_types = Vec::new();
    for _ in 0..handlers {
        r.skip(6)?; // start_pc, end_pc, handler_pc
        let catch_type = r.read_u16()?;
        if catch_type != 0 {
            catch_types.push(catch_type);
        }
    }

    let attributes = parse_nested_attributes(r, pool, depth)?;
    Ok(CodeBody {
        operands,
        catch_types,
        attributes,
    })
}

/// Returns the descriptor (or signature) index of every local variable.
fn parse_local_variables(r: &mut ByteReader<'_>) -> Result<Vec<u16>, FormatError> {
    let count = r.read_u16()?;
    let mut indices = Vec::with_capacity(count as usize);
    for _ in 0..count {
        r.skip(6)?; // start_pc, length, name_index
        indices.push(r.read_u16()?);
        r.skip(2)?; // slot
    }
    Ok(indices)
}

fn parse_annotation_table(r: &mut ByteReader<'_>) -> Result<Vec<Annotation>, FormatError> {
    let count = r.read_u16()?;
    let mut annotations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        annotations.push(parse_annotation(r, 0)?);
    }
    Ok(annotations)
}

fn parse_annotation(r: &mut ByteReader<'_>, depth: usize) -> Result<Annotation, FormatError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(malformed!(
            "element values nested more than {} deep at offset {}",
            MAX_NESTING_DEPTH,
            r.pos()
        ));
    }
    let type_index = r.read_u16()?;
    let pairs = r.read_u16()?;
    let mut elements = Vec::with_capacity(pairs as usize);
    for _ in 0..pairs {
        r.skip(2)?; // element_name_index
        elements.push(parse_element_value(r, depth + 1)?);
    }
    Ok(Annotation {
        type_index,
        elements,
    })
}

fn parse_element_value(r: &mut ByteReader<'_>, depth: usize) -> Result<ElementValue, FormatError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(malformed!(
            "element values nested more than {} deep at offset {}",
            MAX_NESTING_DEPTH,
            r.pos()
        ));
    }
    let tag = r.read_u8()?;
    let value = match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => {
            r.skip(2)?;
            ElementValue::Const
        }
        b'e' => {
            let type_name_index = r.read_u16()?;
            r.skip(2)?; // const_name_index
            ElementValue::Enum { type_name_index }
        }
        b'c' => ElementValue::Class {
            class_info_index: r.read_u16()?,
        },
        b'@' => ElementValue::Annotation(parse_annotation(r, depth + 1)?),
        b'[' => {
            let count = r.read_u16()?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(parse_element_value(r, depth + 1)?);
            }
            ElementValue::Array(values)
        }
        other => {
            return Err(malformed!(
                "unknown element value tag 0x{:02x} at offset {}",
                other,
                r.pos() - 1
            ));
        }
    };
    Ok(value)
}

/// Steps over a type annotation's `target_info` and `type_path`.
fn skip_type_annotation_target(r: &mut ByteReader<'_>) -> Result<(), FormatError> {
    let target_type = r.read_u8()?;
    match target_type {
        0x00 | 0x01 => r.skip(1)?,
        0x10 => r.skip(2)?,
        0x11 | 0x12 => r.skip(2)?,
        0x13..=0x15 => {}
        0x16 => r.skip(1)?,
        0x17 => r.skip(2)?,
        0x40 | 0x41 => {
            let entries = r.read_u16()? as usize;
            r.skip(entries * 6)?;
        }
        0x42 => r.skip(2)?,
        0x43..=0x46 => r.skip(2)?,
        0x47..=0x4b => r.skip(3)?,
        other => {
            return Err(malformed!(
                "unknown type annotation target 0x{:02x} at offset {}",
                other,
                r.pos() - 1
            ));
        }
    }
    let path_length = r.read_u8()? as usize;
    r.skip(path_length * 2)
}
