//! Structured view of a single compiled class.
//!
//! [`ClassFile::parse`] reads the header and the whole constant pool first,
//! then the sections that address the pool by index: supertypes, fields,
//! methods and class attributes.

use crate::attribute::{Attribute, parse_attributes};
use crate::error::{FormatError, malformed};
use crate::pool::ConstantPool;
use crate::reader::ByteReader;

pub const MAGIC: u32 = 0xCAFE_BABE;

/// JDK 1.0.2 class files; anything older is not a class file.
pub const MIN_MAJOR_VERSION: u16 = 45;

/// A field or a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    /// `None` for `java.lang.Object` and `module-info`.
    pub super_class: Option<u16>,
    pub interfaces: Vec<u16>,
    pub fields: Vec<Member>,
    pub methods: Vec<Member>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut reader = ByteReader::new(bytes);

        let magic = reader
            .read_u32()
            .map_err(|_| malformed!("too short to be a class file ({} bytes)", bytes.len()))?;
        if magic != MAGIC {
            return Err(malformed!("bad magic 0x{:08X}", magic));
        }

        let minor_version = reader.read_u16()?;
        let major_version = reader.read_u16()?;
        if major_version < MIN_MAJOR_VERSION {
            return Err(malformed!(
                "unsupported class file version {}.{}",
                major_version,
                minor_version
            ));
        }

        let pool = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u16()?;
        let this_class = reader.read_u16()?;
        let super_class = match reader.read_u16()? {
            0 => None,
            index => Some(index),
        };
        let interfaces = reader.read_u16_list()?;

        let fields = parse_members(&mut reader, &pool, "field")?;
        let methods = parse_members(&mut reader, &pool, "method")?;
        let attributes = parse_attributes(&mut reader, &pool)?;

        if reader.has_more_data() {
            return Err(malformed!(
                "{} trailing bytes after the class structure",
                reader.remaining()
            ));
        }

        Ok(Self {
            minor_version,
            major_version,
            pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// Internal (slash-delimited) name of this class.
    pub fn name(&self) -> Result<&str, FormatError> {
        self.pool.class_name(self.this_class)
    }
}

fn parse_members(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    kind: &str,
) -> Result<Vec<Member>, FormatError> {
    let count = reader.read_u16()?;
    let mut members = Vec::with_capacity(count as usize);
    for i in 0..count {
        let access_flags = reader.read_u16()?;
        let name_index = reader.read_u16()?;
        let descriptor_index = reader.read_u16()?;
        let attributes = parse_attributes(reader, pool)
            .map_err(|e| malformed!("{} #{}: {}", kind, i, e.message))?;
        members.push(Member {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        });
    }
    Ok(members)
}
