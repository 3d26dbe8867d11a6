//! Constant pool arena.
//!
//! Entries are stored in declaration order and addressed by their 1-based
//! index, exactly as the class format addresses them. Cross-entry links stay
//! plain indices and are resolved on demand, so forward references need no
//! special handling and a dangling index only fails the lookup that hits it.

use crate::error::{FormatError, malformed};
use crate::reader::ByteReader;

/// Which member table a `*ref` entry points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Method,
    InterfaceMethod,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Slot 0 and the upper half of a Long or Double.
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class {
        name_index: u16,
    },
    String {
        string_index: u16,
    },
    MemberRef {
        kind: MemberKind,
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    MethodHandle {
        reference_kind: u8,
        reference_index: u16,
    },
    MethodType {
        descriptor_index: u16,
    },
    Dynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    InvokeDynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    /// A fixed-length kind that is recognised structurally but not decoded.
    Opaque {
        tag: u8,
    },
}

/// Tags whose body length is known even though the entry is not decoded
/// (Module and Package carry a single name index).
const OPAQUE_TAGS: &[(u8, usize)] = &[(19, 2), (20, 2)];

#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// Reads `constant_pool_count` followed by its entries.
    pub fn parse(reader: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let count = reader.read_u16()? as usize;
        if count == 0 {
            return Err(malformed!("constant pool count must be at least 1"));
        }

        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable);

        while entries.len() < count {
            let index = entries.len();
            let tag = reader.read_u8()?;
            let entry = match tag {
                1 => {
                    let len = reader.read_u16()? as usize;
                    let bytes = reader.read_bytes(len)?;
                    Constant::Utf8(decode_modified_utf8(bytes).map_err(|e| {
                        malformed!("constant pool entry #{}: {}", index, e.message)
                    })?)
                }
                3 => Constant::Integer(reader.read_i32()?),
                4 => Constant::Float(f32::from_bits(reader.read_u32()?)),
                5 => Constant::Long(reader.read_u64()? as i64),
                6 => Constant::Double(f64::from_bits(reader.read_u64()?)),
                7 => Constant::Class {
                    name_index: reader.read_u16()?,
                },
                8 => Constant::String {
                    string_index: reader.read_u16()?,
                },
                9..=11 => {
                    let kind = match tag {
                        9 => MemberKind::Field,
                        10 => MemberKind::Method,
                        _ => MemberKind::InterfaceMethod,
                    };
                    Constant::MemberRef {
                        kind,
                        class_index: reader.read_u16()?,
                        name_and_type_index: reader.read_u16()?,
                    }
                }
                12 => Constant::NameAndType {
                    name_index: reader.read_u16()?,
                    descriptor_index: reader.read_u16()?,
                },
                15 => Constant::MethodHandle {
                    reference_kind: reader.read_u8()?,
                    reference_index: reader.read_u16()?,
                },
                16 => Constant::MethodType {
                    descriptor_index: reader.read_u16()?,
                },
                17 => Constant::Dynamic {
                    bootstrap_method_attr_index: reader.read_u16()?,
                    name_and_type_index: reader.read_u16()?,
                },
                18 => Constant::InvokeDynamic {
                    bootstrap_method_attr_index: reader.read_u16()?,
                    name_and_type_index: reader.read_u16()?,
                },
                other => match OPAQUE_TAGS.iter().find(|(t, _)| *t == other) {
                    Some(&(_, len)) => {
                        reader.skip(len)?;
                        Constant::Opaque { tag: other }
                    }
                    None => {
                        return Err(malformed!(
                            "unknown constant pool tag {} at entry #{} (offset {})",
                            other,
                            index,
                            reader.pos() - 1
                        ));
                    }
                },
            };

            let wide = matches!(entry, Constant::Long(_) | Constant::Double(_));
            entries.push(entry);
            if wide {
                if entries.len() >= count {
                    return Err(malformed!(
                        "8-byte constant at entry #{} overruns the pool",
                        index
                    ));
                }
                entries.push(Constant::Unusable);
            }
        }

        Ok(Self { entries })
    }

    /// Number of slots including the unusable slot 0.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn get(&self, index: u16) -> Result<&Constant, FormatError> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => Err(malformed!(
                "invalid constant pool index #{} (pool has {} slots)",
                index,
                self.entries.len()
            )),
            Some(entry) => Ok(entry),
        }
    }

    pub fn utf8(&self, index: u16) -> Result<&str, FormatError> {
        match self.get(index)? {
            Constant::Utf8(s) => Ok(s),
            other => Err(malformed!("entry #{} is not Utf8: {:?}", index, other)),
        }
    }

    /// Resolves a Class entry to its internal name.
    pub fn class_name(&self, index: u16) -> Result<&str, FormatError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            other => Err(malformed!("entry #{} is not a Class: {:?}", index, other)),
        }
    }

    /// Resolves a NameAndType entry to `(name, descriptor)`.
    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str), FormatError> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            other => Err(malformed!(
                "entry #{} is not a NameAndType: {:?}",
                index,
                other
            )),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, c)| !matches!(c, Constant::Unusable))
            .map(|(i, c)| (i as u16, c))
    }
}

/// Decodes the class format's modified UTF-8 (encoded NUL, surrogate pairs
/// written as two 3-byte sequences).
pub fn decode_modified_utf8(bytes: &[u8]) -> Result<String, FormatError> {
    if let Ok(s) = std::str::from_utf8(bytes)
        && !s.contains('\0')
    {
        return Ok(s.to_string());
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let continuation = |offset: usize| -> Result<u16, FormatError> {
            match bytes.get(i + offset) {
                Some(&c) if c & 0xC0 == 0x80 => Ok((c & 0x3F) as u16),
                _ => Err(malformed!("invalid modified UTF-8 sequence at byte {}", i)),
            }
        };
        match b {
            0x01..=0x7F => {
                units.push(b as u16);
                i += 1;
            }
            0xC0..=0xDF => {
                units.push((((b & 0x1F) as u16) << 6) | continuation(1)?);
                i += 2;
            }
            0xE0..=0xEF => {
                units.push((((b & 0x0F) as u16) << 12) | (continuation(1)? << 6) | continuation(2)?);
                i += 3;
            }
            _ => return Err(malformed!("invalid modified UTF-8 byte 0x{:02X} at {}", b, i)),
        }
    }

    Ok(String::from_utf16_lossy(&units))
}
