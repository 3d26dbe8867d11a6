//! Reference extraction over a parsed [`ClassFile`].
//!
//! A single top-down walk visits the supertypes, every member descriptor,
//! every decoded attribute and every constant-pool operand of the method
//! bodies. Names are collected in canonical form; the platform filter is
//! applied once, by [`retain_non_platform`], after the walk.

use std::collections::HashSet;

use crate::attribute::{Annotation, Attribute, ElementValue};
use crate::classfile::ClassFile;
use crate::descriptor::{canonical_name, class_entry_name, descriptor_classes, signature_classes};
use crate::error::{FormatError, malformed};
use crate::pool::Constant;

/// Canonical class names mentioned by one unit or layout file.
pub type ReferenceSet = HashSet<String>;

/// Root package excluded from every report. `javax.` is kept.
pub const PLATFORM_PREFIX: &str = "java.";

/// Parses `bytes` and returns every class name they reference, platform
/// classes excluded.
pub fn class_references(bytes: &[u8]) -> Result<ReferenceSet, FormatError> {
    let class = ClassFile::parse(bytes)?;
    let mut refs = collect_references(&class)?;
    retain_non_platform(&mut refs);
    Ok(refs)
}

/// Every class name `class` mentions, platform classes included.
pub fn collect_references(class: &ClassFile) -> Result<ReferenceSet, FormatError> {
    let mut collector = ReferenceCollector {
        class,
        refs: ReferenceSet::new(),
    };
    collector.visit_class()?;
    Ok(collector.refs)
}

pub fn is_platform_class(name: &str) -> bool {
    name.starts_with(PLATFORM_PREFIX)
}

pub fn retain_non_platform(refs: &mut ReferenceSet) {
    refs.retain(|name| !is_platform_class(name));
}

struct ReferenceCollector<'a> {
    class: &'a ClassFile,
    refs: ReferenceSet,
}

impl ReferenceCollector<'_> {
    fn visit_class(&mut self) -> Result<(), FormatError> {
        let class = self.class;

        if let Some(super_class) = class.super_class {
            self.class_entry(super_class)?;
        }
        for &interface in &class.interfaces {
            self.class_entry(interface)?;
        }

        for (kind, members) in [("field", &class.fields), ("method", &class.methods)] {
            for member in members.iter() {
                let name = class.pool.utf8(member.name_index)?;
                self.descriptor(member.descriptor_index)
                    .and_then(|_| self.attributes(&member.attributes))
                    .map_err(|e| malformed!("{} {}: {}", kind, name, e.message))?;
            }
        }

        self.attributes(&class.attributes)
    }

    fn attributes(&mut self, attributes: &[Attribute]) -> Result<(), FormatError> {
        for attribute in attributes {
            self.attribute(attribute)?;
        }
        Ok(())
    }

    fn attribute(&mut self, attribute: &Attribute) -> Result<(), FormatError> {
        match attribute {
            Attribute::Code(body) => {
                for operand in &body.operands {
                    self.loadable(operand.index).map_err(|e| {
                        malformed!(
                            "opcode 0x{:02x} at pc {}: {}",
                            operand.opcode,
                            operand.offset,
                            e.message
                        )
                    })?;
                }
                for &catch_type in &body.catch_types {
                    self.class_entry(catch_type)?;
                }
                self.attributes(&body.attributes)?;
            }
            Attribute::Exceptions(classes)
            | Attribute::NestMembers(classes)
            | Attribute::PermittedSubclasses(classes) => {
                for &index in classes {
                    self.class_entry(index)?;
                }
            }
            Attribute::NestHost(index) => self.class_entry(*index)?,
            Attribute::Signature(index) => self.signature(*index)?,
            Attribute::Annotations(annotations) => {
                for annotation in annotations {
                    self.annotation(annotation)?;
                }
            }
            Attribute::AnnotationDefault(value) => self.element_value(value)?,
            Attribute::InnerClasses(classes) => {
                for inner in classes {
                    self.class_entry(inner.inner_class_info)?;
                    if inner.outer_class_info != 0 {
                        self.class_entry(inner.outer_class_info)?;
                    }
                }
            }
            Attribute::EnclosingMethod {
                class_index,
                method_index,
            } => {
                self.class_entry(*class_index)?;
                if *method_index != 0 {
                    let class = self.class;
                    let (_, descriptor) = class.pool.name_and_type(*method_index)?;
                    self.descriptor_text(descriptor)?;
                }
            }
            Attribute::Record(components) => {
                for component in components {
                    self.descriptor(component.descriptor_index)?;
                    self.attributes(&component.attributes)?;
                }
            }
            Attribute::BootstrapMethods(methods) => {
                for method in methods {
                    self.loadable(method.method_ref)?;
                    for &argument in &method.arguments {
                        self.loadable(argument)?;
                    }
                }
            }
            Attribute::LocalVariables(descriptors) => {
                for &index in descriptors {
                    self.descriptor(index)?;
                }
            }
            Attribute::LocalVariableTypes(signatures) => {
                for &index in signatures {
                    self.signature(index)?;
                }
            }
        }
        Ok(())
    }

    fn annotation(&mut self, annotation: &Annotation) -> Result<(), FormatError> {
        self.descriptor(annotation.type_index)?;
        for value in &annotation.elements {
            self.element_value(value)?;
        }
        Ok(())
    }

    fn element_value(&mut self, value: &ElementValue) -> Result<(), FormatError> {
        match value {
            ElementValue::Const => {}
            ElementValue::Enum { type_name_index } => self.descriptor(*type_name_index)?,
            ElementValue::Class { class_info_index } => {
                let class = self.class;
                let descriptor = class.pool.utf8(*class_info_index)?;
                if descriptor != "V" {
                    self.descriptor_text(descriptor)?;
                }
            }
            ElementValue::Annotation(nested) => self.annotation(nested)?,
            ElementValue::Array(values) => {
                for value in values {
                    self.element_value(value)?;
                }
            }
        }
        Ok(())
    }

    /// Any constant an instruction or bootstrap argument can point at. Only
    /// type-bearing kinds contribute; String and numeric literals do not.
    fn loadable(&mut self, index: u16) -> Result<(), FormatError> {
        let class = self.class;
        let pool = &class.pool;
        match pool.get(index)? {
            Constant::Class { .. } => self.class_entry(index)?,
            Constant::MemberRef {
                class_index,
                name_and_type_index,
                ..
            } => {
                self.class_entry(*class_index)?;
                let (_, descriptor) = pool.name_and_type(*name_and_type_index)?;
                self.descriptor_text(descriptor)?;
            }
            Constant::MethodHandle {
                reference_index, ..
            } => match pool.get(*reference_index)? {
                Constant::MemberRef { .. } => self.loadable(*reference_index)?,
                other => {
                    return Err(malformed!(
                        "method handle #{} points at {:?}",
                        index,
                        other
                    ));
                }
            },
            Constant::MethodType { descriptor_index } => self.descriptor(*descriptor_index)?,
            Constant::Dynamic {
                name_and_type_index,
                ..
            }
            | Constant::InvokeDynamic {
                name_and_type_index,
                ..
            } => {
                let (_, descriptor) = pool.name_and_type(*name_and_type_index)?;
                self.descriptor_text(descriptor)?;
            }
            Constant::Utf8(_)
            | Constant::Integer(_)
            | Constant::Float(_)
            | Constant::Long(_)
            | Constant::Double(_)
            | Constant::String { .. }
            | Constant::NameAndType { .. }
            | Constant::Opaque { .. }
            | Constant::Unusable => {}
        }
        Ok(())
    }

    fn class_entry(&mut self, index: u16) -> Result<(), FormatError> {
        let class = self.class;
        let name = class.pool.class_name(index)?;
        if let Some(internal) = class_entry_name(name)? {
            self.insert(&internal);
        }
        Ok(())
    }

    fn descriptor(&mut self, index: u16) -> Result<(), FormatError> {
        let class = self.class;
        self.descriptor_text(class.pool.utf8(index)?)
    }

    fn descriptor_text(&mut self, descriptor: &str) -> Result<(), FormatError> {
        for internal in descriptor_classes(descriptor)? {
            self.insert(&internal);
        }
        Ok(())
    }

    fn signature(&mut self, index: u16) -> Result<(), FormatError> {
        let class = self.class;
        for internal in signature_classes(class.pool.utf8(index)?)? {
            self.insert(&internal);
        }
        Ok(())
    }

    fn insert(&mut self, internal: &str) {
        self.refs.insert(canonical_name(internal));
    }
}
