#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "class_refs_it_{}_{}_{}",
        std::process::id(),
        nanos,
        name
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_file(path: &Path, content: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Writes a jar; names ending in `/` become directory entries.
pub fn write_jar(path: &Path, entries: &[(&str, &[u8])]) -> anyhow::Result<()> {
    use zip::write::FileOptions;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options)?;
        } else {
            zip.start_file(*name, options)?;
            zip.write_all(content)?;
        }
    }
    zip.finish()?;
    Ok(())
}

pub fn sorted(refs: class_refs::ReferenceSet) -> Vec<String> {
    let mut names: Vec<String> = refs.into_iter().collect();
    names.sort();
    names
}

/// Minimal class file assembler for tests.
pub struct ClassBuilder {
    pool: Vec<u8>,
    next_index: u16,
    utf8s: HashMap<String, u16>,
    classes: HashMap<String, u16>,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    attributes: Vec<Vec<u8>>,
}

impl ClassBuilder {
    pub fn new(name: &str, super_name: Option<&str>) -> Self {
        let mut builder = Self {
            pool: Vec::new(),
            next_index: 1,
            utf8s: HashMap::new(),
            classes: HashMap::new(),
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        };
        builder.this_class = builder.class(name);
        if let Some(super_name) = super_name {
            builder.super_class = builder.class(super_name);
        }
        builder
    }

    /// `public class <name> extends java.lang.Object` with a default constructor.
    pub fn with_constructor(name: &str) -> Self {
        let mut builder = Self::new(name, Some("java/lang/Object"));
        let init = builder.method_ref("java/lang/Object", "<init>", "()V");
        let [hi, lo] = init.to_be_bytes();
        let code = builder.code(&[0x2a, 0xb7, hi, lo, 0xb1], &[]);
        builder.method("<init>", "()V", vec![code]);
        builder
    }

    /// Appends a raw entry (tag included) occupying `slots` indices.
    pub fn raw_entry(&mut self, bytes: &[u8], slots: u16) -> u16 {
        let index = self.next_index;
        self.pool.extend_from_slice(bytes);
        self.next_index += slots;
        index
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        if let Some(&index) = self.utf8s.get(s) {
            return index;
        }
        let mut bytes = vec![1];
        bytes.extend_from_slice(&(s.len() as u16).to_be_bytes());
        bytes.extend_from_slice(s.as_bytes());
        let index = self.raw_entry(&bytes, 1);
        self.utf8s.insert(s.to_string(), index);
        index
    }

    pub fn class(&mut self, name: &str) -> u16 {
        if let Some(&index) = self.classes.get(name) {
            return index;
        }
        let name_index = self.utf8(name);
        let mut bytes = vec![7];
        bytes.extend_from_slice(&name_index.to_be_bytes());
        let index = self.raw_entry(&bytes, 1);
        self.classes.insert(name.to_string(), index);
        index
    }

    pub fn string(&mut self, s: &str) -> u16 {
        let utf8 = self.utf8(s);
        let mut bytes = vec![8];
        bytes.extend_from_slice(&utf8.to_be_bytes());
        self.raw_entry(&bytes, 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        let mut bytes = vec![5];
        bytes.extend_from_slice(&value.to_be_bytes());
        self.raw_entry(&bytes, 2)
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let mut bytes = vec![12];
        bytes.extend_from_slice(&name.to_be_bytes());
        bytes.extend_from_slice(&descriptor.to_be_bytes());
        self.raw_entry(&bytes, 1)
    }

    fn member_ref(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(owner);
        let nat = self.name_and_type(name, descriptor);
        let mut bytes = vec![tag];
        bytes.extend_from_slice(&class.to_be_bytes());
        bytes.extend_from_slice(&nat.to_be_bytes());
        self.raw_entry(&bytes, 1)
    }

    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(9, owner, name, descriptor)
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(10, owner, name, descriptor)
    }

    pub fn interface(&mut self, name: &str) -> &mut Self {
        let index = self.class(name);
        self.interfaces.push(index);
        self
    }

    pub fn field(&mut self, name: &str, descriptor: &str, attributes: Vec<Vec<u8>>) -> &mut Self {
        let member = self.member(name, descriptor, attributes);
        self.fields.push(member);
        self
    }

    pub fn method(&mut self, name: &str, descriptor: &str, attributes: Vec<Vec<u8>>) -> &mut Self {
        let member = self.member(name, descriptor, attributes);
        self.methods.push(member);
        self
    }

    pub fn class_attribute(&mut self, attribute: Vec<u8>) -> &mut Self {
        self.attributes.push(attribute);
        self
    }

    fn member(&mut self, name: &str, descriptor: &str, attributes: Vec<Vec<u8>>) -> Vec<u8> {
        let mut out = vec![0x00, 0x01];
        out.extend_from_slice(&self.utf8(name).to_be_bytes());
        out.extend_from_slice(&self.utf8(descriptor).to_be_bytes());
        out.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
        for attribute in attributes {
            out.extend_from_slice(&attribute);
        }
        out
    }

    pub fn attribute(&mut self, name: &str, body: &[u8]) -> Vec<u8> {
        let mut out = self.utf8(name).to_be_bytes().to_vec();
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    /// A `Code` attribute; each catch type gets a handler covering the body.
    pub fn code(&mut self, code: &[u8], catch_types: &[&str]) -> Vec<u8> {
        self.code_with_attributes(code, catch_types, Vec::new())
    }

    pub fn code_with_attributes(
        &mut self,
        code: &[u8],
        catch_types: &[&str],
        attributes: Vec<Vec<u8>>,
    ) -> Vec<u8> {
        let mut body = vec![0x00, 0x04, 0x00, 0x04];
        body.extend_from_slice(&(code.len() as u32).to_be_bytes());
        body.extend_from_slice(code);
        body.extend_from_slice(&(catch_types.len() as u16).to_be_bytes());
        for name in catch_types {
            let class = self.class(name);
            body.extend_from_slice(&[0x00, 0x00]);
            body.extend_from_slice(&(code.len() as u16).to_be_bytes());
            body.extend_from_slice(&[0x00, 0x00]);
            body.extend_from_slice(&class.to_be_bytes());
        }
        body.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
        for attribute in attributes {
            body.extend_from_slice(&attribute);
        }
        self.attribute("Code", &body)
    }

    /// A `RuntimeVisibleAnnotations` (or invisible) attribute whose
    /// annotations have no elements.
    pub fn annotations(&mut self, visible: bool, descriptors: &[&str]) -> Vec<u8> {
        let mut body = (descriptors.len() as u16).to_be_bytes().to_vec();
        for descriptor in descriptors {
            body.extend_from_slice(&self.utf8(descriptor).to_be_bytes());
            body.extend_from_slice(&[0x00, 0x00]);
        }
        let name = if visible {
            "RuntimeVisibleAnnotations"
        } else {
            "RuntimeInvisibleAnnotations"
        };
        self.attribute(name, &body)
    }

    pub fn class_list_attribute(&mut self, name: &str, classes: &[&str]) -> Vec<u8> {
        let mut body = (classes.len() as u16).to_be_bytes().to_vec();
        for class in classes {
            body.extend_from_slice(&self.class(class).to_be_bytes());
        }
        self.attribute(name, &body)
    }

    pub fn signature(&mut self, signature: &str) -> Vec<u8> {
        let index = self.utf8(signature);
        self.attribute("Signature", &index.to_be_bytes())
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
        out.extend_from_slice(&self.next_index.to_be_bytes());
        out.extend_from_slice(&self.pool);
        out.extend_from_slice(&[0x00, 0x21]);
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for index in &self.interfaces {
            out.extend_from_slice(&index.to_be_bytes());
        }
        for members in [&self.fields, &self.methods, &self.attributes] {
            out.extend_from_slice(&(members.len() as u16).to_be_bytes());
            for member in members {
                out.extend_from_slice(member);
            }
        }
        out
    }
}
