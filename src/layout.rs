//! Layout resource scanner.
//!
//! Elements whose tag name contains a `.` name a fully-qualified view class
//! (`<com.example.CustomView/>`). Attribute values and text carry no
//! references, but the document must be well-formed: names must be valid
//! XML names and every entity reference must resolve. A broken layout fails
//! the run instead of silently contributing nothing.

use quick_xml::Reader;
use quick_xml::events::Event;
use std::path::Path;
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::extract::ReferenceSet;

/// Reads and scans one layout file.
pub fn scan_layout_file(path: &Path) -> Result<ReferenceSet> {
    let contents = std::fs::read(path)
        .map_err(|e| AnalysisError::io(format!("layout {}", path.display()), e))?;
    scan_layout(path, &contents)
}

/// Scans an in-memory layout document; `path` is used for error reporting.
pub fn scan_layout(path: &Path, contents: &[u8]) -> Result<ReferenceSet> {
    let xml_error = |message: String| AnalysisError::XmlParse {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = Reader::from_reader(contents);
    reader.config_mut().trim_text(true);

    let mut refs = ReferenceSet::new();
    let mut open: Vec<String> = Vec::new();
    let mut seen_root = false;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            xml_error(format!("{} (at byte {})", e, reader.error_position()))
        })?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if open.is_empty() && seen_root {
                    return Err(xml_error(format!(
                        "multiple root elements (at byte {})",
                        reader.buffer_position()
                    )));
                }
                seen_root = true;

                let name = std::str::from_utf8(e.name().as_ref())
                    .map_err(|err| xml_error(format!("tag name is not UTF-8: {err}")))?
                    .to_string();
                if !is_xml_name(&name) {
                    return Err(xml_error(format!("invalid element name <{name}>")));
                }
                for attr in e.attributes() {
                    let attr = attr.map_err(|err| xml_error(format!("in <{name}>: {err}")))?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    if !is_xml_name(&key) {
                        return Err(xml_error(format!(
                            "invalid attribute name {key:?} in <{name}>"
                        )));
                    }
                    if attr.value.contains(&b'<') {
                        return Err(xml_error(format!("'<' in value of {key} in <{name}>")));
                    }
                    attr.unescape_value()
                        .map_err(|err| xml_error(format!("in {key} of <{name}>: {err}")))?;
                }

                if name.contains('.') {
                    refs.insert(name.clone());
                }
                if matches!(event, Event::Start(_)) {
                    open.push(name);
                }
            }
            Event::End(ref e) => {
                let name = e.name();
                match open.pop() {
                    Some(expected) if expected.as_bytes() == name.as_ref() => {}
                    Some(expected) => {
                        return Err(xml_error(format!(
                            "expected </{expected}>, found </{}>",
                            String::from_utf8_lossy(name.as_ref())
                        )));
                    }
                    None => {
                        return Err(xml_error(format!(
                            "unmatched </{}>",
                            String::from_utf8_lossy(name.as_ref())
                        )));
                    }
                }
            }
            Event::Text(_) | Event::CData(_) if open.is_empty() => {
                return Err(xml_error("content outside the root element".to_string()));
            }
            Event::Text(ref text) => {
                text.unescape().map_err(|err| {
                    xml_error(format!("{err} (before byte {})", reader.buffer_position()))
                })?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(unclosed) = open.last() {
        return Err(xml_error(format!("unclosed element <{unclosed}>")));
    }
    if !seen_root {
        return Err(xml_error("no root element".to_string()));
    }

    debug!(
        "Scanned layout {}: {} class references",
        path.display(),
        refs.len()
    );
    Ok(refs)
}

/// `Name` production of XML 1.0 (fifth edition).
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}
