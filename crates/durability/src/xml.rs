//! XML tree persistence adapter
//!
//! Canonical layout:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8" standalone="yes"?>
//! <config>
//!     <boolean>
//!         <entry key="debug" value="true"/>
//!     </boolean>
//!     <number>
//!         <entry key="retries" value="3" type="i32"/>
//!     </number>
//!     <string/>
//! </config>
//! ```
//!
//! Sections are the direct children of the root element, whatever the root
//! is named. Elements other than the three sections, and children of a
//! section other than `entry`, are ignored and not written back.

use crate::{insert_unique, DEFAULT_INDENT};
use confstore_core::{
    format_boolean, parse_boolean, ConfigError, DocumentFormat, LoadedEntries, Number, NumberKind,
    PersistenceAdapter, Repository, Result,
};
use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use tracing::debug;

const ROOT: &str = "config";
const ENTRY: &[u8] = b"entry";

/// One `<entry/>` element
#[derive(Debug, Clone, PartialEq)]
struct XmlEntry {
    key: String,
    value: String,
    kind: Option<&'static str>,
}

/// In-memory XML document mutated by flush
///
/// Entries keep document order; a serialized key updates its element in
/// place, a new key is appended to the end of its section.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    sections: [Vec<XmlEntry>; 3],
    indent: usize,
}

impl XmlDocument {
    fn upsert(&mut self, repository: Repository, entry: XmlEntry) {
        let section = &mut self.sections[repository.index()];
        match section.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => *existing = entry,
            None => section.push(entry),
        }
    }

    fn remove(&mut self, repository: Repository, key: &str) {
        self.sections[repository.index()].retain(|e| e.key != key);
    }

    /// Number of entries in one section of the document
    pub fn entry_count(&self, repository: Repository) -> usize {
        self.sections[repository.index()].len()
    }

    /// Keys of one section in document order
    pub fn keys(&self, repository: Repository) -> Vec<&str> {
        self.sections[repository.index()]
            .iter()
            .map(|e| e.key.as_str())
            .collect()
    }
}

impl Default for XmlDocument {
    fn default() -> Self {
        XmlDocument {
            sections: [Vec::new(), Vec::new(), Vec::new()],
            indent: DEFAULT_INDENT,
        }
    }
}

impl PersistenceAdapter for XmlDocument {
    fn serialize_boolean(&mut self, key: &str, value: bool) -> Result<()> {
        self.upsert(
            Repository::Boolean,
            XmlEntry {
                key: key.to_string(),
                value: format_boolean(value).to_string(),
                kind: None,
            },
        );
        Ok(())
    }

    fn delete_boolean(&mut self, key: &str) -> Result<()> {
        self.remove(Repository::Boolean, key);
        Ok(())
    }

    fn serialize_number(&mut self, key: &str, value: &Number) -> Result<()> {
        self.upsert(
            Repository::Number,
            XmlEntry {
                key: key.to_string(),
                value: value.to_text(),
                kind: Some(value.kind().tag()),
            },
        );
        Ok(())
    }

    fn delete_number(&mut self, key: &str) -> Result<()> {
        self.remove(Repository::Number, key);
        Ok(())
    }

    fn serialize_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.upsert(
            Repository::String,
            XmlEntry {
                key: key.to_string(),
                value: value.to_string(),
                kind: None,
            },
        );
        Ok(())
    }

    fn delete_string(&mut self, key: &str) -> Result<()> {
        self.remove(Repository::String, key);
        Ok(())
    }

    fn canonical_text(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', self.indent);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(ConfigError::serialization)?;
        writer
            .write_event(Event::Start(BytesStart::new(ROOT)))
            .map_err(ConfigError::serialization)?;

        for repository in Repository::ALL {
            let entries = &self.sections[repository.index()];
            let name = repository.name();
            if entries.is_empty() {
                writer
                    .write_event(Event::Empty(BytesStart::new(name)))
                    .map_err(ConfigError::serialization)?;
                continue;
            }
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(ConfigError::serialization)?;
            for entry in entries {
                let mut element = BytesStart::new("entry");
                element.push_attribute(escaped_attribute("key", &entry.key));
                element.push_attribute(escaped_attribute("value", &entry.value));
                if let Some(tag) = entry.kind {
                    element.push_attribute(("type", tag));
                }
                writer
                    .write_event(Event::Empty(element))
                    .map_err(ConfigError::serialization)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(ConfigError::serialization)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(ROOT)))
            .map_err(ConfigError::serialization)?;
        String::from_utf8(writer.into_inner()).map_err(ConfigError::serialization)
    }
}

/// Attribute with markup escaped and `\n`, `\r`, `\t` kept as character
/// references, which conforming parsers would otherwise normalize to spaces
fn escaped_attribute<'a>(name: &'a str, value: &'a str) -> Attribute<'a> {
    let escaped = escape(value);
    let escaped = if escaped.contains(|c: char| matches!(c, '\n' | '\r' | '\t')) {
        let mut out = String::with_capacity(escaped.len() + 8);
        for c in escaped.chars() {
            match c {
                '\n' => out.push_str("&#10;"),
                '\r' => out.push_str("&#13;"),
                '\t' => out.push_str("&#9;"),
                c => out.push(c),
            }
        }
        Cow::Owned(out)
    } else {
        escaped
    };
    Attribute {
        key: QName(name.as_bytes()),
        value: match escaped {
            Cow::Borrowed(text) => Cow::Borrowed(text.as_bytes()),
            Cow::Owned(text) => Cow::Owned(text.into_bytes()),
        },
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Attributes of an `<entry/>` element
#[derive(Default)]
struct RawEntry {
    key: Option<String>,
    value: Option<String>,
    kind: Option<String>,
}

fn read_entry(element: &BytesStart<'_>) -> Result<RawEntry> {
    let mut raw = RawEntry::default();
    for attribute in element.attributes() {
        let attribute = attribute
            .map_err(|e| ConfigError::malformed(format!("invalid XML attribute: {}", e)))?;
        let text = attribute
            .unescape_value()
            .map_err(|e| ConfigError::malformed(format!("invalid XML attribute value: {}", e)))?
            .into_owned();
        match attribute.key.as_ref() {
            b"key" => raw.key = Some(text),
            b"value" => raw.value = Some(text),
            b"type" => raw.kind = Some(text),
            _ => {}
        }
    }
    Ok(raw)
}

fn accept_entry(
    document: &mut XmlDocument,
    loaded: &mut LoadedEntries,
    repository: Repository,
    raw: RawEntry,
) -> Result<()> {
    let key = raw
        .key
        .ok_or_else(|| ConfigError::malformed_entry(repository, None, "key"))?;
    let value = raw
        .value
        .ok_or_else(|| ConfigError::malformed_entry(repository, Some(&key), "value"))?;

    let mut kind = None;
    match repository {
        Repository::Boolean => {
            insert_unique(&mut loaded.booleans, repository, key.clone(), parse_boolean(&value)?)?;
        }
        Repository::Number => {
            let tag = raw
                .kind
                .ok_or_else(|| ConfigError::malformed_entry(repository, Some(&key), "type"))?;
            let number_kind = NumberKind::from_tag(&tag)?;
            let number = Number::parse(&value, number_kind)?;
            insert_unique(&mut loaded.numbers, repository, key.clone(), number)?;
            kind = Some(number_kind.tag());
        }
        Repository::String => {
            insert_unique(&mut loaded.strings, repository, key.clone(), value.clone())?;
        }
    }
    document.sections[repository.index()].push(XmlEntry { key, value, kind });
    Ok(())
}

impl DocumentFormat for XmlDocument {
    const NAME: &'static str = "xml";

    fn empty() -> Self {
        XmlDocument::default()
    }

    fn load(text: &str) -> Result<(Self, LoadedEntries)> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut document = XmlDocument::default();
        let mut loaded = LoadedEntries::default();
        let mut seen = [false; 3];
        let mut saw_root = false;
        // Element nesting depth; the root element sits at depth 0
        let mut depth = 0usize;
        let mut current: Option<Repository> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| ConfigError::malformed(format!("invalid XML document: {}", e)))?;
            match event {
                Event::Start(ref element) | Event::Empty(ref element) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    match depth {
                        0 => saw_root = true,
                        1 => {
                            let name = element.name();
                            let name = std::str::from_utf8(name.as_ref()).unwrap_or_default();
                            if let Some(repository) = Repository::from_name(name) {
                                if seen[repository.index()] {
                                    return Err(ConfigError::DuplicateSection(repository));
                                }
                                seen[repository.index()] = true;
                                if !is_empty {
                                    current = Some(repository);
                                }
                            }
                        }
                        2 => {
                            if let Some(repository) = current {
                                if element.name().as_ref() == ENTRY {
                                    let raw = read_entry(element)?;
                                    accept_entry(&mut document, &mut loaded, repository, raw)?;
                                }
                            }
                        }
                        _ => {}
                    }
                    if !is_empty {
                        depth += 1;
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if depth == 1 {
                        current = None;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_root {
            return Err(ConfigError::malformed("missing root element"));
        }
        if let Some(repository) = Repository::ALL.into_iter().find(|r| !seen[r.index()]) {
            return Err(ConfigError::MissingSection(repository));
        }

        debug!(
            target: "confstore::durability",
            format = Self::NAME,
            booleans = loaded.booleans.len(),
            numbers = loaded.numbers.len(),
            strings = loaded.strings.len(),
            "Loaded document"
        );
        Ok((document, loaded))
    }

    fn set_indent(&mut self, indent: usize) {
        self.indent = indent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<config>
    <boolean>
        <entry key="debug" value="TRUE"/>
    </boolean>
    <number>
        <entry key="retries" value="3" type="int"/>
        <entry key="big" value="123456789012345678901234567890" type="bigint"/>
    </number>
    <string>
        <entry key="greeting" value="h&amp;llo &quot;w&quot;"/>
        <note>ignored</note>
    </string>
    <extra/>
</config>"#;

    #[test]
    fn test_load_sample() {
        let (doc, loaded) = XmlDocument::load(SAMPLE).unwrap();
        assert_eq!(loaded.booleans["debug"], true);
        assert_eq!(loaded.numbers["retries"], Number::I32(3));
        assert_eq!(loaded.numbers["big"].kind(), NumberKind::BigInt);
        assert_eq!(loaded.strings["greeting"], "h&llo \"w\"");
        assert_eq!(doc.keys(Repository::Number), vec!["retries", "big"]);
    }

    #[test]
    fn test_empty_sections_load() {
        let text = "<config><boolean/><number/><string/></config>";
        let (_, loaded) = XmlDocument::load(text).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_missing_section() {
        let err = XmlDocument::load("<config><boolean/><string/></config>").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection(Repository::Number)));
    }

    #[test]
    fn test_duplicate_section() {
        let text = "<config><boolean/><number/><string/><boolean/></config>";
        let err = XmlDocument::load(text).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSection(Repository::Boolean)));
    }

    #[test]
    fn test_entry_missing_attributes() {
        let text = r#"<config><boolean><entry value="true"/></boolean><number/><string/></config>"#;
        let err = XmlDocument::load(text).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedEntry { attribute: "key", key: None, .. }));

        let text = r#"<config><boolean/><number><entry key="n" value="1"/></number><string/></config>"#;
        let err = XmlDocument::load(text).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedEntry { attribute: "type", .. }));
    }

    #[test]
    fn test_bad_boolean_is_malformed() {
        let text = r#"<config><boolean><entry key="b" value="yes"/></boolean><number/><string/></config>"#;
        assert!(XmlDocument::load(text).unwrap_err().is_malformed());
    }

    #[test]
    fn test_duplicate_key_in_section() {
        let text = r#"<config><boolean/><number/><string><entry key="s" value="1"/><entry key="s" value="2"/></string></config>"#;
        assert!(XmlDocument::load(text).unwrap_err().is_malformed());
    }

    #[test]
    fn test_not_well_formed() {
        assert!(XmlDocument::load("<config><boolean></config>").unwrap_err().is_malformed());
        assert!(XmlDocument::load("").unwrap_err().is_malformed());
    }

    #[test]
    fn test_upsert_keeps_position() {
        let mut doc = XmlDocument::empty();
        doc.serialize_string("a", "1").unwrap();
        doc.serialize_string("b", "2").unwrap();
        doc.serialize_string("a", "3").unwrap();
        assert_eq!(doc.keys(Repository::String), vec!["a", "b"]);

        doc.delete_string("a").unwrap();
        assert_eq!(doc.keys(Repository::String), vec!["b"]);
    }

    #[test]
    fn test_canonical_text_shape() {
        let mut doc = XmlDocument::empty();
        doc.serialize_number("retries", &Number::I32(3)).unwrap();
        let text = doc.canonical_text().unwrap();

        assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
        assert!(text.contains(r#"<entry key="retries" value="3" type="i32"/>"#));
        assert!(text.contains("<boolean/>"));
        assert!(text.contains("\n    <number>"));
    }

    #[test]
    fn test_canonical_text_escapes_and_loads_back() {
        let mut doc = XmlDocument::empty();
        doc.serialize_string("s", "<a & \"b\">").unwrap();
        doc.serialize_boolean("b", false).unwrap();
        let (_, loaded) = XmlDocument::load(&doc.canonical_text().unwrap()).unwrap();
        assert_eq!(loaded.strings["s"], "<a & \"b\">");
        assert_eq!(loaded.booleans["b"], false);
    }

    #[test]
    fn test_whitespace_controls_survive_as_references() {
        let mut doc = XmlDocument::empty();
        doc.serialize_string("tab\tkey", "line one\nline two\r\n").unwrap();
        let text = doc.canonical_text().unwrap();

        let entry = text.lines().find(|line| line.contains("<entry")).unwrap();
        assert!(entry.contains(r#"key="tab&#9;key""#));
        assert!(entry.contains(r#"value="line one&#10;line two&#13;&#10;""#));

        let (_, loaded) = XmlDocument::load(&text).unwrap();
        assert_eq!(loaded.strings["tab\tkey"], "line one\nline two\r\n");
    }
}
