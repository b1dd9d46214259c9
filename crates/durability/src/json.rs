//! JSON tree persistence adapter
//!
//! Canonical layout:
//!
//! ```json
//! {
//!     "boolean": { "debug": { "value": true } },
//!     "number": { "retries": { "type": "i32", "value": "3" } },
//!     "string": { "name": { "value": "main" } }
//! }
//! ```
//!
//! Numbers are written as JSON strings so that every kind, including the
//! arbitrary-precision ones, survives a round trip exactly. The loader also
//! accepts native JSON numbers and booleans. Unknown top-level members are
//! ignored; a missing or repeated section, or a repeated key within a
//! section, is rejected.

use crate::{insert_unique, DEFAULT_INDENT};
use confstore_core::{
    format_boolean, parse_boolean, ConfigError, DocumentFormat, LoadedEntries, Number, NumberKind,
    PersistenceAdapter, Repository, Result,
};
use serde::de::{self as de, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{json, Map, Value as JsonValue};
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

const VALUE: &str = "value";
const TYPE: &str = "type";

// ============================================================================
// Order-preserving object decoding
// ============================================================================

/// A JSON object decoded as its raw member list, duplicates included
struct Members<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Members<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct MembersVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for MembersVisitor<V> {
            type Value = Members<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> std::result::Result<Self::Value, M::Error> {
                let mut members = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    members.push((key, value));
                }
                Ok(Members(members))
            }
        }

        deserializer.deserialize_map(MembersVisitor(PhantomData))
    }
}

/// A top-level member: an object we may care about, or anything else
enum Member {
    Object(Vec<(String, JsonValue)>),
    Other,
}

impl<'de> Deserialize<'de> for Member {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct MemberVisitor;

        impl<'de> Visitor<'de> for MemberVisitor {
            type Value = Member;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("any JSON value")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> std::result::Result<Member, M::Error> {
                let mut members = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, JsonValue>()? {
                    members.push((key, value));
                }
                Ok(Member::Object(members))
            }

            fn visit_seq<S: SeqAccess<'de>>(self, mut seq: S) -> std::result::Result<Member, S::Error> {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(Member::Other)
            }

            fn visit_bool<E: de::Error>(self, _: bool) -> std::result::Result<Member, E> {
                Ok(Member::Other)
            }

            fn visit_i64<E: de::Error>(self, _: i64) -> std::result::Result<Member, E> {
                Ok(Member::Other)
            }

            fn visit_u64<E: de::Error>(self, _: u64) -> std::result::Result<Member, E> {
                Ok(Member::Other)
            }

            fn visit_f64<E: de::Error>(self, _: f64) -> std::result::Result<Member, E> {
                Ok(Member::Other)
            }

            fn visit_str<E: de::Error>(self, _: &str) -> std::result::Result<Member, E> {
                Ok(Member::Other)
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Member, E> {
                Ok(Member::Other)
            }
        }

        deserializer.deserialize_any(MemberVisitor)
    }
}

// ============================================================================
// JsonDocument
// ============================================================================

/// In-memory JSON document mutated by flush
#[derive(Debug, Clone)]
pub struct JsonDocument {
    sections: [Map<String, JsonValue>; 3],
    indent: usize,
}

impl JsonDocument {
    fn section_mut(&mut self, repository: Repository) -> &mut Map<String, JsonValue> {
        &mut self.sections[repository.index()]
    }

    /// Number of entries in one section of the document
    pub fn entry_count(&self, repository: Repository) -> usize {
        self.sections[repository.index()].len()
    }

    fn to_tree(&self) -> JsonValue {
        let mut root = Map::new();
        for repository in Repository::ALL {
            root.insert(
                repository.name().to_string(),
                JsonValue::Object(self.sections[repository.index()].clone()),
            );
        }
        JsonValue::Object(root)
    }
}

impl Default for JsonDocument {
    fn default() -> Self {
        JsonDocument {
            sections: [Map::new(), Map::new(), Map::new()],
            indent: DEFAULT_INDENT,
        }
    }
}

impl PersistenceAdapter for JsonDocument {
    fn serialize_boolean(&mut self, key: &str, value: bool) -> Result<()> {
        self.section_mut(Repository::Boolean)
            .insert(key.to_string(), json!({ VALUE: value }));
        Ok(())
    }

    fn delete_boolean(&mut self, key: &str) -> Result<()> {
        self.section_mut(Repository::Boolean).remove(key);
        Ok(())
    }

    fn serialize_number(&mut self, key: &str, value: &Number) -> Result<()> {
        self.section_mut(Repository::Number).insert(
            key.to_string(),
            json!({ VALUE: value.to_text(), TYPE: value.kind().tag() }),
        );
        Ok(())
    }

    fn delete_number(&mut self, key: &str) -> Result<()> {
        self.section_mut(Repository::Number).remove(key);
        Ok(())
    }

    fn serialize_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.section_mut(Repository::String)
            .insert(key.to_string(), json!({ VALUE: value }));
        Ok(())
    }

    fn delete_string(&mut self, key: &str) -> Result<()> {
        self.section_mut(Repository::String).remove(key);
        Ok(())
    }

    fn canonical_text(&self) -> Result<String> {
        let indent = " ".repeat(self.indent);
        let mut out = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
        self.to_tree()
            .serialize(&mut serializer)
            .map_err(ConfigError::serialization)?;
        String::from_utf8(out).map_err(ConfigError::serialization)
    }
}

impl DocumentFormat for JsonDocument {
    const NAME: &'static str = "json";

    fn empty() -> Self {
        JsonDocument::default()
    }

    fn load(text: &str) -> Result<(Self, LoadedEntries)> {
        let root: Members<Member> = serde_json::from_str(text)
            .map_err(|e| ConfigError::malformed(format!("invalid JSON document: {}", e)))?;

        let mut found: [Option<Vec<(String, JsonValue)>>; 3] = [None, None, None];
        for (name, member) in root.0 {
            let Some(repository) = Repository::from_name(&name) else {
                continue;
            };
            let slot = &mut found[repository.index()];
            if slot.is_some() {
                return Err(ConfigError::DuplicateSection(repository));
            }
            match member {
                Member::Object(entries) => *slot = Some(entries),
                Member::Other => {
                    return Err(ConfigError::malformed(format!(
                        "section \"{}\" is not an object",
                        repository
                    )))
                }
            }
        }

        let mut document = JsonDocument::default();
        let mut loaded = LoadedEntries::default();
        for repository in Repository::ALL {
            let entries = found[repository.index()]
                .take()
                .ok_or(ConfigError::MissingSection(repository))?;
            for (key, entry) in entries {
                let value = entry
                    .get(VALUE)
                    .ok_or_else(|| ConfigError::malformed_entry(repository, Some(&key), VALUE))?;
                match repository {
                    Repository::Boolean => {
                        let parsed = match value {
                            JsonValue::Bool(b) => *b,
                            JsonValue::String(s) => parse_boolean(s)?,
                            _ => return Err(ConfigError::malformed_entry(repository, Some(&key), VALUE)),
                        };
                        insert_unique(&mut loaded.booleans, repository, key.clone(), parsed)?;
                    }
                    Repository::Number => {
                        let tag = entry
                            .get(TYPE)
                            .and_then(JsonValue::as_str)
                            .ok_or_else(|| ConfigError::malformed_entry(repository, Some(&key), TYPE))?;
                        let kind = NumberKind::from_tag(tag)?;
                        let parsed = match value {
                            JsonValue::String(s) => Number::parse(s, kind)?,
                            JsonValue::Number(n) => Number::parse(&n.to_string(), kind)?,
                            _ => return Err(ConfigError::malformed_entry(repository, Some(&key), VALUE)),
                        };
                        insert_unique(&mut loaded.numbers, repository, key.clone(), parsed)?;
                    }
                    Repository::String => {
                        let parsed = match value {
                            JsonValue::String(s) => s.clone(),
                            JsonValue::Number(n) => n.to_string(),
                            JsonValue::Bool(b) => format_boolean(*b).to_string(),
                            _ => return Err(ConfigError::malformed_entry(repository, Some(&key), VALUE)),
                        };
                        insert_unique(&mut loaded.strings, repository, key.clone(), parsed)?;
                    }
                }
                document.section_mut(repository).insert(key, entry);
            }
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
