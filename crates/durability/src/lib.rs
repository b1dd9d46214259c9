//! Durability layer for confstore
//!
//! This crate handles everything that touches a document or disk:
//!
//! - JsonDocument: JSON tree adapter with duplicate-rejecting loader
//! - XmlDocument: XML tree adapter (`<config>` root, `<entry/>` elements)
//! - DetachedDocument: adapter with no backing document
//! - File write policies (overwrite, only-if-not-exists) and link checks
//! - StoreSettings: `confstore.toml` configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod detached;
pub mod file;
pub mod json;
pub mod settings;
pub mod xml;

pub use detached::DetachedDocument;
pub use file::{check_link_target, read_text, write_stream, write_text};
pub use json::JsonDocument;
pub use settings::{StorageFormat, StoreSettings, CONFIG_FILE_NAME};
pub use xml::XmlDocument;

use confstore_core::{ConfigError, Repository, Result};
use std::collections::HashMap;

/// Indent width used when rendering canonical text
pub const DEFAULT_INDENT: usize = 4;

/// Insert a loaded entry, rejecting a key already seen in the same section
pub(crate) fn insert_unique<T>(
    map: &mut HashMap<String, T>,
    repository: Repository,
    key: String,
    value: T,
) -> Result<()> {
    if map.contains_key(&key) {
        return Err(ConfigError::malformed(format!(
            "duplicate key \"{}\" in {} section",
            key, repository
        )));
    }
    map.insert(key, value);
    Ok(())
}
