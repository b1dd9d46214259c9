//! Store configuration via `confstore.toml`
//!
//! Settings choose the document format and how saves treat an existing
//! file. A missing key falls back to its default, so an empty file is a
//! valid configuration.

use crate::DEFAULT_INDENT;
use confstore_core::{ConfigError, Result, WriteAccess};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Conventional settings file name
pub const CONFIG_FILE_NAME: &str = "confstore.toml";

/// Widest indent accepted by [`StoreSettings::validate`]
pub const MAX_INDENT: usize = 16;

/// Canonical document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    /// JSON tree
    #[default]
    Json,
    /// XML tree
    Xml,
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageFormat::Json => f.write_str("json"),
            StorageFormat::Xml => f.write_str("xml"),
        }
    }
}

/// Settings loaded from `confstore.toml`
///
/// # Example
///
/// ```toml
/// format = "xml"
/// indent = 2
/// write_access = "only_if_not_exists"
/// create_if_missing = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSettings {
    /// Document format: `"json"` (default) or `"xml"`
    #[serde(default)]
    pub format: StorageFormat,
    /// Spaces per indent level in canonical text
    #[serde(default = "default_indent")]
    pub indent: usize,
    /// Policy applied by `save`
    #[serde(default)]
    pub write_access: WriteAccess,
    /// Create an empty document when the store file does not exist
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,
}

fn default_indent() -> usize {
    DEFAULT_INDENT
}

fn default_create_if_missing() -> bool {
    true
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            format: StorageFormat::default(),
            indent: default_indent(),
            write_access: WriteAccess::default(),
            create_if_missing: default_create_if_missing(),
        }
    }
}

impl StoreSettings {
    /// Settings for an XML store, other fields at their defaults
    pub fn xml() -> Self {
        StoreSettings {
            format: StorageFormat::Xml,
            ..Default::default()
        }
    }

    /// Returns the default settings file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# confstore configuration
#
# Document format: "json" (default) or "xml"
format = "json"

# Spaces per indent level when rendering the document (default: 4, max: 16)
indent = 4

# Save policy: "overwrite_if_necessary" (default) or "only_if_not_exists"
#   "only_if_not_exists" leaves an existing file untouched
write_access = "overwrite_if_necessary"

# Create an empty store when the file does not exist yet (default: true)
create_if_missing = true
"#
    }

    /// Parse settings from TOML text and validate them
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] if the text is not valid settings.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: StoreSettings = toml::from_str(text)
            .map_err(|e| ConfigError::malformed(format!("invalid settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read and parse settings from a file path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Malformed(message) => {
                ConfigError::malformed(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    /// Write the default settings file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Reject out-of-range values
    pub fn validate(&self) -> Result<()> {
        if self.indent > MAX_INDENT {
            return Err(ConfigError::malformed(format!(
                "indent {} exceeds the maximum of {}",
                self.indent, MAX_INDENT
            )));
        }
        Ok(())
    }
}
