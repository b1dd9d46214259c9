//! Adapter with no backing document
//!
//! Stores built on [`DetachedDocument`] keep the full staged put/flush
//! protocol in memory, but have nothing to render: every canonical-text
//! request, and therefore every save, fails with
//! [`ConfigError::Unsupported`](confstore_core::ConfigError::Unsupported).

use confstore_core::{ConfigError, Number, PersistenceAdapter, Result};

/// Persistence adapter whose hooks do nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedDocument;

impl DetachedDocument {
    /// Create a detached adapter
    pub fn new() -> Self {
        DetachedDocument
    }
}

impl PersistenceAdapter for DetachedDocument {
    fn serialize_boolean(&mut self, _key: &str, _value: bool) -> Result<()> {
        Ok(())
    }

    fn delete_boolean(&mut self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn serialize_number(&mut self, _key: &str, _value: &Number) -> Result<()> {
        Ok(())
    }

    fn delete_number(&mut self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn serialize_string(&mut self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }

    fn delete_string(&mut self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn canonical_text(&self) -> Result<String> {
        Err(ConfigError::unsupported(
            "a detached store has no document to render",
        ))
    }
}
