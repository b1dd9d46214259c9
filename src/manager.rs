//! Format managers: factories for stores of one document format

use std::fmt;
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;

use confstore_core::{DocumentFormat, Result};
use confstore_durability::{JsonDocument, XmlDocument, DEFAULT_INDENT};
use confstore_storage::ConfigStore;

/// Creates and loads stores of a single document format
pub trait ConfigManager {
    /// Document format of the stores this manager produces
    type Format: DocumentFormat;

    /// Indent applied to every store this manager produces
    fn indent(&self) -> usize;

    /// Empty store
    fn new_config(&self) -> ConfigStore<Self::Format> {
        self.prepare(ConfigStore::new())
    }

    /// Store loaded from the file at `path`; the store is not linked to it
    fn read(&self, path: &Path) -> Result<ConfigStore<Self::Format>> {
        ConfigStore::read(path).map(|store| self.prepare(store))
    }

    /// Store loaded from a caller-owned stream
    fn read_from(&self, reader: &mut dyn Read) -> Result<ConfigStore<Self::Format>> {
        ConfigStore::read_from(reader).map(|store| self.prepare(store))
    }

    /// Store loaded from canonical text
    fn parse(&self, text: &str) -> Result<ConfigStore<Self::Format>> {
        ConfigStore::parse(text).map(|store| self.prepare(store))
    }

    #[doc(hidden)]
    fn prepare(&self, store: ConfigStore<Self::Format>) -> ConfigStore<Self::Format> {
        store.set_indent(self.indent());
        store
    }
}

/// [`ConfigManager`] for any [`DocumentFormat`]
pub struct FormatManager<A> {
    indent: usize,
    _format: PhantomData<fn() -> A>,
}

/// Manager producing JSON-backed stores
pub type JsonConfigManager = FormatManager<JsonDocument>;

/// Manager producing XML-backed stores
pub type XmlConfigManager = FormatManager<XmlDocument>;

impl<A: DocumentFormat> FormatManager<A> {
    /// Manager using the default indent
    pub fn new() -> Self {
        Self::with_indent(DEFAULT_INDENT)
    }

    /// Manager whose stores render with `indent` spaces per level
    pub fn with_indent(indent: usize) -> Self {
        FormatManager {
            indent,
            _format: PhantomData,
        }
    }
}

impl<A: DocumentFormat> Default for FormatManager<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for FormatManager<A> {
    fn clone(&self) -> Self {
        FormatManager {
            indent: self.indent,
            _format: PhantomData,
        }
    }
}

impl<A: DocumentFormat> fmt::Debug for FormatManager<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatManager")
            .field("format", &A::NAME)
            .field("indent", &self.indent)
            .finish()
    }
}

impl<A: DocumentFormat> ConfigManager for FormatManager<A> {
    type Format = A;

    fn indent(&self) -> usize {
        self.indent
    }
}
