//! confstore - typed, staged key-value configuration store
//!
//! A store holds three repositories (booleans, numbers, strings). Writes are
//! staged and only become visible, and reach the backing document, on
//! [`Config::flush`]. Every staged write and delete raises a change record
//! on the repository's event bus.
//!
//! # Quick Start
//!
//! ```ignore
//! use confstore::{Config, ConfigExt, JsonConfig};
//!
//! let config = JsonConfig::new();
//! config.put_i32("retries", 3)?;
//! assert!(config.get_i32("retries").is_err()); // pending
//! config.flush()?;
//! assert_eq!(config.get_i32("retries")?, 3);
//! println!("{}", config.to_canonical()?);
//! ```
//!
//! # Architecture
//!
//! - `confstore-core`: the [`Config`] contract, numbers, events, errors
//! - `confstore-storage`: [`ConfigStore`], the staged overlays
//! - `confstore-durability`: JSON and XML documents, file policies, settings
//! - `confstore-concurrency`: [`SynchronizedConfig`] for sharing across threads
//!
//! This crate re-exports all of them and adds the format managers and
//! [`open`].

#![warn(missing_docs)]
#![warn(clippy::all)]

mod manager;
mod open;

pub use manager::{ConfigManager, FormatManager, JsonConfigManager, XmlConfigManager};
pub use open::{open, synchronized};

pub use confstore_concurrency::SynchronizedConfig;
pub use confstore_core::*;
pub use confstore_durability::{
    DetachedDocument, JsonDocument, StorageFormat, StoreSettings, XmlDocument, CONFIG_FILE_NAME,
    DEFAULT_INDENT,
};
pub use confstore_storage::ConfigStore;

/// Store backed by a JSON document
pub type JsonConfig = ConfigStore<JsonDocument>;

/// Store backed by an XML document
pub type XmlConfig = ConfigStore<XmlDocument>;
