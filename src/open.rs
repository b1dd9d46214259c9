//! Opening file-linked stores from [`StoreSettings`]

use std::path::Path;

use confstore_concurrency::SynchronizedConfig;
use confstore_core::{Config, ConfigError, DocumentFormat, Result, WriteAccess};
use confstore_durability::{JsonDocument, StorageFormat, StoreSettings, XmlDocument};
use confstore_storage::ConfigStore;
use tracing::info;

/// Open the store at `path` in the format `settings` names
///
/// The file is loaded if it exists. Otherwise, when
/// `settings.create_if_missing` is set, an empty document is written first.
/// The returned store is linked to `path`, so [`Config::save`] writes back to
/// it using `settings.write_access`.
///
/// # Errors
///
/// - [`ConfigError::Precondition`] if the file is missing and may not be
///   created, or `path` is a directory
/// - [`ConfigError::Malformed`] (or a section error) if the document is bad
/// - [`ConfigError::Io`] for filesystem failures
pub fn open(path: &Path, settings: &StoreSettings) -> Result<Box<dyn Config + Send>> {
    settings.validate()?;
    match settings.format {
        StorageFormat::Json => Ok(Box::new(open_as::<JsonDocument>(path, settings)?)),
        StorageFormat::Xml => Ok(Box::new(open_as::<XmlDocument>(path, settings)?)),
    }
}

/// Wrap `config` so it can be shared between threads
pub fn synchronized<C: Config>(config: C) -> SynchronizedConfig<C> {
    SynchronizedConfig::new(config)
}

fn open_as<A>(path: &Path, settings: &StoreSettings) -> Result<ConfigStore<A>>
where
    A: DocumentFormat + Send + 'static,
{
    let created = !path.exists();
    let store = if !created {
        ConfigStore::<A>::read(path)?
    } else if settings.create_if_missing {
        let store = ConfigStore::<A>::new();
        store.set_indent(settings.indent);
        store.save_to(path, WriteAccess::OnlyIfNotExists)?;
        store
    } else {
        return Err(ConfigError::precondition(format!(
            "{} does not exist",
            path.display()
        )));
    };

    store.set_indent(settings.indent);
    store.set_save_access(settings.write_access);
    store.link_to_file(path)?;
    info!(
        target: "confstore::storage",
        path = %path.display(),
        format = %settings.format,
        created,
        entries = store.len(),
        "Opened store"
    );
    Ok(store)
}
