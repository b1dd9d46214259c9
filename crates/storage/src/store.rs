//! ConfigStore: the staged put/flush store core
//!
//! A [`ConfigStore`] owns three [`Overlay`]s (boolean, number, string), one
//! [`EventBus`] per repository, and a [`PersistenceAdapter`] that mirrors
//! flushed state into a document.
//!
//! # Design Notes
//!
//! - **Interior mutability**: every operation takes `&self`. State lives in
//!   `RefCell`s, so a store is `Send` (given a `Send` adapter) but not
//!   `Sync`. Share one across threads through the synchronizing facade.
//! - **No borrow across delivery**: puts and deletes release the overlay
//!   before publishing, so a listener holding the store (through the
//!   synchronizing facade) may call back into it.
//! - **Events are write-time only**: flush and load never publish.

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::vec;

use confstore_core::{
    ChangeRecord, Config, ConfigError, DocumentFormat, Entries, EventBus, EventKey, LoadedEntries,
    Number, PendingOperations, PersistenceAdapter, Put, Repository, Result, StoreId, Value,
    WriteAccess,
};
use confstore_durability::{check_link_target, read_text, write_stream, write_text, DetachedDocument};
use tracing::{debug, info, trace};

use crate::overlay::{CommitStats, Overlay, PutOutcome, Reconcile};

/// Typed configuration store over a persistence adapter
pub struct ConfigStore<A> {
    id: StoreId,
    /// Publishing capability for the three buses; never leaves the store
    event_key: EventKey,
    booleans: RefCell<Overlay<bool>>,
    numbers: RefCell<Overlay<Number>>,
    strings: RefCell<Overlay<String>>,
    boolean_events: Arc<EventBus<bool>>,
    number_events: Arc<EventBus<Number>>,
    string_events: Arc<EventBus<String>>,
    adapter: RefCell<A>,
    linked: RefCell<Option<PathBuf>>,
    save_access: Cell<WriteAccess>,
}

impl<A: PersistenceAdapter> ConfigStore<A> {
    /// Create an empty store over `adapter`
    pub fn with_adapter(adapter: A) -> Self {
        Self::from_parts(adapter, LoadedEntries::default())
    }

    /// Create a store whose flushed state is `loaded`
    ///
    /// `adapter` is expected to already hold a document matching `loaded`.
    pub fn from_parts(adapter: A, loaded: LoadedEntries) -> Self {
        let event_key = EventKey::new();
        ConfigStore {
            id: StoreId::new(),
            booleans: RefCell::new(Overlay::with_flushed(loaded.booleans)),
            numbers: RefCell::new(Overlay::with_flushed(loaded.numbers)),
            strings: RefCell::new(Overlay::with_flushed(loaded.strings)),
            boolean_events: Arc::new(EventBus::new(&event_key)),
            number_events: Arc::new(EventBus::new(&event_key)),
            string_events: Arc::new(EventBus::new(&event_key)),
            event_key,
            adapter: RefCell::new(adapter),
            linked: RefCell::new(None),
            save_access: Cell::new(WriteAccess::OverwriteIfNecessary),
        }
    }

    /// Borrow the persistence adapter
    pub fn adapter(&self) -> Ref<'_, A> {
        self.adapter.borrow()
    }

    /// Policy used by [`Config::save`]
    pub fn save_access(&self) -> WriteAccess {
        self.save_access.get()
    }

    /// Set the policy used by [`Config::save`]
    pub fn set_save_access(&self, access: WriteAccess) {
        self.save_access.set(access);
    }

    // === Generic per-repository operations ===

    fn put_in<T: Clone>(
        &self,
        overlay: &RefCell<Overlay<T>>,
        bus: &EventBus<T>,
        repository: Repository,
        key: &str,
        value: T,
        put: Put,
    ) -> Result<()> {
        let announced = if bus.has_listeners() {
            Some(value.clone())
        } else {
            None
        };

        let outcome = overlay.borrow_mut().stage_put(key, value, put);
        let old_value = match outcome {
            PutOutcome::Retained => {
                trace!(target: "confstore::storage", %key, %repository, "Put retained existing value");
                return Ok(());
            }
            PutOutcome::Staged(old_value) => old_value,
        };

        if let Some(new_value) = announced {
            let record = ChangeRecord::put(key, old_value, new_value, repository);
            bus.publish(&self.event_key, self.id, &record)?;
        }
        Ok(())
    }

    fn delete_in<T>(
        &self,
        overlay: &RefCell<Overlay<T>>,
        bus: &EventBus<T>,
        repository: Repository,
        key: &str,
    ) -> Result<bool>
    where
        T: Clone,
    {
        let removed = overlay.borrow_mut().stage_delete(key);
        let Some(old_value) = removed else {
            return Ok(false);
        };

        if bus.has_listeners() {
            let record = ChangeRecord::delete(key, old_value, repository);
            bus.publish(&self.event_key, self.id, &record)?;
        }
        Ok(true)
    }

    fn get_in<T: Clone>(
        &self,
        overlay: &RefCell<Overlay<T>>,
        repository: Repository,
        key: &str,
    ) -> Result<T> {
        overlay
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::not_found(key, repository))
    }

    fn flushed_entries(&self, repository: Repository) -> Vec<(String, Value)> {
        match repository {
            Repository::Boolean => tag_entries(self.booleans.borrow().entries(), Value::Boolean),
            Repository::Number => tag_entries(self.numbers.borrow().entries(), Value::Number),
            Repository::String => tag_entries(self.strings.borrow().entries(), Value::String),
        }
    }
}

fn tag_entries<T>(entries: Vec<(String, T)>, wrap: fn(T) -> Value) -> Vec<(String, Value)> {
    entries.into_iter().map(|(k, v)| (k, wrap(v))).collect()
}

fn log_commit(repository: Repository, stats: CommitStats) {
    if stats != CommitStats::default() {
        debug!(
            target: "confstore::storage",
            %repository,
            written = stats.written,
            removed = stats.removed,
            "Flushed repository"
        );
    }
}

// ============================================================================
// Document-backed construction
// ============================================================================

impl<A: DocumentFormat> ConfigStore<A> {
    /// Create an empty store with an empty document
    pub fn new() -> Self {
        Self::with_adapter(A::empty())
    }

    /// Build a store from canonical text
    pub fn parse(text: &str) -> Result<Self> {
        let (document, loaded) = A::load(text)?;
        Ok(Self::from_parts(document, loaded))
    }

    /// Build a store from a reader yielding canonical text
    pub fn read_from(mut reader: impl Read) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::parse(&text)
    }

    /// Build a store from a file
    ///
    /// The store is not linked to `path`; call [`Config::link_to_file`] to
    /// make it the target of [`Config::save`].
    pub fn read(path: &Path) -> Result<Self> {
        let store = Self::parse(&read_text(path)?)?;
        info!(target: "confstore::storage", path = %path.display(), format = A::NAME, entries = store.len(), "Read store");
        Ok(store)
    }

    /// Spaces per indent level in canonical text
    pub fn set_indent(&self, indent: usize) {
        self.adapter.borrow_mut().set_indent(indent);
    }
}

impl<A: DocumentFormat> Default for ConfigStore<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore<DetachedDocument> {
    /// Create a store with no backing document
    ///
    /// The staged protocol works as usual; every save fails with
    /// [`ConfigError::Unsupported`].
    pub fn detached() -> Self {
        Self::with_adapter(DetachedDocument::new())
    }
}

// ============================================================================
// Config
// ============================================================================

impl<A: PersistenceAdapter> Config for ConfigStore<A> {
    fn id(&self) -> StoreId {
        self.id
    }

    fn get_boolean(&self, key: &str) -> Result<bool> {
        self.get_in(&self.booleans, Repository::Boolean, key)
    }

    fn get_number(&self, key: &str) -> Result<Number> {
        self.get_in(&self.numbers, Repository::Number, key)
    }

    fn get_string(&self, key: &str) -> Result<String> {
        self.get_in(&self.strings, Repository::String, key)
    }

    fn contains_key(&self, key: &str, repository: Repository) -> bool {
        match repository {
            Repository::Boolean => self.booleans.borrow().contains(key),
            Repository::Number => self.numbers.borrow().contains(key),
            Repository::String => self.strings.borrow().contains(key),
        }
    }

    fn put_boolean_with(&self, key: &str, value: bool, put: Put) -> Result<()> {
        self.put_in(&self.booleans, &self.boolean_events, Repository::Boolean, key, value, put)
    }

    fn put_number_with(&self, key: &str, value: Number, put: Put) -> Result<()> {
        self.put_in(&self.numbers, &self.number_events, Repository::Number, key, value, put)
    }

    fn put_string_with(&self, key: &str, value: &str, put: Put) -> Result<()> {
        self.put_in(
            &self.strings,
            &self.string_events,
            Repository::String,
            key,
            value.to_string(),
            put,
        )
    }

    fn delete(&self, key: &str, repository: Repository) -> Result<bool> {
        match repository {
            Repository::Boolean => self.delete_in(&self.booleans, &self.boolean_events, repository, key),
            Repository::Number => self.delete_in(&self.numbers, &self.number_events, repository, key),
            Repository::String => self.delete_in(&self.strings, &self.string_events, repository, key),
        }
    }

    fn boolean_events(&self) -> Arc<EventBus<bool>> {
        Arc::clone(&self.boolean_events)
    }

    fn number_events(&self) -> Arc<EventBus<Number>> {
        Arc::clone(&self.number_events)
    }

    fn string_events(&self) -> Arc<EventBus<String>> {
        Arc::clone(&self.string_events)
    }

    fn iter(&self) -> Entries<'_> {
        Entries::new(FlushedEntries {
            store: self,
            remaining: Repository::ALL.into_iter(),
            current: Vec::new().into_iter(),
        })
    }

    fn booleans(&self) -> Entries<'_, bool> {
        Entries::new(self.booleans.borrow().entries().into_iter())
    }

    fn numbers(&self) -> Entries<'_, Number> {
        Entries::new(self.numbers.borrow().entries().into_iter())
    }

    fn strings(&self) -> Entries<'_, String> {
        Entries::new(self.strings.borrow().entries().into_iter())
    }

    fn map_booleans(&self) -> HashMap<String, bool> {
        self.booleans.borrow().snapshot()
    }

    fn map_numbers(&self) -> HashMap<String, Number> {
        self.numbers.borrow().snapshot()
    }

    fn map_strings(&self) -> HashMap<String, String> {
        self.strings.borrow().snapshot()
    }

    fn len(&self) -> usize {
        self.booleans.borrow().len() + self.numbers.borrow().len() + self.strings.borrow().len()
    }

    fn pending_operations(&self) -> PendingOperations {
        let booleans = self.booleans.borrow();
        let numbers = self.numbers.borrow();
        let strings = self.strings.borrow();
        PendingOperations {
            puts: booleans.pending_len() + numbers.pending_len() + strings.pending_len(),
            deletes: booleans.deleted_len() + numbers.deleted_len() + strings.deleted_len(),
        }
    }

    fn flush(&self) -> Result<()> {
        let mut adapter = self.adapter.borrow_mut();

        let stats = self.booleans.borrow_mut().commit(|op| match op {
            Reconcile::Write(key, value) => adapter.serialize_boolean(key, *value),
            Reconcile::Remove(key) => adapter.delete_boolean(key),
        })?;
        log_commit(Repository::Boolean, stats);

        let stats = self.numbers.borrow_mut().commit(|op| match op {
            Reconcile::Write(key, value) => adapter.serialize_number(key, value),
            Reconcile::Remove(key) => adapter.delete_number(key),
        })?;
        log_commit(Repository::Number, stats);

        let stats = self.strings.borrow_mut().commit(|op| match op {
            Reconcile::Write(key, value) => adapter.serialize_string(key, value),
            Reconcile::Remove(key) => adapter.delete_string(key),
        })?;
        log_commit(Repository::String, stats);

        Ok(())
    }

    fn to_canonical(&self) -> Result<String> {
        self.adapter.borrow().canonical_text()
    }

    fn save_to(&self, path: &Path, access: WriteAccess) -> Result<()> {
        let text = self.to_canonical()?;
        if write_text(path, &text, access)? {
            info!(target: "confstore::storage", path = %path.display(), store = %self.id, "Saved store");
        }
        Ok(())
    }

    fn save_writer(&self, writer: &mut dyn Write) -> Result<()> {
        let text = self.to_canonical()?;
        write_stream(writer, &text)
    }

    fn save(&self) -> Result<()> {
        let path = self
            .linked
            .borrow()
            .clone()
            .ok_or_else(|| ConfigError::precondition("no file linked to save to"))?;
        self.save_to(&path, self.save_access.get())
    }

    fn link_to_file(&self, path: &Path) -> Result<()> {
        let path = check_link_target(path)?;
        debug!(target: "confstore::storage", path = %path.display(), store = %self.id, "Linked store to file");
        *self.linked.borrow_mut() = Some(path);
        Ok(())
    }

    fn linked_file(&self) -> Option<PathBuf> {
        self.linked.borrow().clone()
    }
}

// ============================================================================
// Iteration
// ============================================================================

/// Whole-store iterator that snapshots one repository at a time
///
/// A repository is copied when the cursor first reaches it, so entries
/// flushed into a later repository while iterating are still seen.
struct FlushedEntries<'a, A> {
    store: &'a ConfigStore<A>,
    remaining: std::array::IntoIter<Repository, 3>,
    current: vec::IntoIter<(String, Value)>,
}

impl<'a, A: PersistenceAdapter> Iterator for FlushedEntries<'a, A> {
    type Item = (String, Value);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.next() {
                return Some(entry);
            }
            let repository = self.remaining.next()?;
            self.current = self.store.flushed_entries(repository).into_iter();
        }
    }
}

// ============================================================================
// Formatting & comparison
// ============================================================================

impl<A> fmt::Debug for ConfigStore<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("id", &self.id)
            .field("booleans", &self.booleans.borrow().len())
            .field("numbers", &self.numbers.borrow().len())
            .field("strings", &self.strings.borrow().len())
            .field("linked", &self.linked.borrow())
            .finish()
    }
}

impl<A> fmt::Display for ConfigStore<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigStore {} {{booleans: {}, numbers: {}, strings: {}}}",
            self.id,
            self.booleans.borrow().len(),
            self.numbers.borrow().len(),
            self.strings.borrow().len()
        )
    }
}

/// Stores are equal when their flushed contents are equal
impl<A, B> PartialEq<ConfigStore<B>> for ConfigStore<A> {
    fn eq(&self, other: &ConfigStore<B>) -> bool {
        if std::ptr::eq(self as *const _ as *const (), other as *const _ as *const ()) {
            return true;
        }
        self.booleans.borrow().snapshot() == other.booleans.borrow().snapshot()
            && self.numbers.borrow().snapshot() == other.numbers.borrow().snapshot()
            && self.strings.borrow().snapshot() == other.strings.borrow().snapshot()
    }
}
