//! SynchronizedConfig: a store behind one reentrant lock
//!
//! Every [`Config`] call locks, forwards to the inner store, and unlocks.
//! The lock is a `parking_lot::ReentrantMutex`, so a listener that runs
//! while a put holds the lock can call back into the same facade from the
//! same thread.
//!
//! Iteration results are collected while the lock is held and handed back
//! as owned snapshots; the caller never iterates under the lock.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use confstore_core::{
    Config, Entries, EventBus, Number, PendingOperations, Put, Repository, Result, StoreId,
    WriteAccess,
};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Thread-safe facade over any [`Config`]
pub struct SynchronizedConfig<C> {
    inner: ReentrantMutex<C>,
}

impl<C: Config> SynchronizedConfig<C> {
    /// Wrap `inner`
    pub fn new(inner: C) -> Self {
        SynchronizedConfig {
            inner: ReentrantMutex::new(inner),
        }
    }

    /// Hold the lock across several operations
    ///
    /// Other threads block until the guard is dropped. The current thread may
    /// keep calling the facade while holding it.
    pub fn lock(&self) -> ReentrantMutexGuard<'_, C> {
        self.inner.lock()
    }

    /// Unwrap the inner store
    pub fn into_inner(self) -> C {
        self.inner.into_inner()
    }

    fn flushed_maps(&self) -> (HashMap<String, bool>, HashMap<String, Number>, HashMap<String, String>) {
        let inner = self.inner.lock();
        (inner.map_booleans(), inner.map_numbers(), inner.map_strings())
    }
}

impl<C: Config> Config for SynchronizedConfig<C> {
    fn id(&self) -> StoreId {
        self.inner.lock().id()
    }

    fn get_boolean(&self, key: &str) -> Result<bool> {
        self.inner.lock().get_boolean(key)
    }

    fn get_number(&self, key: &str) -> Result<Number> {
        self.inner.lock().get_number(key)
    }

    fn get_string(&self, key: &str) -> Result<String> {
        self.inner.lock().get_string(key)
    }

    fn contains_key(&self, key: &str, repository: Repository) -> bool {
        self.inner.lock().contains_key(key, repository)
    }

    fn put_boolean_with(&self, key: &str, value: bool, put: Put) -> Result<()> {
        self.inner.lock().put_boolean_with(key, value, put)
    }

    fn put_number_with(&self, key: &str, value: Number, put: Put) -> Result<()> {
        self.inner.lock().put_number_with(key, value, put)
    }

    fn put_string_with(&self, key: &str, value: &str, put: Put) -> Result<()> {
        self.inner.lock().put_string_with(key, value, put)
    }

    fn delete(&self, key: &str, repository: Repository) -> Result<bool> {
        self.inner.lock().delete(key, repository)
    }

    fn boolean_events(&self) -> Arc<EventBus<bool>> {
        self.inner.lock().boolean_events()
    }

    fn number_events(&self) -> Arc<EventBus<Number>> {
        self.inner.lock().number_events()
    }

    fn string_events(&self) -> Arc<EventBus<String>> {
        self.inner.lock().string_events()
    }

    fn iter(&self) -> Entries<'_> {
        let snapshot: Vec<_> = self.inner.lock().iter().collect();
        Entries::new(snapshot.into_iter())
    }

    fn booleans(&self) -> Entries<'_, bool> {
        let snapshot: Vec<_> = self.inner.lock().booleans().collect();
        Entries::new(snapshot.into_iter())
    }

    fn numbers(&self) -> Entries<'_, Number> {
        let snapshot: Vec<_> = self.inner.lock().numbers().collect();
        Entries::new(snapshot.into_iter())
    }

    fn strings(&self) -> Entries<'_, String> {
        let snapshot: Vec<_> = self.inner.lock().strings().collect();
        Entries::new(snapshot.into_iter())
    }

    fn map_booleans(&self) -> HashMap<String, bool> {
        self.inner.lock().map_booleans()
    }

    fn map_numbers(&self) -> HashMap<String, Number> {
        self.inner.lock().map_numbers()
    }

    fn map_strings(&self) -> HashMap<String, String> {
        self.inner.lock().map_strings()
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }

    fn pending_operations(&self) -> PendingOperations {
        self.inner.lock().pending_operations()
    }

    fn flush(&self) -> Result<()> {
        self.inner.lock().flush()
    }

    fn to_canonical(&self) -> Result<String> {
        self.inner.lock().to_canonical()
    }

    fn save_to(&self, path: &Path, access: WriteAccess) -> Result<()> {
        self.inner.lock().save_to(path, access)
    }

    fn save_writer(&self, writer: &mut dyn Write) -> Result<()> {
        self.inner.lock().save_writer(writer)
    }

    fn save(&self) -> Result<()> {
        self.inner.lock().save()
    }

    fn link_to_file(&self, path: &Path) -> Result<()> {
        self.inner.lock().link_to_file(path)
    }

    fn linked_file(&self) -> Option<PathBuf> {
        self.inner.lock().linked_file()
    }
}

impl<C: Config> From<C> for SynchronizedConfig<C> {
    fn from(inner: C) -> Self {
        SynchronizedConfig::new(inner)
    }
}

impl<C: fmt::Debug> fmt::Debug for SynchronizedConfig<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynchronizedConfig")
            .field("inner", &*self.inner.lock())
            .finish()
    }
}

impl<C: fmt::Display> fmt::Display for SynchronizedConfig<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner.lock(), f)
    }
}

/// Equal when the flushed contents are equal
///
/// Each side is snapshotted under its own lock, one after the other, so two
/// facades compared from different threads cannot deadlock.
impl<C: Config, D: Config> PartialEq<SynchronizedConfig<D>> for SynchronizedConfig<C> {
    fn eq(&self, other: &SynchronizedConfig<D>) -> bool {
        if std::ptr::eq(self as *const _ as *const (), other as *const _ as *const ()) {
            return true;
        }
        self.flushed_maps() == other.flushed_maps()
    }
}
