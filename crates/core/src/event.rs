//! Change notification for store repositories
//!
//! Every store owns one [`EventBus`] per repository. A bus is bound at
//! construction to an [`EventKey`], and only a caller presenting that same
//! key (compared by allocation identity, never by value) may publish on it.
//! The owning store keeps its key private, so outside code can subscribe to
//! a store's buses but cannot forge changes on them.
//!
//! # Delivery
//!
//! Publishing is synchronous: every listener runs on the publishing thread,
//! in unspecified order, before `publish` returns. Delivery iterates a
//! snapshot of the listener set, so a listener may subscribe, unsubscribe,
//! or call back into the store while it runs.
//!
//! Listener failures are not contained. The first listener that returns an
//! error stops delivery to the remaining listeners and the error is
//! returned to whoever raised the event.

use crate::error::{ConfigError, Result};
use crate::number::Number;
use crate::types::{ChangeAction, Repository, StoreId};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

// ============================================================================
// EventKey
// ============================================================================

/// Capability required to publish on an [`EventBus`]
///
/// Deliberately not `Clone`: a bus remembers which allocation its key lives
/// in, and a freshly constructed key never matches an existing bus.
pub struct EventKey {
    token: Arc<()>,
}

impl EventKey {
    /// Create a new, unique key
    pub fn new() -> Self {
        EventKey {
            token: Arc::new(()),
        }
    }
}

impl Default for EventKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventKey(..)")
    }
}

// ============================================================================
// ChangeRecord
// ============================================================================

/// Description of one successful put or delete
///
/// Created by the store at the moment of mutation and handed to listeners;
/// the store does not retain it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord<T> {
    key: String,
    old_value: Option<T>,
    new_value: Option<T>,
    repository: Repository,
    action: ChangeAction,
}

impl<T> ChangeRecord<T> {
    /// Record a put; `old_value` is the flushed or pending value it replaced
    pub fn put(
        key: impl Into<String>,
        old_value: Option<T>,
        new_value: T,
        repository: Repository,
    ) -> Self {
        ChangeRecord {
            key: key.into(),
            old_value,
            new_value: Some(new_value),
            repository,
            action: ChangeAction::Put,
        }
    }

    /// Record a delete of `old_value`
    pub fn delete(key: impl Into<String>, old_value: T, repository: Repository) -> Self {
        ChangeRecord {
            key: key.into(),
            old_value: Some(old_value),
            new_value: None,
            repository,
            action: ChangeAction::Delete,
        }
    }

    /// The changed key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The value before the change
    pub fn old_value(&self) -> Option<&T> {
        self.old_value.as_ref()
    }

    /// The value after the change; `None` for deletes
    pub fn new_value(&self) -> Option<&T> {
        self.new_value.as_ref()
    }

    /// The repository that changed
    pub fn repository(&self) -> Repository {
        self.repository
    }

    /// Whether this was a put or a delete
    pub fn action(&self) -> ChangeAction {
        self.action
    }
}

impl<T> fmt::Display for ChangeRecord<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {{repository: {}, change: {}}}",
            self.key, self.repository, self.action
        )
    }
}

/// Change record raised on a boolean bus
pub type BooleanRecord = ChangeRecord<bool>;
/// Change record raised on a number bus
pub type NumberRecord = ChangeRecord<Number>;
/// Change record raised on a string bus
pub type StringRecord = ChangeRecord<String>;

// ============================================================================
// ConfigListener
// ============================================================================

/// Subscriber to a repository's change records
///
/// Implemented for any `Fn(StoreId, &ChangeRecord<T>) -> Result<()>`
/// closure that is `Send + Sync`.
pub trait ConfigListener<T>: Send + Sync {
    /// Handle one change raised by `sender`
    ///
    /// Returning an error aborts delivery to the listeners that have not
    /// run yet and fails the mutating call that raised the event.
    fn on_event(&self, sender: StoreId, record: &ChangeRecord<T>) -> Result<()>;
}

impl<T, F> ConfigListener<T> for F
where
    F: Fn(StoreId, &ChangeRecord<T>) -> Result<()> + Send + Sync,
{
    fn on_event(&self, sender: StoreId, record: &ChangeRecord<T>) -> Result<()> {
        self(sender, record)
    }
}

/// Shared handle to a listener; identity is the `Arc` allocation
pub type ListenerHandle<T> = Arc<dyn ConfigListener<T>>;

fn same_listener<T>(a: &ListenerHandle<T>, b: &ListenerHandle<T>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

// ============================================================================
// EventBus
// ============================================================================

/// Key-gated publish/subscribe channel for one repository
pub struct EventBus<T> {
    key: Arc<()>,
    listeners: Mutex<Vec<ListenerHandle<T>>>,
}

impl<T> EventBus<T> {
    /// Create a bus that only accepts events published with `key`
    pub fn new(key: &EventKey) -> Self {
        EventBus {
            key: Arc::clone(&key.token),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Add a listener
    ///
    /// Listeners form an identity set: subscribing the same handle twice
    /// keeps a single registration. Returns `true` if it was added.
    pub fn subscribe(&self, listener: ListenerHandle<T>) -> bool {
        let mut listeners = self.listeners.lock();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Remove a listener; returns `false` if it was not subscribed
    pub fn unsubscribe(&self, listener: &ListenerHandle<T>) -> bool {
        let mut listeners = self.listeners.lock();
        match listeners.iter().position(|l| same_listener(l, listener)) {
            Some(index) => {
                listeners.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// True if at least one listener is subscribed
    ///
    /// Publishers use this to skip building records nobody will see.
    pub fn has_listeners(&self) -> bool {
        !self.listeners.lock().is_empty()
    }

    /// Number of subscribed listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Deliver a record to every current listener
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Unauthorized`] if `key` is not the key this bus was
    ///   created with; no listener is invoked.
    /// - The first error returned by a listener; later listeners are skipped.
    pub fn publish(&self, key: &EventKey, sender: StoreId, record: &ChangeRecord<T>) -> Result<()> {
        if !Arc::ptr_eq(&self.key, &key.token) {
            warn!(target: "confstore::event", key = %record.key(), "Rejected event raised with a foreign key");
            return Err(ConfigError::Unauthorized);
        }

        let snapshot: Vec<ListenerHandle<T>> = self.listeners.lock().clone();
        trace!(
            target: "confstore::event",
            key = %record.key(),
            action = %record.action(),
            listeners = snapshot.len(),
            "Publishing change"
        );
        for listener in snapshot {
            listener.on_event(sender, record)?;
        }
        Ok(())
    }
}

impl<T> fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
