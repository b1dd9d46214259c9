//! Per-repository overlay: flushed, pending, and deleted state
//!
//! An [`Overlay`] knows nothing about other repositories, events, or
//! documents. It answers three questions:
//!
//! - What is visible? Only `flushed`.
//! - Does a write have something to replace? `flushed`, then `pending`.
//! - What must the next flush reconcile? Everything in `pending` and
//!   `deleted`.
//!
//! # Invariants
//!
//! - A key is never in both `pending` and `deleted`: staging a put removes
//!   the key from `deleted`, staging a delete removes it from `pending`.
//! - After a successful [`Overlay::commit`] both `pending` and `deleted`
//!   are empty.

use confstore_core::{Put, Result};
use std::collections::{HashMap, HashSet};

/// Result of staging a put
#[derive(Debug, Clone, PartialEq)]
pub enum PutOutcome<T> {
    /// `Put::Retain` found an existing value; nothing changed
    Retained,
    /// The value is pending; carries the flushed or pending value it replaced
    Staged(Option<T>),
}

/// One reconciliation step handed to the persistence hooks during commit
#[derive(Debug)]
pub enum Reconcile<'a, T> {
    /// Serialize a pending value
    Write(&'a str, &'a T),
    /// Remove a deleted key from the document
    Remove(&'a str),
}

/// Counts reported by one successful commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitStats {
    /// Pending values serialized and merged into flushed state
    pub written: usize,
    /// Deleted keys removed from the document
    pub removed: usize,
}

/// Flushed / pending / deleted triple for one repository
#[derive(Debug, Clone)]
pub struct Overlay<T> {
    flushed: HashMap<String, T>,
    pending: HashMap<String, T>,
    deleted: HashSet<String>,
}

impl<T> Default for Overlay<T> {
    fn default() -> Self {
        Overlay {
            flushed: HashMap::new(),
            pending: HashMap::new(),
            deleted: HashSet::new(),
        }
    }
}

impl<T: Clone> Overlay<T> {
    /// Create an empty overlay
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an overlay whose flushed state is `flushed`
    pub fn with_flushed(flushed: HashMap<String, T>) -> Self {
        Overlay {
            flushed,
            ..Self::default()
        }
    }

    /// Visible value for `key`
    pub fn get(&self, key: &str) -> Option<&T> {
        self.flushed.get(key)
    }

    /// True if `key` has a visible value
    pub fn contains(&self, key: &str) -> bool {
        self.flushed.contains_key(key)
    }

    /// Value a write to `key` would replace: flushed first, then pending
    pub fn existing(&self, key: &str) -> Option<&T> {
        self.flushed.get(key).or_else(|| self.pending.get(key))
    }

    /// Stage a write of `value` under `key`
    pub fn stage_put(&mut self, key: &str, value: T, put: Put) -> PutOutcome<T> {
        let existing = self.existing(key).cloned();
        if existing.is_some() && put == Put::Retain {
            return PutOutcome::Retained;
        }
        self.pending.insert(key.to_string(), value);
        self.deleted.remove(key);
        PutOutcome::Staged(existing)
    }

    /// Stage removal of `key`
    ///
    /// Takes the value out of `pending` if it is there, otherwise out of
    /// `flushed`, and marks the key deleted. Returns the removed value, or
    /// `None` if the key had neither.
    pub fn stage_delete(&mut self, key: &str) -> Option<T> {
        let removed = self
            .pending
            .remove(key)
            .or_else(|| self.flushed.remove(key))?;
        self.deleted.insert(key.to_string());
        Some(removed)
    }

    /// Reconcile pending writes and deletes
    ///
    /// Every pending value is handed to `apply` as [`Reconcile::Write`] and
    /// then merged into flushed state; every deleted key is then handed over
    /// as [`Reconcile::Remove`] and dropped from flushed state.
    ///
    /// If `apply` fails during the writes, nothing is merged and the overlay
    /// is unchanged, though the hooks that already ran have reached the
    /// document. If it fails during the removals, the writes stay merged
    /// and `deleted` is kept for the next attempt. Hooks must therefore be
    /// idempotent per key.
    pub fn commit<F>(&mut self, mut apply: F) -> Result<CommitStats>
    where
        F: FnMut(Reconcile<'_, T>) -> Result<()>,
    {
        for (key, value) in &self.pending {
            apply(Reconcile::Write(key, value))?;
        }
        let written = self.pending.len();
        self.flushed.extend(self.pending.drain());

        for key in &self.deleted {
            apply(Reconcile::Remove(key))?;
        }
        let removed = self.deleted.len();
        for key in self.deleted.drain() {
            self.flushed.remove(&key);
        }

        Ok(CommitStats { written, removed })
    }

    /// Copy of the flushed state
    pub fn snapshot(&self) -> HashMap<String, T> {
        self.flushed.clone()
    }

    /// Flushed entries as an owned list
    pub fn entries(&self) -> Vec<(String, T)> {
        self.flushed
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of flushed entries
    pub fn len(&self) -> usize {
        self.flushed.len()
    }

    /// True if nothing is flushed
    pub fn is_empty(&self) -> bool {
        self.flushed.is_empty()
    }

    /// Number of staged writes
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of staged deletes
    pub fn deleted_len(&self) -> usize {
        self.deleted.len()
    }

    /// True if `key` is staged for deletion
    pub fn is_deleted(&self, key: &str) -> bool {
        self.deleted.contains(key)
    }
}
