//! Core vocabulary types
//!
//! This module defines the small closed enumerations shared by every layer:
//! - Repository: the three value namespaces (boolean, number, string)
//! - Put: write permission policy (overwrite vs retain)
//! - WriteAccess: file write policy for `save`
//! - ChangeAction: what a change record describes
//! - StoreId: identity of a store instance, used as the event sender

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One of the three independent value namespaces of a store
///
/// The same key string may exist in all three repositories at once;
/// repositories never share storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repository {
    /// `bool` values
    Boolean,
    /// Values of any [`NumberKind`](crate::NumberKind)
    Number,
    /// UTF-8 text values
    String,
}

impl Repository {
    /// All repositories in canonical order (boolean, number, string)
    pub const ALL: [Repository; 3] = [Repository::Boolean, Repository::Number, Repository::String];

    /// Section name used in canonical documents
    pub fn name(&self) -> &'static str {
        match self {
            Repository::Boolean => "boolean",
            Repository::Number => "number",
            Repository::String => "string",
        }
    }

    /// Resolve a section name
    pub fn from_name(name: &str) -> Option<Repository> {
        Repository::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Position in canonical order
    pub fn index(&self) -> usize {
        match self {
            Repository::Boolean => 0,
            Repository::Number => 1,
            Repository::String => 2,
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Write permission for `put` operations
///
/// `Retain` checks the flushed value first, then the pending value; if
/// either exists the write is dropped without raising an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Put {
    /// Replace any existing flushed or pending value
    #[default]
    Overwrite,
    /// Keep the existing value if there is one
    Retain,
}

/// File write policy for saving a store to a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteAccess {
    /// Create the file, or replace its contents
    #[default]
    OverwriteIfNecessary,
    /// Write only when the target does not exist yet; otherwise a silent no-op
    OnlyIfNotExists,
}

/// The mutation described by a change record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    /// A value was written
    Put,
    /// A value was deleted
    Delete,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeAction::Put => f.write_str("put"),
            ChangeAction::Delete => f.write_str("delete"),
        }
    }
}

/// Unique identifier of a store instance
///
/// Passed to listeners as the sender of every change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreId(Uuid);

impl StoreId {
    /// Create a new random StoreId
    pub fn new() -> Self {
        StoreId(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
