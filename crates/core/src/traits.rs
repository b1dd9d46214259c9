//! Core trait definitions
//!
//! - [`PersistenceAdapter`]: the per-repository serialize/delete hooks a
//!   store invokes while flushing, plus canonical rendering
//! - [`DocumentFormat`]: adapters that can also be created empty or loaded
//!   from canonical text
//! - [`Config`]: the full store contract, implemented by the store core and
//!   by the synchronizing facade
//! - [`ConfigExt`]: typed convenience accessors layered over `Config`

use crate::error::{ConfigError, Result};
use crate::event::EventBus;
use crate::number::{FromNumber, Number};
use crate::types::{Put, Repository, StoreId, WriteAccess};
use crate::value::Value;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// Persistence
// ============================================================================

/// Backend document mutated by a store during flush
///
/// Hooks are only invoked from `flush`. `serialize_*` must be idempotent per
/// key: it updates the existing entry in place or appends one, and never
/// leaves two entries for the same key. `delete_*` removes every entry for
/// the key and is a no-op for an absent key.
///
/// Backend-specific failures are reported as
/// [`ConfigError::Serialization`].
pub trait PersistenceAdapter {
    /// Write or replace a boolean entry
    fn serialize_boolean(&mut self, key: &str, value: bool) -> Result<()>;

    /// Remove a boolean entry
    fn delete_boolean(&mut self, key: &str) -> Result<()>;

    /// Write or replace a number entry, including its kind tag
    fn serialize_number(&mut self, key: &str, value: &Number) -> Result<()>;

    /// Remove a number entry
    fn delete_number(&mut self, key: &str) -> Result<()>;

    /// Write or replace a string entry
    fn serialize_string(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove a string entry
    fn delete_string(&mut self, key: &str) -> Result<()>;

    /// Render the current document, pretty-printed
    ///
    /// # Errors
    ///
    /// Adapters without a textual document return
    /// [`ConfigError::Unsupported`].
    fn canonical_text(&self) -> Result<String>;
}

/// Flushed contents recovered from a canonical document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedEntries {
    /// Boolean repository
    pub booleans: HashMap<String, bool>,
    /// Number repository
    pub numbers: HashMap<String, Number>,
    /// String repository
    pub strings: HashMap<String, String>,
}

impl LoadedEntries {
    /// Total entries across all repositories
    pub fn len(&self) -> usize {
        self.booleans.len() + self.numbers.len() + self.strings.len()
    }

    /// True if no repository holds an entry
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A persistence adapter backed by a parseable text document
pub trait DocumentFormat: PersistenceAdapter + Sized {
    /// Short format name used in logs and settings (`"json"`, `"xml"`)
    const NAME: &'static str;

    /// A document with the three repository sections and no entries
    fn empty() -> Self;

    /// Parse canonical text into a document and its flushed entries
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingSection`] / [`ConfigError::DuplicateSection`]
    ///   if a repository section is absent or repeated
    /// - [`ConfigError::MalformedEntry`] if an entry lacks `key`, `value`,
    ///   or (for numbers) `type`
    /// - [`ConfigError::Malformed`] / [`ConfigError::UnknownNumberKind`] if a
    ///   value does not parse as its declared type
    fn load(text: &str) -> Result<(Self, LoadedEntries)>;

    /// Indent width used by [`PersistenceAdapter::canonical_text`]
    fn set_indent(&mut self, indent: usize);
}

// ============================================================================
// Iteration
// ============================================================================

/// Single-pass iterator over flushed `(key, value)` pairs
///
/// Produced by [`Config::iter`] and the per-repository accessors. Entries are
/// owned copies; there is no way to remove through the iterator.
pub struct Entries<'a, T = Value> {
    inner: Box<dyn Iterator<Item = (String, T)> + 'a>,
}

impl<'a, T> Entries<'a, T> {
    /// Wrap any iterator of owned entries
    pub fn new(iter: impl Iterator<Item = (String, T)> + 'a) -> Self {
        Entries {
            inner: Box::new(iter),
        }
    }
}

impl<'a, T> Iterator for Entries<'a, T> {
    type Item = (String, T);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Buffered writes and deletes awaiting the next flush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingOperations {
    /// Number of pending puts, across repositories
    pub puts: usize,
    /// Number of pending deletes, across repositories
    pub deletes: usize,
}

impl PendingOperations {
    /// Total number of pending operations
    pub fn total(&self) -> usize {
        self.puts + self.deletes
    }

    /// Check if there are no pending operations
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

// ============================================================================
// Config
// ============================================================================

/// The store contract
///
/// # Visibility
///
/// Reads (`get_*`, `contains_key`, iteration, snapshots) see flushed state
/// only. Writes land in a pending overlay and become visible when
/// [`flush`](Config::flush) reconciles them.
///
/// # Flush failures
///
/// Flush is retry-safe per repository but not transactional across
/// repositories: if the adapter fails while flushing one repository, the
/// repositories already flushed stay flushed and the failing one keeps its
/// pending state.
pub trait Config {
    /// Identity of this store, used as the sender of change records
    fn id(&self) -> StoreId;

    // === Reads ===

    /// Flushed boolean value for `key`
    fn get_boolean(&self, key: &str) -> Result<bool>;

    /// Flushed number value for `key`, in its stored kind
    fn get_number(&self, key: &str) -> Result<Number>;

    /// Flushed string value for `key`
    fn get_string(&self, key: &str) -> Result<String>;

    /// True if `key` has a flushed value in `repository`
    ///
    /// Pending writes are not considered present.
    fn contains_key(&self, key: &str, repository: Repository) -> bool;

    // === Writes ===

    /// Stage a boolean write
    fn put_boolean_with(&self, key: &str, value: bool, put: Put) -> Result<()>;

    /// Stage a number write
    fn put_number_with(&self, key: &str, value: Number, put: Put) -> Result<()>;

    /// Stage a string write
    fn put_string_with(&self, key: &str, value: &str, put: Put) -> Result<()>;

    /// Stage removal of `key` from `repository`
    ///
    /// Returns `false` without raising an event if the key has neither a
    /// flushed nor a pending value.
    fn delete(&self, key: &str, repository: Repository) -> Result<bool>;

    // === Events ===

    /// Bus raising boolean change records
    fn boolean_events(&self) -> Arc<EventBus<bool>>;

    /// Bus raising number change records
    fn number_events(&self) -> Arc<EventBus<Number>>;

    /// Bus raising string change records
    fn string_events(&self) -> Arc<EventBus<String>>;

    // === Iteration & snapshots ===

    /// All flushed entries: booleans, then numbers, then strings
    fn iter(&self) -> Entries<'_>;

    /// Flushed boolean entries
    fn booleans(&self) -> Entries<'_, bool>;

    /// Flushed number entries
    fn numbers(&self) -> Entries<'_, Number>;

    /// Flushed string entries
    fn strings(&self) -> Entries<'_, String>;

    /// Copy of the flushed boolean repository
    fn map_booleans(&self) -> HashMap<String, bool>;

    /// Copy of the flushed number repository
    fn map_numbers(&self) -> HashMap<String, Number>;

    /// Copy of the flushed string repository
    fn map_strings(&self) -> HashMap<String, String>;

    /// Number of flushed entries across repositories
    fn len(&self) -> usize;

    /// True if no repository has a flushed entry
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Summary of staged operations
    fn pending_operations(&self) -> PendingOperations;

    // === Commit & persistence ===

    /// Reconcile pending writes and deletes into flushed state
    ///
    /// Repositories commit one at a time (boolean, number, string) and flush
    /// publishes no events.
    ///
    /// # Errors
    ///
    /// The first hook failure stops the flush. Repositories committed before
    /// it stay committed; the failing one keeps its pending writes and
    /// deletes, so calling `flush` again retries them. The document is not
    /// rolled back: hooks that ran before the failure have already changed
    /// it, so [`Config::to_canonical`] may show entries that reads do not
    /// see until a later flush succeeds.
    fn flush(&self) -> Result<()>;

    /// Render the persisted document
    fn to_canonical(&self) -> Result<String>;

    /// Write the canonical text to `path`
    fn save_to(&self, path: &Path, access: WriteAccess) -> Result<()>;

    /// Write the canonical text to a stream
    fn save_writer(&self, writer: &mut dyn Write) -> Result<()>;

    /// Write the canonical text to the linked file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Precondition`] if no file is linked.
    fn save(&self) -> Result<()>;

    /// Link an existing, non-directory file as the target of [`save`](Config::save)
    fn link_to_file(&self, path: &Path) -> Result<()>;

    /// The linked file, if any
    fn linked_file(&self) -> Option<PathBuf>;
}

// ============================================================================
// ConfigExt
// ============================================================================

macro_rules! typed_accessors {
    ($($ty:ty => $get:ident, $get_or:ident, $put:ident, $put_with:ident);* $(;)?) => {
        $(
            #[doc = concat!("Flushed number for `key` read as `", stringify!($ty), "`")]
            fn $get(&self, key: &str) -> Result<$ty> {
                self.get_number_as::<$ty>(key)
            }

            #[doc = concat!("Flushed number for `key` read as `", stringify!($ty), "`, or `default`")]
            fn $get_or(&self, key: &str, default: $ty) -> Result<$ty> {
                self.get_number_or(key, default)
            }

            #[doc = concat!("Stage a `", stringify!($ty), "` write, overwriting")]
            fn $put(&self, key: &str, value: $ty) -> Result<()> {
                self.put_number_with(key, Number::from(value), Put::Overwrite)
            }

            #[doc = concat!("Stage a `", stringify!($ty), "` write with a permission")]
            fn $put_with(&self, key: &str, value: $ty, put: Put) -> Result<()> {
                self.put_number_with(key, Number::from(value), put)
            }
        )*
    };
}

/// Typed accessors for every [`Config`]
///
/// Number reads convert the stored value to the requested representation
/// (see [`Number`] for the rules); the stored kind is unchanged.
pub trait ConfigExt: Config {
    /// Flushed boolean for `key`, or `default`
    fn get_boolean_or(&self, key: &str, default: bool) -> bool {
        self.get_boolean(key).unwrap_or(default)
    }

    /// Flushed string for `key`, or `default`
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    /// Flushed number for `key`, converted to `T`
    fn get_number_as<T: FromNumber>(&self, key: &str) -> Result<T> {
        T::from_number(&self.get_number(key)?)
    }

    /// Flushed number for `key` converted to `T`, or `default` if absent
    fn get_number_or<T: FromNumber>(&self, key: &str, default: T) -> Result<T> {
        match self.get_number(key) {
            Ok(number) => T::from_number(&number),
            Err(ConfigError::NotFound { .. }) => Ok(default),
            Err(e) => Err(e),
        }
    }

    /// Stage a boolean write, overwriting
    fn put_boolean(&self, key: &str, value: bool) -> Result<()> {
        self.put_boolean_with(key, value, Put::Overwrite)
    }

    /// Stage a number write, overwriting
    fn put_number(&self, key: &str, value: impl Into<Number>) -> Result<()> {
        self.put_number_with(key, value.into(), Put::Overwrite)
    }

    /// Stage a string write, overwriting
    fn put_string(&self, key: &str, value: &str) -> Result<()> {
        self.put_string_with(key, value, Put::Overwrite)
    }

    typed_accessors! {
        i8 => get_i8, get_i8_or, put_i8, put_i8_with;
        i16 => get_i16, get_i16_or, put_i16, put_i16_with;
        i32 => get_i32, get_i32_or, put_i32, put_i32_with;
        i64 => get_i64, get_i64_or, put_i64, put_i64_with;
        f32 => get_f32, get_f32_or, put_f32, put_f32_with;
        f64 => get_f64, get_f64_or, put_f64, put_f64_with;
        BigInt => get_big_int, get_big_int_or, put_big_int, put_big_int_with;
        BigDecimal => get_big_decimal, get_big_decimal_or, put_big_decimal, put_big_decimal_with;
    }
}

impl<C: Config + ?Sized> ConfigExt for C {}
