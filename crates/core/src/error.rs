//! Error types for confstore
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! The variants fall into a small taxonomy that callers can match on:
//!
//! | Class | Variants |
//! |-------|----------|
//! | not-found | `NotFound` |
//! | malformed input | `Malformed`, `MissingSection`, `DuplicateSection`, `MalformedEntry`, `UnknownNumberKind`, `Conversion` |
//! | precondition | `Precondition` |
//! | authorization | `Unauthorized` |
//! | unsupported | `Unsupported` |
//! | transport | `Serialization`, `Listener`, `Io` |

use crate::types::Repository;
use std::io;
use thiserror::Error;

/// Result type alias for confstore operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Error types for the configuration store
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No flushed value exists for the key in the repository
    #[error("Unfound key: {key} in repository {repository}")]
    NotFound {
        /// The requested key
        key: String,
        /// Repository that was searched
        repository: Repository,
    },

    /// Text that could not be parsed as the requested type
    #[error("Malformed input: {0}")]
    Malformed(String),

    /// A required top-level section is absent from a document
    #[error("Missing repository: \"{0}\"")]
    MissingSection(Repository),

    /// A top-level section appears more than once in a document
    #[error("Duplicate repository: \"{0}\"")]
    DuplicateSection(Repository),

    /// An entry is missing a required attribute or carries a bad one
    #[error("The \"{attribute}\" attribute{} in repository \"{repository}\" is either non-existent or malformed", .key.as_ref().map(|k| format!(" for key \"{}\"", k)).unwrap_or_default())]
    MalformedEntry {
        /// Repository holding the entry
        repository: Repository,
        /// Key of the entry, when it could be read
        key: Option<String>,
        /// Name of the offending attribute
        attribute: &'static str,
    },

    /// A number type tag that does not name one of the eight kinds
    #[error("Unknown number kind: {0}")]
    UnknownNumberKind(String),

    /// A stored number cannot be represented in the requested kind
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// A caller-supplied argument violates an operation's precondition
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// An event was raised with a key other than the bus's own
    #[error("Invalid event key")]
    Unauthorized,

    /// The operation is not supported by this store or adapter
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// A persistence adapter failed while mutating or rendering its document
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A change listener failed; delivery to the remaining listeners stopped
    #[error("Listener failed: {0}")]
    Listener(String),

    /// I/O error (file operations, streams)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ConfigError {
    /// Create a not-found error for a key
    pub fn not_found(key: impl Into<String>, repository: Repository) -> Self {
        ConfigError::NotFound {
            key: key.into(),
            repository,
        }
    }

    /// Create a malformed-input error
    pub fn malformed(message: impl Into<String>) -> Self {
        ConfigError::Malformed(message.into())
    }

    /// Create an entry error for a missing or unreadable attribute
    pub fn malformed_entry(
        repository: Repository,
        key: Option<&str>,
        attribute: &'static str,
    ) -> Self {
        ConfigError::MalformedEntry {
            repository,
            key: key.map(str::to_owned),
            attribute,
        }
    }

    /// Create a precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        ConfigError::Precondition(message.into())
    }

    /// Create an unsupported-operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        ConfigError::Unsupported(message.into())
    }

    /// Wrap a backend-specific failure
    pub fn serialization(message: impl std::fmt::Display) -> Self {
        ConfigError::Serialization(message.to_string())
    }

    /// Wrap a failure reported by a change listener
    pub fn listener(message: impl Into<String>) -> Self {
        ConfigError::Listener(message.into())
    }

    /// True for `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::NotFound { .. })
    }

    /// True for every malformed-input variant
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            ConfigError::Malformed(_)
                | ConfigError::MissingSection(_)
                | ConfigError::DuplicateSection(_)
                | ConfigError::MalformedEntry { .. }
                | ConfigError::UnknownNumberKind(_)
                | ConfigError::Conversion(_)
        )
    }

    /// True for `Precondition`
    pub fn is_precondition(&self) -> bool {
        matches!(self, ConfigError::Precondition(_))
    }

    /// True for `Unauthorized`
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ConfigError::Unauthorized)
    }

    /// True for `Unsupported`
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ConfigError::Unsupported(_))
    }
}
