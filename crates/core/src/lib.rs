//! Core types and traits for confstore
//!
//! This crate defines the vocabulary shared by every other crate:
//! - Repository, Put, WriteAccess, StoreId: store-wide enums and identity
//! - Number / NumberKind: tagged numeric values and their conversions
//! - Value / Entry: values from any repository, as yielded by iteration
//! - ChangeRecord / EventBus / EventKey: key-gated change notification
//! - ConfigError: error type hierarchy
//! - Traits: Config (store contract), ConfigExt, PersistenceAdapter, DocumentFormat

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod contract;
pub mod error;
pub mod event;
pub mod number;
pub mod traits;
pub mod types;
pub mod value;

pub use contract::{format_boolean, parse_boolean};
pub use error::{ConfigError, Result};
pub use event::{
    BooleanRecord, ChangeRecord, ConfigListener, EventBus, EventKey, ListenerHandle, NumberRecord,
    StringRecord,
};
pub use number::{FromNumber, Number, NumberKind};
pub use traits::{
    Config, ConfigExt, DocumentFormat, Entries, LoadedEntries, PendingOperations,
    PersistenceAdapter,
};
pub use types::{ChangeAction, Put, Repository, StoreId, WriteAccess};
pub use value::{Entry, Value};

// Numeric backends used by `Number`, re-exported so callers need no direct dependency
pub use bigdecimal::BigDecimal;
pub use num_bigint::BigInt;
