//! Storage layer for confstore
//!
//! This crate implements the staged store core:
//! - Overlay: flushed / pending / deleted state for one repository
//! - ConfigStore: three overlays, three event buses, and a persistence
//!   adapter behind the `Config` contract
//!
//! # Visibility
//!
//! Reads see flushed state only. Puts and deletes are staged and reach the
//! adapter, and readers, at the next `flush`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod overlay;
pub mod store;

pub use overlay::{CommitStats, Overlay, PutOutcome, Reconcile};
pub use store::ConfigStore;
