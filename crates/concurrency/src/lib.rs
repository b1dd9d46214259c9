//! Concurrency layer for confstore
//!
//! A bare store is single-threaded by construction (`Send`, not `Sync`).
//! This crate provides the one way to share a store across threads:
//! - SynchronizedConfig: forwards every `Config` operation under one
//!   reentrant lock, snapshotting iteration results at the call boundary
//!
//! The lock prevents concurrent corruption of the single document. It does
//! not provide isolation between callers: another thread may flush between
//! two of your calls unless you hold [`SynchronizedConfig::lock`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod synchronized;

pub use synchronized::SynchronizedConfig;
