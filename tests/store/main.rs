//! Root integration suite for confstore
//!
//! Exercises the public surface of the `confstore` crate end to end:
//! staged visibility, put permissions, delete-undo, document round trips,
//! event authorization, settings-driven opening, and the façade.

#[path = "../common/mod.rs"]
mod common;

mod events;
mod files;
mod permissions;
mod round_trip;
mod scenario;
mod visibility;
