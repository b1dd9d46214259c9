//! Shared test utilities for the root integration suite.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use confstore::{
    BigInt, Config, ConfigExt, ConfigStore, DocumentFormat, Number, PersistenceAdapter,
    Repository, Result,
};
use tempfile::TempDir;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Install a `tracing` subscriber driven by `RUST_LOG`
///
/// Output only appears for `cargo test -- --nocapture` with `RUST_LOG` set.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Fixtures
// ============================================================================

/// Temporary directory plus a file path inside it
pub struct TestFile {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestFile {
    pub fn new(name: &str) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join(name);
        TestFile { dir, path }
    }
}

/// An arbitrary-precision integer well beyond the 64-bit range
pub fn huge_int() -> BigInt {
    "123456789012345678901234567890123456789".parse().unwrap()
}

/// Stage and flush the representative values of every kind
#[allow(clippy::approx_constant)]
pub fn populate_representative(config: &dyn Config) -> Result<()> {
    config.put_boolean("yes", true)?;
    config.put_boolean("no", false)?;
    config.put_i32("zero", 0)?;
    config.put_i32("minus_one", -1)?;
    config.put_i64("long_max", i64::MAX)?;
    config.put_f32("pi_f32", 3.14)?;
    config.put_f64("pi_f64", 3.14)?;
    config.put_big_int("huge", huge_int())?;
    config.put_string("greeting", "grüße, 世界 🌍")?;
    config.flush()
}

/// Reload `store` from its own canonical text
pub fn reload<A: DocumentFormat>(store: &ConfigStore<A>) -> ConfigStore<A> {
    ConfigStore::parse(&store.to_canonical().unwrap()).unwrap()
}

/// Flushed numbers keyed by name, with their kind tags
pub fn number_tags(config: &dyn Config) -> Vec<(String, &'static str)> {
    let mut tags: Vec<_> = config
        .map_numbers()
        .into_iter()
        .map(|(k, v): (String, Number)| (k, v.kind().tag()))
        .collect();
    tags.sort();
    tags
}

// ============================================================================
// RecordingAdapter
// ============================================================================

/// Adapter that only records which hooks ran
#[derive(Default)]
pub struct RecordingAdapter {
    pub calls: Vec<(&'static str, Repository, String)>,
}

impl RecordingAdapter {
    pub fn deletes(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter(|(hook, _, _)| *hook == "delete")
            .map(|(_, _, key)| key.as_str())
            .collect()
    }

    fn record(&mut self, hook: &'static str, repository: Repository, key: &str) -> Result<()> {
        self.calls.push((hook, repository, key.to_string()));
        Ok(())
    }
}

impl PersistenceAdapter for RecordingAdapter {
    fn serialize_boolean(&mut self, key: &str, _value: bool) -> Result<()> {
        self.record("serialize", Repository::Boolean, key)
    }

    fn delete_boolean(&mut self, key: &str) -> Result<()> {
        self.record("delete", Repository::Boolean, key)
    }

    fn serialize_number(&mut self, key: &str, _value: &Number) -> Result<()> {
        self.record("serialize", Repository::Number, key)
    }

    fn delete_number(&mut self, key: &str) -> Result<()> {
        self.record("delete", Repository::Number, key)
    }

    fn serialize_string(&mut self, key: &str, _value: &str) -> Result<()> {
        self.record("serialize", Repository::String, key)
    }

    fn delete_string(&mut self, key: &str) -> Result<()> {
        self.record("delete", Repository::String, key)
    }

    fn canonical_text(&self) -> Result<String> {
        Ok(format!("{} hook calls", self.calls.len()))
    }
}
