//! Pending writes stay invisible until flush

use crate::common::*;
use confstore::{Config, ConfigExt, JsonConfig, Repository, XmlConfig};
use proptest::prelude::*;

#[test]
fn test_pending_put_is_not_found() {
    init_tracing();
    let config = JsonConfig::new();
    config.put_string("host", "localhost").unwrap();

    let err = config.get_string("host").unwrap_err();
    assert!(err.is_not_found());
    assert!(config.is_empty());
    assert_eq!(config.pending_operations().puts, 1);
}

#[test]
fn test_pending_put_keeps_previous_value_visible() {
    let config = XmlConfig::new();
    config.put_i32("port", 80).unwrap();
    config.flush().unwrap();

    config.put_i32("port", 8080).unwrap();
    assert_eq!(config.get_i32("port").unwrap(), 80);
    config.flush().unwrap();
    assert_eq!(config.get_i32("port").unwrap(), 8080);
}

#[test]
fn test_contains_key_boundary() {
    let config = JsonConfig::new();
    config.put_boolean("flag", true).unwrap();
    assert!(!config.contains_key("flag", Repository::Boolean));

    config.flush().unwrap();
    assert!(config.contains_key("flag", Repository::Boolean));
    assert!(!config.contains_key("flag", Repository::String));
}

#[test]
fn test_delete_of_flushed_key_hides_it_but_document_waits_for_flush() {
    let config = JsonConfig::new();
    config.put_string("s", "v").unwrap();
    config.flush().unwrap();

    assert!(config.delete("s", Repository::String).unwrap());
    assert!(config.get_string("s").unwrap_err().is_not_found());
    assert!(!config.contains_key("s", Repository::String));
    assert!(config.to_canonical().unwrap().contains("\"s\""));

    config.flush().unwrap();
    assert!(!config.to_canonical().unwrap().contains("\"s\""));
    assert!(!config.delete("s", Repository::String).unwrap());
}

#[test]
fn test_delete_of_pending_key_keeps_flushed_value_until_flush() {
    let config = JsonConfig::new();
    config.put_string("s", "v").unwrap();
    config.flush().unwrap();
    config.put_string("s", "v2").unwrap();

    assert!(config.delete("s", Repository::String).unwrap());
    assert_eq!(config.get_string("s").unwrap(), "v");

    config.flush().unwrap();
    assert!(config.get_string("s").unwrap_err().is_not_found());
    assert!(!config.to_canonical().unwrap().contains("\"s\""));
}

#[test]
fn test_flush_is_idempotent() {
    let config = XmlConfig::new();
    populate_representative(&config).unwrap();
    let first = config.to_canonical().unwrap();

    config.flush().unwrap();
    assert_eq!(config.to_canonical().unwrap(), first);
    config.flush().unwrap();
    assert_eq!(config.to_canonical().unwrap(), first);
}

#[test]
fn test_iteration_sees_flushed_only() {
    let config = JsonConfig::new();
    config.put_boolean("b", true).unwrap();
    config.put_i8("n", 1).unwrap();
    config.flush().unwrap();
    config.put_string("pending", "x").unwrap();

    assert_eq!(config.iter().count(), 2);
    assert_eq!(config.strings().count(), 0);
    assert!(config.map_strings().is_empty());
    assert_eq!(config.len(), 2);
}

proptest! {
    #[test]
    fn prop_pending_strings_are_invisible(key in "[a-z]{1,8}", first in ".*", second in ".*") {
        let config = JsonConfig::new();
        config.put_string(&key, &first).unwrap();
        prop_assert!(config.get_string(&key).unwrap_err().is_not_found());

        config.flush().unwrap();
        config.put_string(&key, &second).unwrap();
        prop_assert_eq!(config.get_string(&key).unwrap(), first);
    }
}
