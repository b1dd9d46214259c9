//! Put permissions and delete-undo

use crate::common::*;
use confstore::{Config, ConfigExt, ConfigStore, JsonConfig, Put, Repository, XmlConfig};
use proptest::prelude::*;

#[test]
fn test_retain_keeps_flushed_value() {
    let config = JsonConfig::new();
    config.put_string("k", "v1").unwrap();
    config.flush().unwrap();
    config.put_string_with("k", "v2", Put::Retain).unwrap();
    config.flush().unwrap();
    assert_eq!(config.get_string("k").unwrap(), "v1");
}

#[test]
fn test_overwrite_replaces_flushed_value() {
    let config = JsonConfig::new();
    config.put_string("k", "v1").unwrap();
    config.flush().unwrap();
    config.put_string_with("k", "v2", Put::Overwrite).unwrap();
    config.flush().unwrap();
    assert_eq!(config.get_string("k").unwrap(), "v2");
}

#[test]
fn test_retain_sees_pending_value() {
    let config = XmlConfig::new();
    config.put_boolean("b", true).unwrap();
    config.put_boolean_with("b", false, Put::Retain).unwrap();
    config.flush().unwrap();
    assert!(config.get_boolean("b").unwrap());
}

#[test]
fn test_retain_on_absent_key_writes() {
    let config = XmlConfig::new();
    config.put_i16_with("n", 7, Put::Retain).unwrap();
    config.flush().unwrap();
    assert_eq!(config.get_i16("n").unwrap(), 7);
}

#[test]
fn test_delete_undo_suppresses_physical_delete() {
    let config = ConfigStore::with_adapter(RecordingAdapter::default());
    config.put_i32("k", 1).unwrap();
    config.delete("k", Repository::Number).unwrap();
    config.put_i32("k", 2).unwrap();
    config.flush().unwrap();

    assert_eq!(config.get_i32("k").unwrap(), 2);
    assert!(config.adapter().deletes().is_empty());
}

#[test]
fn test_delete_undo_of_flushed_key() {
    let config = ConfigStore::with_adapter(RecordingAdapter::default());
    config.put_string("k", "v").unwrap();
    config.flush().unwrap();

    config.delete("k", Repository::String).unwrap();
    config.put_string("k", "v2").unwrap();
    config.flush().unwrap();

    assert_eq!(config.get_string("k").unwrap(), "v2");
    assert!(config.adapter().deletes().is_empty());
}

#[test]
fn test_flushed_delete_reaches_hook_once() {
    let config = ConfigStore::with_adapter(RecordingAdapter::default());
    config.put_boolean("b", true).unwrap();
    config.flush().unwrap();
    config.delete("b", Repository::Boolean).unwrap();
    config.flush().unwrap();
    config.flush().unwrap();
    assert_eq!(config.adapter().deletes(), vec!["b"]);
}

proptest! {
    #[test]
    fn prop_permission_decides_final_value(v1 in any::<i32>(), v2 in any::<i32>(), retain in any::<bool>()) {
        let config = JsonConfig::new();
        config.put_i32("k", v1).unwrap();
        config.flush().unwrap();

        let put = if retain { Put::Retain } else { Put::Overwrite };
        config.put_i32_with("k", v2, put).unwrap();
        config.flush().unwrap();

        let expected = if retain { v1 } else { v2 };
        prop_assert_eq!(config.get_i32("k").unwrap(), expected);
        prop_assert_eq!(reload(&config).get_i32("k").unwrap(), expected);
    }
}
