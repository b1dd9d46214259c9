//! Documents reproduce the flushed maps they were saved from

use crate::common::*;
use confstore::{
    BigDecimal, Config, ConfigExt, ConfigManager, ConfigStore, DocumentFormat, JsonConfig,
    JsonConfigManager, NumberKind, XmlConfig, XmlConfigManager,
};

fn assert_round_trip<A: DocumentFormat>() {
    init_tracing();
    let config = ConfigStore::<A>::new();
    populate_representative(&config).unwrap();

    let loaded = reload(&config);
    assert_eq!(loaded.map_booleans(), config.map_booleans());
    assert_eq!(loaded.map_numbers(), config.map_numbers());
    assert_eq!(loaded.map_strings(), config.map_strings());
    assert_eq!(number_tags(&loaded), number_tags(&config));
    assert_eq!(loaded, config);
}

#[test]
fn test_json_round_trip_representative_values() {
    assert_round_trip::<confstore::JsonDocument>();
}

#[test]
fn test_xml_round_trip_representative_values() {
    assert_round_trip::<confstore::XmlDocument>();
}

#[test]
#[allow(clippy::approx_constant)]
fn test_round_trip_preserves_kinds_and_values() {
    let config = XmlConfig::new();
    populate_representative(&config).unwrap();
    let loaded = reload(&config);

    assert!(loaded.get_boolean("yes").unwrap());
    assert!(!loaded.get_boolean("no").unwrap());
    assert_eq!(loaded.get_i32("zero").unwrap(), 0);
    assert_eq!(loaded.get_i32("minus_one").unwrap(), -1);
    assert_eq!(loaded.get_i64("long_max").unwrap(), i64::MAX);
    assert_eq!(loaded.get_f32("pi_f32").unwrap(), 3.14f32);
    assert_eq!(loaded.get_f64("pi_f64").unwrap(), 3.14f64);
    assert_eq!(loaded.get_big_int("huge").unwrap(), huge_int());
    assert_eq!(loaded.get_string("greeting").unwrap(), "grüße, 世界 🌍");

    assert_eq!(loaded.get_number("pi_f32").unwrap().kind(), NumberKind::F32);
    assert_eq!(loaded.get_number("huge").unwrap().kind(), NumberKind::BigInt);
}

#[test]
fn test_big_decimal_round_trip() {
    let value: BigDecimal = "-0.000000000000000000000000000001".parse().unwrap();
    let config = JsonConfig::new();
    config.put_big_decimal("tiny", value.clone()).unwrap();
    config.flush().unwrap();
    assert_eq!(reload(&config).get_big_decimal("tiny").unwrap(), value);
}

#[test]
fn test_cross_format_copy_through_iteration() {
    let source = JsonConfig::new();
    populate_representative(&source).unwrap();

    let target = XmlConfig::new();
    for (key, value) in source.booleans() {
        target.put_boolean(&key, value).unwrap();
    }
    for (key, value) in source.numbers() {
        target.put_number(&key, value).unwrap();
    }
    for (key, value) in source.strings() {
        target.put_string(&key, &value).unwrap();
    }
    target.flush().unwrap();

    assert_eq!(target, source);
    assert_eq!(reload(&target), source);
}

#[test]
fn test_managers_read_what_they_write() {
    let file = TestFile::new("managed.json");
    let manager = JsonConfigManager::new();
    let config = manager.new_config();
    populate_representative(&config).unwrap();
    config
        .save_to(&file.path, confstore::WriteAccess::OverwriteIfNecessary)
        .unwrap();
    assert_eq!(manager.read(&file.path).unwrap(), config);

    let xml = XmlConfigManager::new();
    let mut text = Vec::new();
    let xml_config = xml.new_config();
    populate_representative(&xml_config).unwrap();
    xml_config.save_writer(&mut text).unwrap();
    assert_eq!(xml.read_from(&mut text.as_slice()).unwrap(), xml_config);
}
