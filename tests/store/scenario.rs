//! The `retries` walkthrough in both formats

use crate::common::*;
use confstore::{Config, ConfigExt, JsonConfig, NumberKind, XmlConfig};

#[test]
fn test_retries_json() {
    init_tracing();
    let config = JsonConfig::new();
    config.put_i32("retries", 3).unwrap();
    config.flush().unwrap();

    let text = config.to_canonical().unwrap();
    let document: serde_json::Value = serde_json::from_str(&text).unwrap();
    let entry = &document["number"]["retries"];
    assert_eq!(entry["value"], "3");
    assert_eq!(entry["type"], NumberKind::I32.tag());

    let reloaded = JsonConfig::parse(&text).unwrap();
    assert_eq!(reloaded.get_i32("retries").unwrap(), 3);
    assert_eq!(reloaded.get_i32_or("retries", 99).unwrap(), 3);
    assert_eq!(reloaded.get_i32_or("missing", 99).unwrap(), 99);
}

#[test]
fn test_retries_xml() {
    let config = XmlConfig::new();
    config.put_i32("retries", 3).unwrap();
    config.flush().unwrap();

    let text = config.to_canonical().unwrap();
    assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
    assert!(text.contains(r#"<entry key="retries" value="3" type="i32"/>"#));

    let reloaded = XmlConfig::parse(&text).unwrap();
    assert_eq!(reloaded.get_i32("retries").unwrap(), 3);
    assert_eq!(reloaded.get_i32_or("retries", 99).unwrap(), 3);
}

#[test]
fn test_empty_documents_have_all_sections() {
    let json: serde_json::Value =
        serde_json::from_str(&JsonConfig::new().to_canonical().unwrap()).unwrap();
    for section in ["boolean", "number", "string"] {
        assert!(json[section].is_object(), "missing {}", section);
    }

    let xml = XmlConfig::new().to_canonical().unwrap();
    for section in ["<boolean/>", "<number/>", "<string/>"] {
        assert!(xml.contains(section), "missing {}", section);
    }
}

#[test]
fn test_default_only_applies_to_missing_keys() {
    let config = JsonConfig::new();
    config.put_string("retries", "three").unwrap();
    config.flush().unwrap();

    assert_eq!(config.get_string_or("retries", "x"), "three");
    assert_eq!(config.get_i32_or("retries", 99).unwrap(), 99);
    assert!(!config.get_boolean_or("retries", false));
}
