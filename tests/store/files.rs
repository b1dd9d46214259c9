//! Saving, linking, and opening stores on disk

use crate::common::*;
use confstore::{
    open, synchronized, Config, ConfigExt, JsonConfig, StorageFormat, StoreSettings, WriteAccess,
    XmlConfig, CONFIG_FILE_NAME,
};
use std::sync::Arc;
use std::thread;

#[test]
fn test_save_link_reload_cycle() {
    init_tracing();
    let file = TestFile::new("app.xml");
    let config = XmlConfig::new();
    populate_representative(&config).unwrap();
    config.save_to(&file.path, WriteAccess::OverwriteIfNecessary).unwrap();

    let loaded = XmlConfig::read(&file.path).unwrap();
    assert!(loaded.linked_file().is_none());
    loaded.link_to_file(&file.path).unwrap();
    loaded.put_string("greeting", "hi").unwrap();
    loaded.flush().unwrap();
    loaded.save().unwrap();

    let again = XmlConfig::read(&file.path).unwrap();
    assert_eq!(again.get_string("greeting").unwrap(), "hi");
    assert_eq!(again.get_i64("long_max").unwrap(), i64::MAX);
}

#[test]
fn test_save_without_link_is_precondition() {
    let config = JsonConfig::new();
    assert!(config.save().unwrap_err().is_precondition());
}

#[test]
fn test_malformed_file_is_rejected() {
    let file = TestFile::new("broken.json");
    std::fs::write(&file.path, r#"{"boolean": {}, "number": {}}"#).unwrap();
    assert!(JsonConfig::read(&file.path).unwrap_err().is_malformed());

    std::fs::write(&file.path, "not json").unwrap();
    assert!(JsonConfig::read(&file.path).unwrap_err().is_malformed());
}

#[test]
fn test_open_from_settings_file() {
    let file = TestFile::new("app.xml");
    let settings_path = file.dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&settings_path, "format = \"xml\"\nindent = 2\n").unwrap();

    let settings = StoreSettings::load(&settings_path).unwrap();
    assert_eq!(settings.format, StorageFormat::Xml);

    let config = open(&file.path, &settings).unwrap();
    config.put_f64("ratio", 0.5).unwrap();
    config.flush().unwrap();
    config.save().unwrap();

    let text = std::fs::read_to_string(&file.path).unwrap();
    assert!(text.contains("\n  <number>"));
    assert_eq!(XmlConfig::read(&file.path).unwrap().get_f64("ratio").unwrap(), 0.5);
}

#[test]
fn test_open_rejects_bad_indent() {
    let file = TestFile::new("app.json");
    let settings = StoreSettings {
        indent: 64,
        ..StoreSettings::default()
    };
    assert!(open(&file.path, &settings).err().unwrap().is_malformed());
    assert!(!file.path.exists());
}

#[test]
fn test_shared_opened_store() {
    let file = TestFile::new("shared.json");
    let config = Arc::new(synchronized(JsonConfig::new()));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let config = Arc::clone(&config);
            thread::spawn(move || {
                config.put_i32(&format!("worker{}", t), t).unwrap();
                config.flush().unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    config.save_to(&file.path, WriteAccess::OnlyIfNotExists).unwrap();
    assert_eq!(JsonConfig::read(&file.path).unwrap().len(), 4);
}
