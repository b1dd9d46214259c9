//! Change records and bus authorization

use std::sync::Arc;

use confstore::{
    ChangeAction, ChangeRecord, Config, ConfigError, ConfigExt, EventKey, JsonConfig,
    ListenerHandle, Number, Repository, Result, StoreId, StringRecord,
};
use parking_lot::Mutex;

fn recorder<T: Clone + Send + 'static>() -> (ListenerHandle<T>, Arc<Mutex<Vec<ChangeRecord<T>>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let listener: ListenerHandle<T> =
        Arc::new(move |_sender: StoreId, record: &ChangeRecord<T>| -> Result<()> {
            sink.lock().push(record.clone());
            Ok(())
        });
    (listener, seen)
}

#[test]
fn test_forged_key_never_reaches_subscribers() {
    let config = JsonConfig::new();
    let (listener, seen) = recorder::<String>();
    let bus = config.string_events();
    bus.subscribe(listener);

    let forged = EventKey::new();
    let record = ChangeRecord::put("k", None, "v".to_string(), Repository::String);
    let err = bus.publish(&forged, config.id(), &record).unwrap_err();

    assert!(matches!(err, ConfigError::Unauthorized));
    assert!(err.is_unauthorized());
    assert!(seen.lock().is_empty());
}

#[test]
fn test_put_and_delete_raise_records() {
    let config = JsonConfig::new();
    let (listener, seen) = recorder::<Number>();
    config.number_events().subscribe(listener);

    config.put_i32("n", 1).unwrap();
    config.flush().unwrap();
    config.put_i32("n", 2).unwrap();
    config.delete("n", Repository::Number).unwrap();

    let records = seen.lock();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].action(), ChangeAction::Put);
    assert_eq!(records[0].old_value(), None);
    assert_eq!(records[1].old_value(), Some(&Number::I32(1)));
    assert_eq!(records[1].new_value(), Some(&Number::I32(2)));
    assert_eq!(records[2].action(), ChangeAction::Delete);
    assert_eq!(records[2].old_value(), Some(&Number::I32(2)));
    assert_eq!(records[2].repository(), Repository::Number);
}

#[test]
fn test_flush_and_retain_raise_nothing() {
    let config = JsonConfig::new();
    config.put_boolean("b", true).unwrap();
    config.flush().unwrap();

    let (listener, seen) = recorder::<bool>();
    config.boolean_events().subscribe(listener);
    config.put_boolean_with("b", false, confstore::Put::Retain).unwrap();
    config.flush().unwrap();
    assert!(config.delete("absent", Repository::Boolean).map(|d| !d).unwrap());
    assert!(seen.lock().is_empty());
}

#[test]
fn test_sender_is_store_id() {
    let config = JsonConfig::new();
    let senders = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&senders);
    let listener: ListenerHandle<String> =
        Arc::new(move |sender: StoreId, _record: &StringRecord| -> Result<()> {
            sink.lock().push(sender);
            Ok(())
        });
    config.string_events().subscribe(listener);

    config.put_string("s", "x").unwrap();
    assert_eq!(*senders.lock(), vec![config.id()]);
}

#[test]
fn test_listener_failure_reaches_raiser_after_staging() {
    let config = JsonConfig::new();
    let listener: ListenerHandle<String> =
        Arc::new(|_sender: StoreId, _record: &StringRecord| -> Result<()> {
            Err(ConfigError::listener("rejected"))
        });
    config.string_events().subscribe(Arc::clone(&listener));

    let err = config.put_string("s", "x").unwrap_err();
    assert!(matches!(err, ConfigError::Listener(_)));
    assert_eq!(config.pending_operations().puts, 1);

    assert!(config.string_events().unsubscribe(&listener));
    config.flush().unwrap();
    assert_eq!(config.get_string("s").unwrap(), "x");
}

#[test]
fn test_subscription_is_an_identity_set() {
    let config = JsonConfig::new();
    let (listener, seen) = recorder::<String>();
    let bus = config.string_events();
    assert!(bus.subscribe(Arc::clone(&listener)));
    assert!(!bus.subscribe(Arc::clone(&listener)));
    assert_eq!(bus.listener_count(), 1);

    config.put_string("s", "x").unwrap();
    assert_eq!(seen.lock().len(), 1);
}
