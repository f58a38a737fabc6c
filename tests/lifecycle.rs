//! Lifecycle behavior through real stores: save resets, saved-change
//! introspection, reload discard, default freshness.

use std::sync::Arc;

use serde_json::json;
use stowage::cast::TypeDescriptor;
use stowage::layout::{FieldSpec, StoreLayout};
use stowage::record::Record;
use stowage::store::fs::FileStore;
use stowage::store::memory::MemoryStore;
use stowage::store::{find, RecordStore};
use stowage::value::TypedValue;

fn layout() -> Arc<StoreLayout> {
    StoreLayout::builder()
        .typed_store(
            "settings",
            vec![
                FieldSpec::new("active", TypeDescriptor::Boolean),
                FieldSpec::new("volume", TypeDescriptor::integer()),
                FieldSpec::new("theme", TypeDescriptor::String).default_value(json!("dark")),
            ],
        )
        .build()
        .unwrap()
}

#[test]
fn save_clears_dirty_state_and_keeps_saved_changes() {
    let mut store = MemoryStore::new();
    let mut record = Record::new(layout());
    record.set("active", json!(true)).unwrap();
    record.set("volume", json!(5)).unwrap();
    assert!(record.changed("active").unwrap());

    store.save(&mut record).unwrap();

    assert!(record.is_persisted());
    assert!(!record.changed("active").unwrap());
    assert!(!record.changed("volume").unwrap());
    assert!(record.changes().is_empty());

    // The pre-save → post-save pair stays queryable.
    let (before, after) = record.saved_change("volume").unwrap().unwrap();
    assert_eq!(before, TypedValue::Null);
    assert_eq!(after, TypedValue::Int(5));
    assert_eq!(record.before_last_save("volume").unwrap(), TypedValue::Null);
}

#[test]
fn second_save_replaces_the_saved_change_pair() {
    let mut store = MemoryStore::new();
    let mut record = Record::new(layout());
    record.set("volume", json!(5)).unwrap();
    store.save(&mut record).unwrap();

    record.set("volume", json!(6)).unwrap();
    store.save(&mut record).unwrap();

    let (before, after) = record.saved_change("volume").unwrap().unwrap();
    assert_eq!(before, TypedValue::Int(5));
    assert_eq!(after, TypedValue::Int(6));
    assert_eq!(record.before_last_save("volume").unwrap(), TypedValue::Int(5));
}

#[test]
fn reload_discards_uncommitted_writes() {
    let mut store = MemoryStore::new();
    let mut record = Record::new(layout());
    record.set("volume", json!(5)).unwrap();
    store.save(&mut record).unwrap();

    record.set("volume", json!(99)).unwrap();
    assert!(record.changed("volume").unwrap());

    store.reload(&mut record).unwrap();
    assert!(!record.changed("volume").unwrap());
    assert_eq!(record.get("volume").unwrap(), TypedValue::Int(5));
    // Reload is a fresh lifetime segment; the saved pair is gone too.
    assert!(!record.saved_change_to("volume").unwrap());
}

#[test]
fn default_materialized_before_save_persists() {
    let mut store = MemoryStore::new();
    let mut record = Record::new(layout());
    // Reading materializes the default into the container without
    // registering a change.
    assert_eq!(record.get("theme").unwrap(), TypedValue::Str("dark".into()));
    assert!(record.changes().is_empty());

    store.save(&mut record).unwrap();
    let mut found = find(&store, layout(), record.id()).unwrap();
    assert_eq!(
        found.read_raw("settings", "theme").unwrap(),
        Some(&json!("dark"))
    );
    assert_eq!(found.get("theme").unwrap(), TypedValue::Str("dark".into()));
}

#[test]
fn explicit_constructor_input_beats_the_default_and_is_dirty() {
    let record =
        Record::with_attrs(layout(), vec![("theme", json!("light"))]).unwrap();
    assert!(record.changed("theme").unwrap());
    let (old, new) = record.change("theme").unwrap().unwrap();
    assert_eq!(old, TypedValue::Null);
    assert_eq!(new, TypedValue::Str("light".into()));
}

#[test]
fn computed_defaults_observe_the_clock() {
    let layout = StoreLayout::builder()
        .field(
            "audit",
            FieldSpec::new("seen_at", TypeDescriptor::DateTime)
                .default_fn(|| json!(chrono::Utc::now().to_rfc3339())),
        )
        .build()
        .unwrap();

    let mut first = Record::new(layout.clone());
    let a = first.get("seen_at").unwrap();
    std::thread::sleep(std::time::Duration::from_millis(10));
    let mut second = Record::new(layout);
    let b = second.get("seen_at").unwrap();

    assert_ne!(a, b, "each materialization evaluates the producer fresh");
    // But within one record the materialized value is pinned.
    assert_eq!(first.get("seen_at").unwrap(), a);
}

#[test]
fn file_store_full_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::new(dir.path());

    let mut record = Record::with_attrs(
        layout(),
        vec![("active", json!("on")), ("volume", json!("8"))],
    )
    .unwrap();
    store.save(&mut record).unwrap();

    let mut found = find(&store, layout(), record.id()).unwrap();
    assert_eq!(found.get("active").unwrap(), TypedValue::Bool(true));
    assert_eq!(found.get("volume").unwrap(), TypedValue::Int(8));

    found.set("volume", json!(11)).unwrap();
    store.save(&mut found).unwrap();

    store.reload(&mut found).unwrap();
    assert_eq!(found.get("volume").unwrap(), TypedValue::Int(11));
    assert!(!found.changed("volume").unwrap());
}
