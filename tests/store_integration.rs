//! End-to-end tests over the public store API
//!
//! Exercises the full component/persona lifecycle the way an adapter
//! would drive it: create, reference, render, activate, and tear down
//! against a real temporary project directory.

use std::fs;

use tempfile::TempDir;

use cline_personas::{Error, PersonaStore};

/// Test fixture owning a temporary project root.
struct StoreFixture {
    store: PersonaStore,
    _temp_dir: TempDir,
}

impl StoreFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store = PersonaStore::new(temp_dir.path());
        Self {
            store,
            _temp_dir: temp_dir,
        }
    }
}

#[test]
fn test_full_lifecycle() {
    let fixture = StoreFixture::new();
    let store = &fixture.store;

    // Create a component and a persona that depends on it.
    store
        .set_component("greeting", "opening line", "Hello", 1)
        .unwrap();
    store
        .set_persona("p1", "demo persona", "{{greeting}}, world", 1)
        .unwrap();

    assert_eq!(store.render_persona("p1").unwrap(), "Hello, world");

    // Activate and detect.
    store.activate_persona("p1").unwrap();
    assert_eq!(store.get_active_persona().unwrap().as_deref(), Some("p1"));

    // The component cannot be deleted while p1 references it.
    let err = store.delete_component("greeting").unwrap_err();
    match err {
        Error::ComponentInUse { name, dependents } => {
            assert_eq!(name, "greeting");
            assert_eq!(dependents, vec!["p1".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Removing the persona unblocks the delete.
    store.delete_persona("p1").unwrap();
    store.delete_component("greeting").unwrap();
    assert!(store.list_components().unwrap().is_empty());
    assert!(store.list_personas().unwrap().is_empty());
}

#[test]
fn test_activation_detection_round_trip() {
    let fixture = StoreFixture::new();
    let store = &fixture.store;

    store.set_persona("p", "d", "T", 1).unwrap();
    store.activate_persona("p").unwrap();
    assert_eq!(store.get_active_persona().unwrap().as_deref(), Some("p"));

    // Foreign sentinel content matches no persona.
    fs::write(store.rules_path(), "unrelated content").unwrap();
    assert!(store.get_active_persona().unwrap().is_none());
}

#[test]
fn test_case_insensitive_reference_resolution() {
    let fixture = StoreFixture::new();
    let store = &fixture.store;

    store.set_component("foo", "d", "X", 1).unwrap();
    store.set_persona("p", "d", "{{Foo}}", 1).unwrap();
    assert_eq!(store.render_persona("p").unwrap(), "X");

    // Listing stays case-preserving.
    assert_eq!(store.list_components().unwrap(), vec!["foo"]);
}

#[test]
fn test_save_gate_reports_first_missing_component() {
    let fixture = StoreFixture::new();
    let store = &fixture.store;

    store.set_component("present", "d", "ok", 1).unwrap();
    let err = store
        .set_persona("p", "d", "{{present}} {{absent}} {{alsoabsent}}", 1)
        .unwrap_err();
    match err {
        Error::MissingComponent { persona, component } => {
            assert_eq!(persona, "p");
            assert_eq!(component, "absent");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(store.get_persona("p").unwrap().is_none());
}

#[test]
fn test_separate_stores_share_state_through_disk() {
    let temp_dir = TempDir::new().unwrap();

    let writer = PersonaStore::new(temp_dir.path());
    writer.set_component("c", "d", "text", 1).unwrap();
    writer.set_persona("p", "d", "{{c}}", 1).unwrap();

    // A second store over the same root sees everything; nothing is
    // cached in memory.
    let reader = PersonaStore::new(temp_dir.path());
    assert_eq!(reader.list_personas().unwrap(), vec!["p"]);
    assert_eq!(reader.render_persona("p").unwrap(), "text");
}
