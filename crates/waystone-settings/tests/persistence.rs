//! Settings persistence against a real file.

use std::fs;

use waystone_settings::{ClearPhysical, ConfigStore, RangeSetting, RenderEntity, SettingsError};

#[test]
fn test_load_missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::load(dir.path().join("settings.json")).unwrap();

    assert_eq!(RenderEntity::read(&store), 100.0);
    assert!(!store.contains(RenderEntity::KEY));
}

#[test]
fn test_write_persists_across_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");

    let store = ConfigStore::load(&path).unwrap();
    RenderEntity::write(&store, 64.27).unwrap();
    ClearPhysical::write(&store, 45.0).unwrap();

    let reloaded = ConfigStore::load(&path).unwrap();
    assert_eq!(RenderEntity::read(&reloaded), 64.3);
    assert_eq!(ClearPhysical::read(&reloaded), 30);
}

#[test]
fn test_keys_are_stored_flat() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let store = ConfigStore::load(&path).unwrap();
    ClearPhysical::write(&store, 10.0).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(json["settings.sessions.clear_physical"], 10);
}

#[test]
fn test_load_invalid_json_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "{ not json").unwrap();

    let err = ConfigStore::load(&path).unwrap_err();

    assert!(matches!(err, SettingsError::Parse { .. }));
}

#[test]
fn test_load_non_object_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "[1, 2, 3]").unwrap();

    let err = ConfigStore::load(&path).unwrap_err();

    assert!(matches!(err, SettingsError::NotAnObject(_)));
}

#[test]
fn test_unrelated_keys_survive_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{"settings.audio.volume": 0.5}"#).unwrap();

    let store = ConfigStore::load(&path).unwrap();
    RenderEntity::write(&store, 150.0).unwrap();

    let reloaded = ConfigStore::load(&path).unwrap();
    assert_eq!(reloaded.get("settings.audio.volume", 0.0_f64), 0.5);
    assert_eq!(RenderEntity::read(&reloaded), 150.0);
}
