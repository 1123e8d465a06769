use clipkeep::app::AppState;
use clipkeep::history::{HistoryStore, InsertOutcome};
use clipkeep::settings::Settings;
use clipkeep::storage::{FileStorage, Persistence};
use clipkeep::utils::paths::DataPaths;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn contents(store: &HistoryStore) -> Vec<&str> {
    store.list().iter().map(|e| e.content.as_str()).collect()
}

#[test]
fn oldest_entry_is_evicted_at_capacity() {
    let mut store = HistoryStore::new(3);
    for text in ["a", "b", "c", "d"] {
        store.insert(text);
    }
    assert_eq!(contents(&store), vec!["d", "c", "b"]);
}

#[test]
fn pinned_entry_outlives_newer_unpinned_ones() {
    let mut store = HistoryStore::new(2);
    store.insert("a");
    store.insert("b");
    let a = store.list()[1].id;
    store.pin(a).unwrap();

    store.insert("c");
    assert!(store.get(a).is_some());
    assert!(store.unpinned_count() <= 2);

    store.insert("d");
    assert!(store.get(a).is_some());
    assert!(store.unpinned_count() <= 2);
    assert_eq!(contents(&store), vec!["d", "c", "a"]);
}

#[test]
fn paused_store_ignores_inserts() {
    let mut store = HistoryStore::new(5);
    store.insert("before");
    store.pause();
    let revision = store.revision();

    assert_eq!(store.insert("x"), InsertOutcome::Paused);
    assert_eq!(contents(&store), vec!["before"]);
    assert_eq!(store.revision(), revision);
}

#[test]
fn missing_and_corrupt_files_load_as_defaults() {
    let dir = TempDir::new().unwrap();
    let paths = DataPaths::new(dir.path().join("clipkeep"));
    let storage = FileStorage::new(paths.clone(), Settings::default());

    let loaded = storage.load();
    assert!(loaded.entries.is_empty());
    assert_eq!(loaded.settings, Settings::default());

    paths.ensure_exists().unwrap();
    fs::write(paths.history_path(), "{ not json").unwrap();
    fs::write(paths.settings_path(), "[1, 2").unwrap();

    let loaded = storage.load();
    assert!(loaded.entries.is_empty());
    assert_eq!(loaded.settings, Settings::default());
}

#[test]
fn saved_state_round_trips_through_files() {
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::new(DataPaths::new(dir.path()), Settings::default());

    let mut state = AppState::new(Settings::default());
    for text in ["first", "second", "third"] {
        state.insert(text);
    }
    let second = state.store().list()[1].short_id();
    state.pin(&second).unwrap();
    state.set_capacity(7).unwrap();
    state.set_poll_interval(250).unwrap();
    state.pause();

    let saved = state.to_persisted();
    storage.save(&saved).unwrap();

    let loaded = storage.load();
    assert_eq!(loaded, saved);

    let restored = AppState::from_persisted(loaded);
    assert_eq!(restored.status(), state.status());
}

#[test]
fn legacy_string_history_is_imported() {
    let dir = TempDir::new().unwrap();
    let paths = DataPaths::new(dir.path());
    fs::write(paths.history_path(), r#"["newest", "  ", "older"]"#).unwrap();
    fs::write(paths.settings_path(), r#"{"capacity": 10, "monitoring_paused": true}"#).unwrap();

    let storage = FileStorage::new(paths, Settings::default());
    let state = AppState::from_persisted(storage.load());

    assert_eq!(contents(state.store()), vec!["newest", "older"]);
    assert!(state.store().is_paused());
    assert_eq!(state.store().capacity(), 10);
    assert!(state.store().list().iter().all(|e| !e.pinned));
}
