use super::format::{parse_history, parse_settings, serialize_history, serialize_settings};
use super::{PersistedState, Persistence};
use crate::history::ClipboardEntry;
use crate::settings::Settings;
use crate::utils::paths::DataPaths;
use anyhow::{Context, Result};
use chrono::Utc;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::{debug, warn};

/// JSON documents in the data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    paths: DataPaths,
    defaults: Settings,
}

impl FileStorage {
    pub fn new(paths: DataPaths, defaults: Settings) -> Self {
        Self { paths, defaults }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    fn load_entries(&self) -> Vec<ClipboardEntry> {
        let path = self.paths.history_path();
        let Some(content) = read_optional(&path) else {
            return Vec::new();
        };

        match parse_history(&content, Utc::now()) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "History file is unreadable, starting fresh");
                Vec::new()
            }
        }
    }

    fn load_settings(&self) -> Settings {
        let path = self.paths.settings_path();
        let Some(content) = read_optional(&path) else {
            return self.defaults.clone();
        };

        match parse_settings(&content, &self.defaults) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Settings file is unreadable, using defaults");
                self.defaults.clone()
            }
        }
    }
}

impl Persistence for FileStorage {
    fn load(&self) -> PersistedState {
        let state = PersistedState {
            entries: self.load_entries(),
            settings: self.load_settings(),
        };
        debug!(
            dir = %self.paths.dir().display(),
            entries = state.entries.len(),
            "Loaded persisted state"
        );
        state
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        self.paths.ensure_exists()?;

        let history = serialize_history(&state.entries).context("Failed to serialize history")?;
        write_atomic(&self.paths.history_path(), &history)?;

        let settings = serialize_settings(&state.settings).context("Failed to serialize settings")?;
        write_atomic(&self.paths.settings_path(), &settings)?;

        Ok(())
    }
}

/// Write the history document to an arbitrary path.
pub fn export_history(path: &Path, entries: &[ClipboardEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let content = serialize_history(entries).context("Failed to serialize history")?;
    write_atomic(path, &content)
}

fn read_optional(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read file, ignoring it");
            None
        }
    }
}

/// Write to a sibling temp file, then rename over the target.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)
        .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("Failed to flush temp file: {}", temp_path.display()))?;
    drop(file);

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::WindowPosition;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn setup_storage() -> (TempDir, FileStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(DataPaths::new(temp_dir.path()), Settings::default());
        (temp_dir, storage)
    }

    #[test]
    fn test_load_missing_files_returns_defaults() {
        let (_temp_dir, storage) = setup_storage();
        let state = storage.load();
        assert!(state.entries.is_empty());
        assert_eq!(state.settings, Settings::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (_temp_dir, storage) = setup_storage();
        let mut pinned = ClipboardEntry::new("keep me".to_string());
        pinned.pinned = true;
        let state = PersistedState {
            entries: vec![ClipboardEntry::new("latest".to_string()), pinned],
            settings: Settings {
                capacity: 3,
                poll_interval_ms: 750,
                paused: true,
                window_position: Some(WindowPosition { x: 5, y: 6 }),
                ..Settings::default()
            },
        };

        storage.save(&state).unwrap();
        assert_eq!(storage.load(), state);
    }

    #[test]
    fn test_load_corrupt_files_starts_fresh() {
        let (_temp_dir, storage) = setup_storage();
        fs::write(storage.paths().history_path(), "{ definitely not json").unwrap();
        fs::write(storage.paths().settings_path(), "[1, 2, 3]").unwrap();

        let state = storage.load();
        assert!(state.entries.is_empty());
        assert_eq!(state.settings, Settings::default());
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let (temp_dir, storage) = setup_storage();
        storage.save(&PersistedState::default()).unwrap();

        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(".tmp")));
        assert!(names.contains(&"history.json".to_string()));
        assert!(names.contains(&"settings.json".to_string()));
    }

    #[test]
    fn test_stale_temp_file_does_not_affect_load() {
        let (_temp_dir, storage) = setup_storage();
        let state = PersistedState {
            entries: vec![ClipboardEntry::new("saved".to_string())],
            settings: Settings::default(),
        };
        storage.save(&state).unwrap();

        // Simulates a crash after the temp file was half written.
        fs::write(storage.paths().history_path().with_extension("tmp"), "{\"ver").unwrap();
        assert_eq!(storage.load(), state);
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested");
        let storage = FileStorage::new(DataPaths::new(&dir), Settings::default());

        storage.save(&PersistedState::default()).unwrap();
        assert!(dir.join("history.json").exists());
    }

    #[test]
    fn test_export_history() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("exports").join("backup.json");
        let entries = vec![ClipboardEntry::new("exported".to_string())];

        export_history(&path, &entries).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(parse_history(&content, Utc::now()).unwrap(), entries);
    }
}
