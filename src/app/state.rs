use crate::history::{ClipboardEntry, HistoryStore, InsertOutcome, PinUpdate, StoreError};
use crate::settings::{validate_poll_interval, Settings, SettingsError};
use crate::storage::PersistedState;

/// History plus settings: the state every control surface operates on.
///
/// Capacity and the paused flag live in the store; the rest of the
/// settings are kept here.
#[derive(Debug, Clone)]
pub struct AppState {
    store: HistoryStore,
    settings: Settings,
    settings_revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub entries: usize,
    pub pinned: usize,
    pub capacity: usize,
    pub paused: bool,
    pub poll_interval_ms: u64,
    pub hotkey: String,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self::from_persisted(PersistedState {
            entries: Vec::new(),
            settings,
        })
    }

    pub fn from_persisted(state: PersistedState) -> Self {
        let store =
            HistoryStore::with_entries(state.entries, state.settings.capacity, state.settings.paused);
        Self {
            store,
            settings: state.settings,
            settings_revision: 0,
        }
    }

    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            entries: self.store.list().to_vec(),
            settings: self.settings(),
        }
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn settings(&self) -> Settings {
        Settings {
            capacity: self.store.capacity(),
            paused: self.store.is_paused(),
            ..self.settings.clone()
        }
    }

    pub fn revision(&self) -> u64 {
        self.store.revision() + self.settings_revision
    }

    pub fn status(&self) -> Status {
        Status {
            entries: self.store.len(),
            pinned: self.store.pinned_count(),
            capacity: self.store.capacity(),
            paused: self.store.is_paused(),
            poll_interval_ms: self.settings.poll_interval_ms,
            hotkey: self.settings.hotkey.to_string(),
        }
    }

    pub fn insert(&mut self, content: impl Into<String>) -> InsertOutcome {
        self.store.insert(content)
    }

    pub fn entry(&self, reference: &str) -> Result<ClipboardEntry, StoreError> {
        let id = self.store.resolve(reference)?;
        self.store
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(reference.to_string()))
    }

    pub fn pin(&mut self, reference: &str) -> Result<PinUpdate, StoreError> {
        let id = self.store.resolve(reference)?;
        self.store.pin(id)
    }

    pub fn unpin(&mut self, reference: &str) -> Result<PinUpdate, StoreError> {
        let id = self.store.resolve(reference)?;
        self.store.unpin(id)
    }

    pub fn toggle_pin(&mut self, reference: &str) -> Result<PinUpdate, StoreError> {
        let id = self.store.resolve(reference)?;
        self.store.toggle_pin(id)
    }

    pub fn delete(&mut self, reference: &str) -> Result<ClipboardEntry, StoreError> {
        let id = self.store.resolve(reference)?;
        self.store.delete(id)
    }

    pub fn clear(&mut self, keep_pinned: bool) -> usize {
        self.store.clear(keep_pinned)
    }

    pub fn pause(&mut self) {
        self.store.pause();
    }

    pub fn resume(&mut self) {
        self.store.resume();
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.store.toggle_pause()
    }

    pub fn set_capacity(&mut self, capacity: usize) -> Result<Vec<ClipboardEntry>, StoreError> {
        self.store.set_capacity(capacity)
    }

    pub fn set_poll_interval(&mut self, interval_ms: u64) -> Result<(), SettingsError> {
        let interval_ms = validate_poll_interval(interval_ms)?;
        if self.settings.poll_interval_ms != interval_ms {
            self.settings.poll_interval_ms = interval_ms;
            self.settings_revision += 1;
        }
        Ok(())
    }
}
