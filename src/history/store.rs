use super::entry::ClipboardEntry;
use crate::settings::{validate_capacity, SettingsError, DEFAULT_CAPACITY};
use std::cmp::Reverse;
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// Shortest id prefix accepted by [`HistoryStore::resolve`].
pub const MIN_PREFIX_LEN: usize = 4;

/// Search queries are cut to this many characters.
pub const MAX_SEARCH_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no entry matches '{0}'")]
    NotFound(String),

    #[error("'{prefix}' matches {matches} entries")]
    Ambiguous { prefix: String, matches: usize },

    #[error(transparent)]
    InvalidSettings(#[from] SettingsError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted {
        entry: ClipboardEntry,
        evicted: Vec<ClipboardEntry>,
    },
    Duplicate,
    Paused,
    Empty,
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinUpdate {
    pub entry: ClipboardEntry,
    /// Unpinning can push the unpinned count over capacity.
    pub evicted: Vec<ClipboardEntry>,
}

/// Ordered clipboard history, most recent first.
///
/// The number of unpinned entries never exceeds `capacity`; pinned entries
/// are only removed by [`delete`](Self::delete) or [`clear`](Self::clear).
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: Vec<ClipboardEntry>,
    capacity: usize,
    paused: bool,
    revision: u64,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: validate_capacity(capacity).unwrap_or(DEFAULT_CAPACITY),
            paused: false,
            revision: 0,
        }
    }

    /// Build a store from previously saved entries.
    ///
    /// Entries with blank content or an already seen id are dropped, then
    /// the capacity rule is applied.
    pub fn with_entries(entries: Vec<ClipboardEntry>, capacity: usize, paused: bool) -> Self {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|entry| !entry.content.trim().is_empty())
            .filter(|entry| seen.insert(entry.id))
            .collect();

        let mut store = Self {
            entries,
            paused,
            ..Self::new(capacity)
        };
        store.evict_overflow();
        store
    }

    pub fn insert(&mut self, content: impl Into<String>) -> InsertOutcome {
        if self.paused {
            return InsertOutcome::Paused;
        }

        let content = content.into();
        if content.trim().is_empty() {
            return InsertOutcome::Empty;
        }

        if let Some(latest) = self.entries.first() {
            if latest.content == content {
                return InsertOutcome::Duplicate;
            }
        }

        let entry = ClipboardEntry::new(content);
        self.entries.insert(0, entry.clone());
        let evicted = self.evict_overflow();
        self.touch();

        InsertOutcome::Inserted { entry, evicted }
    }

    pub fn pin(&mut self, id: Uuid) -> Result<PinUpdate, StoreError> {
        self.set_pinned(id, true)
    }

    pub fn unpin(&mut self, id: Uuid) -> Result<PinUpdate, StoreError> {
        self.set_pinned(id, false)
    }

    pub fn toggle_pin(&mut self, id: Uuid) -> Result<PinUpdate, StoreError> {
        let pinned = self
            .get(id)
            .map(|entry| entry.pinned)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.set_pinned(id, !pinned)
    }

    fn set_pinned(&mut self, id: Uuid, pinned: bool) -> Result<PinUpdate, StoreError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if entry.pinned == pinned {
            return Ok(PinUpdate {
                entry: entry.clone(),
                evicted: Vec::new(),
            });
        }

        entry.pinned = pinned;
        let entry = entry.clone();
        let evicted = self.evict_overflow();
        self.touch();

        Ok(PinUpdate { entry, evicted })
    }

    pub fn delete(&mut self, id: Uuid) -> Result<ClipboardEntry, StoreError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let removed = self.entries.remove(index);
        self.touch();
        Ok(removed)
    }

    /// Remove unpinned entries, or everything when `keep_pinned` is false.
    pub fn clear(&mut self, keep_pinned: bool) -> usize {
        let before = self.entries.len();
        if keep_pinned {
            self.entries.retain(|entry| entry.pinned);
        } else {
            self.entries.clear();
        }
        let removed = before - self.entries.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    pub fn list(&self) -> &[ClipboardEntry] {
        &self.entries
    }

    pub fn get(&self, id: Uuid) -> Option<&ClipboardEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Case-insensitive substring search; an empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<&ClipboardEntry> {
        let query: String = query.trim().chars().take(MAX_SEARCH_CHARS).collect();
        if query.is_empty() {
            return self.entries.iter().collect();
        }
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.content.to_lowercase().contains(&needle))
            .collect()
    }

    /// Resolve a full id or a unique id prefix.
    pub fn resolve(&self, reference: &str) -> Result<Uuid, StoreError> {
        let reference = reference.trim();

        if let Ok(id) = Uuid::parse_str(reference) {
            return self
                .get(id)
                .map(|entry| entry.id)
                .ok_or_else(|| StoreError::NotFound(reference.to_string()));
        }

        let hex_len = reference.chars().filter(|c| *c != '-').count();
        if hex_len < MIN_PREFIX_LEN || !reference.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
        {
            return Err(StoreError::NotFound(reference.to_string()));
        }

        let mut matches = self
            .entries
            .iter()
            .filter(|entry| entry.matches_prefix(reference));
        match (matches.next(), matches.count()) {
            (None, _) => Err(StoreError::NotFound(reference.to_string())),
            (Some(entry), 0) => Ok(entry.id),
            (Some(_), rest) => Err(StoreError::Ambiguous {
                prefix: reference.to_string(),
                matches: rest + 1,
            }),
        }
    }

    /// Change the capacity; an invalid value leaves the old one in place.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<Vec<ClipboardEntry>, StoreError> {
        let capacity = validate_capacity(capacity)?;
        if capacity == self.capacity {
            return Ok(Vec::new());
        }
        self.capacity = capacity;
        let evicted = self.evict_overflow();
        self.touch();
        Ok(evicted)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.touch();
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.touch();
        }
    }

    /// Flip the paused state and return the new value.
    pub fn toggle_pause(&mut self) -> bool {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
        self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pinned_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.pinned).count()
    }

    pub fn unpinned_count(&self) -> usize {
        self.entries.len() - self.pinned_count()
    }

    /// Bumped on every state change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn evict_overflow(&mut self) -> Vec<ClipboardEntry> {
        let mut evicted = Vec::new();
        while self.unpinned_count() > self.capacity {
            match self.oldest_unpinned_index() {
                Some(index) => evicted.push(self.entries.remove(index)),
                None => break,
            }
        }
        evicted
    }

    // Oldest by timestamp; on a tie the entry further back was inserted first.
    fn oldest_unpinned_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.pinned)
            .min_by_key(|(index, entry)| (entry.timestamp, Reverse(*index)))
            .map(|(index, _)| index)
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
