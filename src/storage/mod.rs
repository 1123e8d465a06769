pub mod file;
pub mod format;

use crate::history::ClipboardEntry;
use crate::settings::Settings;
use anyhow::Result;

pub use file::{export_history, FileStorage};

/// Everything that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    pub entries: Vec<ClipboardEntry>,
    pub settings: Settings,
}

pub trait Persistence: Send + Sync {
    /// Previously saved state, or defaults when nothing usable exists.
    fn load(&self) -> PersistedState;

    /// Replace the saved state. A failed save leaves the previous one intact.
    fn save(&self, state: &PersistedState) -> Result<()>;
}
