use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info};

use super::errors::ControlError;
use super::schemas::{
    CapacityResponse, ClearResponse, EntryListResponse, EntryResponse, IntervalResponse,
    ListQuery, MonitoringResponse, PinResponse, StatusResponse,
};
use super::HistoryControl;
use crate::app::AppState;
use crate::clipboard::{copy_to_clipboard, ClipboardError};
use crate::storage::{FileStorage, Persistence};

const COPY_TIMEOUT: Duration = Duration::from_secs(2);

/// Applies commands straight to the history files when no daemon runs.
///
/// Every command loads the files, applies the change and saves before
/// returning.
pub struct OfflineControl {
    storage: FileStorage,
    lock: Mutex<()>,
}

impl OfflineControl {
    pub fn new(storage: FileStorage) -> Self {
        Self {
            storage,
            lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    fn load(&self) -> AppState {
        AppState::from_persisted(self.storage.load())
    }

    async fn mutate<R>(
        &self,
        f: impl FnOnce(&mut AppState) -> Result<R, ControlError>,
    ) -> Result<R, ControlError> {
        let _guard = self.lock.lock().await;
        let mut state = self.load();
        let before = state.revision();
        let result = f(&mut state)?;

        if state.revision() != before {
            self.storage
                .save(&state.to_persisted())
                .map_err(ControlError::storage)?;
            debug!(dir = %self.storage.paths().dir().display(), "Saved history files");
        }
        Ok(result)
    }
}

impl HistoryControl for OfflineControl {
    async fn status(&self) -> Result<StatusResponse, ControlError> {
        Ok(StatusResponse::new(self.load().status(), false))
    }

    async fn list(&self, query: ListQuery) -> Result<EntryListResponse, ControlError> {
        let state = self.load();
        let needle = query.q.clone().unwrap_or_default();
        Ok(query.apply(state.store().search(&needle)))
    }

    async fn get(&self, id: &str) -> Result<EntryResponse, ControlError> {
        let entry = self.load().entry(id)?;
        Ok(EntryResponse::from(&entry))
    }

    async fn pin(&self, id: &str) -> Result<PinResponse, ControlError> {
        let update = self.mutate(|state| Ok(state.pin(id)?)).await?;
        Ok(update.into())
    }

    async fn unpin(&self, id: &str) -> Result<PinResponse, ControlError> {
        let update = self.mutate(|state| Ok(state.unpin(id)?)).await?;
        Ok(update.into())
    }

    async fn toggle_pin(&self, id: &str) -> Result<PinResponse, ControlError> {
        let update = self.mutate(|state| Ok(state.toggle_pin(id)?)).await?;
        Ok(update.into())
    }

    async fn delete(&self, id: &str) -> Result<EntryResponse, ControlError> {
        let removed = self.mutate(|state| Ok(state.delete(id)?)).await?;
        Ok(EntryResponse::from(&removed))
    }

    async fn clear(&self, all: bool) -> Result<ClearResponse, ControlError> {
        let removed = self.mutate(|state| Ok(state.clear(!all))).await?;
        Ok(ClearResponse { removed })
    }

    async fn copy(&self, id: &str) -> Result<EntryResponse, ControlError> {
        let entry = self.load().entry(id)?;
        let text = entry.content.clone();

        let task = tokio::task::spawn_blocking(move || copy_to_clipboard(&text));
        match timeout(COPY_TIMEOUT, task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => return Err(ClipboardError::Unavailable(format!("{e:#}")).into()),
            Ok(Err(e)) => return Err(ClipboardError::Unavailable(e.to_string()).into()),
            Err(_) => return Err(ClipboardError::TimedOut.into()),
        }

        info!(id = %entry.id, "Copied entry to clipboard");
        Ok(EntryResponse::from(&entry))
    }

    async fn set_paused(&self, paused: bool) -> Result<MonitoringResponse, ControlError> {
        self.mutate(|state| {
            if paused {
                state.pause();
            } else {
                state.resume();
            }
            Ok(())
        })
        .await?;
        Ok(MonitoringResponse { paused })
    }

    async fn set_capacity(&self, capacity: usize) -> Result<CapacityResponse, ControlError> {
        let evicted = self.mutate(|state| Ok(state.set_capacity(capacity)?)).await?;
        Ok(CapacityResponse::new(capacity, &evicted))
    }

    async fn set_interval(&self, interval_ms: u64) -> Result<IntervalResponse, ControlError> {
        self.mutate(|state| Ok(state.set_poll_interval(interval_ms)?))
            .await?;
        Ok(IntervalResponse { interval_ms })
    }

    async fn show(&self) -> Result<(), ControlError> {
        Err(ControlError::NotRunning)
    }
}
