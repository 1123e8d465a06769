use tokio::sync::broadcast;
use tracing::info;

use super::errors::ControlError;
use super::schemas::{
    CapacityResponse, ClearResponse, EntryListResponse, EntryResponse, IntervalResponse,
    ListQuery, MonitoringResponse, PinResponse, StatusResponse,
};
use super::HistoryControl;
use crate::app::SharedState;
use crate::history::ClipboardEntry;
use crate::watcher::WatcherHandle;

/// In-process control surface used by the daemon's HTTP API.
#[derive(Clone)]
pub struct ControlService {
    shared: SharedState,
    watcher: WatcherHandle,
    show: broadcast::Sender<()>,
}

impl ControlService {
    pub fn new(shared: SharedState, watcher: WatcherHandle) -> Self {
        let (show, _) = broadcast::channel(4);
        Self {
            shared,
            watcher,
            show,
        }
    }

    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    /// Receives one event per `show` request.
    pub fn subscribe_show(&self) -> broadcast::Receiver<()> {
        self.show.subscribe()
    }
}

fn log_evicted(evicted: &[ClipboardEntry], reason: &str) {
    if !evicted.is_empty() {
        info!(count = evicted.len(), reason, "Evicted entries over capacity");
    }
}

impl HistoryControl for ControlService {
    async fn status(&self) -> Result<StatusResponse, ControlError> {
        let status = self.shared.read(|state| state.status());
        Ok(StatusResponse::new(status, true))
    }

    async fn list(&self, query: ListQuery) -> Result<EntryListResponse, ControlError> {
        let needle = query.q.clone().unwrap_or_default();
        Ok(self
            .shared
            .read(|state| query.apply(state.store().search(&needle))))
    }

    async fn get(&self, id: &str) -> Result<EntryResponse, ControlError> {
        let entry = self.shared.read(|state| state.entry(id))?;
        Ok(EntryResponse::from(&entry))
    }

    async fn pin(&self, id: &str) -> Result<PinResponse, ControlError> {
        let update = self.shared.mutate(|state| state.pin(id))?;
        info!(id = %update.entry.id, "Pinned entry");
        Ok(update.into())
    }

    async fn unpin(&self, id: &str) -> Result<PinResponse, ControlError> {
        let update = self.shared.mutate(|state| state.unpin(id))?;
        info!(id = %update.entry.id, "Unpinned entry");
        log_evicted(&update.evicted, "unpin");
        Ok(update.into())
    }

    async fn toggle_pin(&self, id: &str) -> Result<PinResponse, ControlError> {
        let update = self.shared.mutate(|state| state.toggle_pin(id))?;
        info!(id = %update.entry.id, pinned = update.entry.pinned, "Toggled pin");
        log_evicted(&update.evicted, "unpin");
        Ok(update.into())
    }

    async fn delete(&self, id: &str) -> Result<EntryResponse, ControlError> {
        let removed = self.shared.mutate(|state| state.delete(id))?;
        info!(id = %removed.id, "Deleted entry");
        Ok(EntryResponse::from(&removed))
    }

    async fn clear(&self, all: bool) -> Result<ClearResponse, ControlError> {
        let removed = self.shared.mutate(|state| state.clear(!all));
        info!(removed, keep_pinned = !all, "Cleared history");
        Ok(ClearResponse { removed })
    }

    async fn copy(&self, id: &str) -> Result<EntryResponse, ControlError> {
        let entry = self.shared.read(|state| state.entry(id))?;
        self.watcher.copy_back(entry.content.clone()).await?;
        info!(id = %entry.id, "Copied entry to clipboard");
        Ok(EntryResponse::from(&entry))
    }

    async fn set_paused(&self, paused: bool) -> Result<MonitoringResponse, ControlError> {
        self.shared.mutate(|state| {
            if paused {
                state.pause();
            } else {
                state.resume();
            }
        });
        info!(paused, "Monitoring state changed");
        Ok(MonitoringResponse { paused })
    }

    async fn set_capacity(&self, capacity: usize) -> Result<CapacityResponse, ControlError> {
        let evicted = self.shared.mutate(|state| state.set_capacity(capacity))?;
        info!(capacity, "Capacity changed");
        log_evicted(&evicted, "capacity");
        Ok(CapacityResponse::new(capacity, &evicted))
    }

    async fn set_interval(&self, interval_ms: u64) -> Result<IntervalResponse, ControlError> {
        self.shared
            .mutate(|state| state.set_poll_interval(interval_ms))?;
        info!(interval_ms, "Polling interval changed");
        Ok(IntervalResponse { interval_ms })
    }

    async fn show(&self) -> Result<(), ControlError> {
        // No receivers just means nothing is listening for it yet.
        let _ = self.show.send(());
        info!("Show requested");
        Ok(())
    }
}
