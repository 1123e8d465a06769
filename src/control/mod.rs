pub mod client;
pub mod errors;
pub mod offline;
pub mod schemas;
pub mod server;
pub mod service;

pub use client::DaemonClient;
pub use errors::{ControlError, ErrorDetail};
pub use offline::OfflineControl;
pub use server::router;
pub use service::ControlService;

use anyhow::Result;
use tracing::debug;

use crate::config::Config;
use crate::storage::FileStorage;
use schemas::{
    CapacityResponse, ClearResponse, EntryListResponse, EntryResponse, IntervalResponse,
    ListQuery, MonitoringResponse, PinResponse, StatusResponse, SERVICE_NAME,
};

/// Commands every control surface supports. `id` is a full entry id or a
/// unique prefix of at least four hex characters.
#[allow(async_fn_in_trait)]
pub trait HistoryControl {
    async fn status(&self) -> Result<StatusResponse, ControlError>;
    async fn list(&self, query: ListQuery) -> Result<EntryListResponse, ControlError>;
    async fn get(&self, id: &str) -> Result<EntryResponse, ControlError>;
    async fn pin(&self, id: &str) -> Result<PinResponse, ControlError>;
    async fn unpin(&self, id: &str) -> Result<PinResponse, ControlError>;
    async fn toggle_pin(&self, id: &str) -> Result<PinResponse, ControlError>;
    async fn delete(&self, id: &str) -> Result<EntryResponse, ControlError>;
    /// Remove unpinned entries, or every entry when `all` is set.
    async fn clear(&self, all: bool) -> Result<ClearResponse, ControlError>;
    /// Put an entry's content back on the system clipboard.
    async fn copy(&self, id: &str) -> Result<EntryResponse, ControlError>;
    async fn set_paused(&self, paused: bool) -> Result<MonitoringResponse, ControlError>;
    async fn set_capacity(&self, capacity: usize) -> Result<CapacityResponse, ControlError>;
    async fn set_interval(&self, interval_ms: u64) -> Result<IntervalResponse, ControlError>;
    /// Ask the running daemon to bring itself to the front.
    async fn show(&self) -> Result<(), ControlError>;
}

/// Talks to the daemon when one answers, otherwise edits the files directly.
pub enum Controller {
    Daemon(DaemonClient),
    Offline(OfflineControl),
}

impl Controller {
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = DaemonClient::new(&config.control_url())?;
        match client.health().await {
            Ok(health) if health.service == SERVICE_NAME => {
                debug!(url = %config.control_url(), version = %health.version, "Using running daemon");
                Ok(Self::Daemon(client))
            }
            Ok(health) => {
                debug!(service = %health.service, "Control port is used by another service");
                Self::offline(config)
            }
            Err(e) => {
                debug!(error = %e, "No daemon running, editing history files directly");
                Self::offline(config)
            }
        }
    }

    fn offline(config: &Config) -> Result<Self> {
        let storage = FileStorage::new(config.data_paths()?, config.initial_settings());
        Ok(Self::Offline(OfflineControl::new(storage)))
    }

    pub fn is_daemon(&self) -> bool {
        matches!(self, Self::Daemon(_))
    }
}

macro_rules! delegate {
    ($self:ident, $method:ident ( $($arg:expr),* )) => {
        match $self {
            Controller::Daemon(client) => client.$method($($arg),*).await,
            Controller::Offline(offline) => offline.$method($($arg),*).await,
        }
    };
}

impl HistoryControl for Controller {
    async fn status(&self) -> Result<StatusResponse, ControlError> {
        delegate!(self, status())
    }

    async fn list(&self, query: ListQuery) -> Result<EntryListResponse, ControlError> {
        delegate!(self, list(query))
    }

    async fn get(&self, id: &str) -> Result<EntryResponse, ControlError> {
        delegate!(self, get(id))
    }

    async fn pin(&self, id: &str) -> Result<PinResponse, ControlError> {
        delegate!(self, pin(id))
    }

    async fn unpin(&self, id: &str) -> Result<PinResponse, ControlError> {
        delegate!(self, unpin(id))
    }

    async fn toggle_pin(&self, id: &str) -> Result<PinResponse, ControlError> {
        delegate!(self, toggle_pin(id))
    }

    async fn delete(&self, id: &str) -> Result<EntryResponse, ControlError> {
        delegate!(self, delete(id))
    }

    async fn clear(&self, all: bool) -> Result<ClearResponse, ControlError> {
        delegate!(self, clear(all))
    }

    async fn copy(&self, id: &str) -> Result<EntryResponse, ControlError> {
        delegate!(self, copy(id))
    }

    async fn set_paused(&self, paused: bool) -> Result<MonitoringResponse, ControlError> {
        delegate!(self, set_paused(paused))
    }

    async fn set_capacity(&self, capacity: usize) -> Result<CapacityResponse, ControlError> {
        delegate!(self, set_capacity(capacity))
    }

    async fn set_interval(&self, interval_ms: u64) -> Result<IntervalResponse, ControlError> {
        delegate!(self, set_interval(interval_ms))
    }

    async fn show(&self) -> Result<(), ControlError> {
        delegate!(self, show())
    }
}
