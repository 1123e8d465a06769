use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, Json,
};
use tracing::info;

use crate::config::Config;
use crate::control::schemas::{
    CapacityResponse, EntryResponse, ListQuery, MonitoringResponse, PinResponse,
};
use crate::control::{Controller, HistoryControl};

use super::errors::{connect_error, format_error};
use super::schemas::{
    DeleteEntryResponse, EntryIdRequest, EntryListMcpResponse, ListEntriesRequest,
    SetCapacityRequest, SetMonitoringRequest,
};

/// MCP tools over the clipboard history. Each call goes to the running
/// daemon, or to the history files when none is running.
#[derive(Clone)]
pub struct ClipboardMcpServer {
    config: Config,
    tool_router: ToolRouter<Self>,
}

impl ClipboardMcpServer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            tool_router: Self::tool_router(),
        }
    }

    async fn controller(&self) -> Result<Controller, String> {
        Controller::connect(&self.config).await.map_err(connect_error)
    }
}

#[tool_router]
impl ClipboardMcpServer {
    #[tool(
        name = "list_entries",
        description = "List clipboard history entries, most recent first. Optionally filter by text or pinned state. Response includes a 'formatted' field - display it directly as markdown to the user."
    )]
    async fn list_entries(
        &self,
        params: Parameters<ListEntriesRequest>,
    ) -> Result<Json<EntryListMcpResponse>, String> {
        let req = params.0;
        info!(query = ?req.query, pinned_only = ?req.pinned_only, limit = ?req.limit, "list_entries called");

        let query = ListQuery {
            q: req.query,
            pinned: req.pinned_only.unwrap_or(false),
            limit: req.limit,
        };
        let list = self
            .controller()
            .await?
            .list(query)
            .await
            .map_err(format_error)?;

        info!(count = list.entries.len(), total = list.total, "list_entries returning entries");
        Ok(Json(list.into()))
    }

    #[tool(
        name = "pin_entry",
        description = "Pin an entry so it is never evicted when the history is full."
    )]
    async fn pin_entry(
        &self,
        params: Parameters<EntryIdRequest>,
    ) -> Result<Json<PinResponse>, String> {
        info!(id = %params.0.id, "pin_entry called");
        let response = self
            .controller()
            .await?
            .pin(&params.0.id)
            .await
            .map_err(format_error)?;
        Ok(Json(response))
    }

    #[tool(
        name = "unpin_entry",
        description = "Unpin an entry. If the history is over capacity afterwards, the oldest unpinned entries are evicted and listed in 'evicted'."
    )]
    async fn unpin_entry(
        &self,
        params: Parameters<EntryIdRequest>,
    ) -> Result<Json<PinResponse>, String> {
        info!(id = %params.0.id, "unpin_entry called");
        let response = self
            .controller()
            .await?
            .unpin(&params.0.id)
            .await
            .map_err(format_error)?;
        Ok(Json(response))
    }

    #[tool(
        name = "delete_entry",
        description = "Delete an entry from the history, pinned or not. This action is irreversible."
    )]
    async fn delete_entry(
        &self,
        params: Parameters<EntryIdRequest>,
    ) -> Result<Json<DeleteEntryResponse>, String> {
        info!(id = %params.0.id, "delete_entry called");
        let deleted = self
            .controller()
            .await?
            .delete(&params.0.id)
            .await
            .map_err(format_error)?;

        let message = format!("Deleted entry {}", deleted.short_id);
        Ok(Json(DeleteEntryResponse { deleted, message }))
    }

    #[tool(
        name = "copy_entry",
        description = "Put an entry's text back on the system clipboard. The copy is not recorded as a new entry."
    )]
    async fn copy_entry(
        &self,
        params: Parameters<EntryIdRequest>,
    ) -> Result<Json<EntryResponse>, String> {
        info!(id = %params.0.id, "copy_entry called");
        let entry = self
            .controller()
            .await?
            .copy(&params.0.id)
            .await
            .map_err(format_error)?;
        Ok(Json(entry))
    }

    #[tool(
        name = "set_monitoring",
        description = "Pause or resume clipboard monitoring. While paused nothing copied is recorded."
    )]
    async fn set_monitoring(
        &self,
        params: Parameters<SetMonitoringRequest>,
    ) -> Result<Json<MonitoringResponse>, String> {
        info!(paused = params.0.paused, "set_monitoring called");
        let response = self
            .controller()
            .await?
            .set_paused(params.0.paused)
            .await
            .map_err(format_error)?;
        Ok(Json(response))
    }

    #[tool(
        name = "set_capacity",
        description = "Set how many unpinned entries are kept. Lowering it evicts the oldest unpinned entries; pinned entries are never evicted."
    )]
    async fn set_capacity(
        &self,
        params: Parameters<SetCapacityRequest>,
    ) -> Result<Json<CapacityResponse>, String> {
        info!(capacity = params.0.capacity, "set_capacity called");
        let response = self
            .controller()
            .await?
            .set_capacity(params.0.capacity)
            .await
            .map_err(format_error)?;

        info!(capacity = response.capacity, evicted = response.evicted.len(), "set_capacity completed");
        Ok(Json(response))
    }
}

#[tool_handler(router = self.tool_router)]
impl rmcp::ServerHandler for ClipboardMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Clipboard history server.\n\n\
                TOOLS:\n\
                - list_entries: List history. Response has 'formatted' field - display it directly as markdown.\n\
                - pin_entry / unpin_entry: Pinned entries are never evicted.\n\
                - delete_entry: Remove an entry.\n\
                - copy_entry: Put an entry back on the clipboard.\n\
                - set_monitoring: Pause or resume recording.\n\
                - set_capacity: Number of unpinned entries kept.\n\n\
                IDS:\n\
                - Full UUIDs or the 8-character short ids from list_entries both work."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
