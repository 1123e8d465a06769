use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::control::schemas::{EntryListResponse, EntryResponse};
use crate::utils::preview::preview;

const FORMATTED_PREVIEW_WIDTH: usize = 80;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListEntriesRequest {
    #[schemars(description = "Case-insensitive text to search for. Omit to list everything.")]
    pub query: Option<String>,
    #[schemars(description = "Only return pinned entries. Defaults to false.")]
    pub pinned_only: Option<bool>,
    #[schemars(description = "Maximum number of entries to return.")]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EntryIdRequest {
    #[schemars(description = "Entry id, or a unique prefix of at least 4 hex characters. Use list_entries to get valid ids.")]
    pub id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetMonitoringRequest {
    #[schemars(description = "true to pause clipboard monitoring, false to resume it.")]
    pub paused: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetCapacityRequest {
    #[schemars(description = "Maximum number of unpinned entries to keep. Must be at least 1.")]
    pub capacity: usize,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct EntryListMcpResponse {
    pub total: usize,
    #[schemars(description = "Pre-formatted history for display. Show this directly to the user.")]
    pub formatted: String,
    #[schemars(description = "Raw entries for programmatic access. Use 'formatted' for display.")]
    pub entries: Vec<EntryResponse>,
}

impl From<EntryListResponse> for EntryListMcpResponse {
    fn from(list: EntryListResponse) -> Self {
        let formatted = format_list(&list);
        Self {
            total: list.total,
            formatted,
            entries: list.entries,
        }
    }
}

fn format_list(list: &EntryListResponse) -> String {
    if list.entries.is_empty() {
        return "Clipboard history is empty".to_string();
    }

    let mut lines = vec![
        format!("## Clipboard history ({} of {})", list.entries.len(), list.total),
        String::new(),
    ];
    for entry in &list.entries {
        let marker = if entry.pinned { "📌" } else { "▫️" };
        lines.push(format!(
            "{} `{}` {}",
            marker,
            entry.short_id,
            preview(&entry.content, FORMATTED_PREVIEW_WIDTH)
        ));
    }
    lines.join("\n")
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DeleteEntryResponse {
    pub deleted: EntryResponse,
    pub message: String,
}
