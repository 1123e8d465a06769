use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::ControlError;
use crate::app::Status;
use crate::history::{ClipboardEntry, PinUpdate};

pub const SERVICE_NAME: &str = "clipkeep";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    pub service: String,
    pub version: String,
}

impl HealthResponse {
    pub fn current() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntryResponse {
    pub id: String,
    pub short_id: String,
    pub content: String,
    #[schemars(description = "Capture time, RFC 3339 UTC")]
    pub timestamp: String,
    pub pinned: bool,
}

impl From<&ClipboardEntry> for EntryResponse {
    fn from(entry: &ClipboardEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            short_id: entry.short_id(),
            content: entry.content.clone(),
            timestamp: entry.timestamp.to_rfc3339(),
            pinned: entry.pinned,
        }
    }
}

impl EntryResponse {
    /// Rebuild the stored entry, e.g. to export a daemon's history.
    pub fn to_entry(&self) -> Result<ClipboardEntry, ControlError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| ControlError::Transport(format!("invalid entry id '{}': {e}", self.id)))?;
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| ControlError::Transport(format!("invalid timestamp '{}': {e}", self.timestamp)))?
            .with_timezone(&Utc);
        Ok(ClipboardEntry {
            id,
            content: self.content.clone(),
            timestamp,
            pinned: self.pinned,
        })
    }
}

fn entries(list: &[ClipboardEntry]) -> Vec<EntryResponse> {
    list.iter().map(EntryResponse::from).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntryListResponse {
    pub entries: Vec<EntryResponse>,
    #[schemars(description = "Number of matching entries before any limit was applied")]
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PinResponse {
    pub entry: EntryResponse,
    #[schemars(description = "Entries removed because unpinning exceeded the capacity")]
    pub evicted: Vec<EntryResponse>,
}

impl From<PinUpdate> for PinResponse {
    fn from(update: PinUpdate) -> Self {
        Self {
            entry: EntryResponse::from(&update.entry),
            evicted: entries(&update.evicted),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StatusResponse {
    pub daemon_running: bool,
    pub entries: usize,
    pub pinned: usize,
    pub capacity: usize,
    pub paused: bool,
    pub poll_interval_ms: u64,
    pub hotkey: String,
}

impl StatusResponse {
    pub fn new(status: Status, daemon_running: bool) -> Self {
        Self {
            daemon_running,
            entries: status.entries,
            pinned: status.pinned,
            capacity: status.capacity,
            paused: status.paused,
            poll_interval_ms: status.poll_interval_ms,
            hotkey: status.hotkey,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClearResponse {
    pub removed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MonitoringResponse {
    pub paused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CapacityResponse {
    pub capacity: usize,
    pub evicted: Vec<EntryResponse>,
}

impl CapacityResponse {
    pub fn new(capacity: usize, evicted: &[ClipboardEntry]) -> Self {
        Self {
            capacity,
            evicted: entries(evicted),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IntervalResponse {
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ListQuery {
    #[schemars(description = "Case-insensitive text to search for. Omit to list everything.")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[schemars(description = "Only return pinned entries")]
    #[serde(default)]
    pub pinned: bool,
    #[schemars(description = "Maximum number of entries to return")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ListQuery {
    /// Filter a history slice, most recent first.
    pub fn apply(&self, found: Vec<&ClipboardEntry>) -> EntryListResponse {
        let matching: Vec<&ClipboardEntry> = found
            .into_iter()
            .filter(|entry| !self.pinned || entry.pinned)
            .collect();
        let total = matching.len();
        let limit = self.limit.unwrap_or(total);

        EntryListResponse {
            entries: matching
                .into_iter()
                .take(limit)
                .map(EntryResponse::from)
                .collect(),
            total,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearQuery {
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CapacityRequest {
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IntervalRequest {
    pub interval_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<ClipboardEntry> {
        let mut list = vec![
            ClipboardEntry::new("three".into()),
            ClipboardEntry::new("two".into()),
            ClipboardEntry::new("one".into()),
        ];
        list[1].pinned = true;
        list
    }

    #[test]
    fn test_entry_response_fields() {
        let entry = ClipboardEntry::new("hello".into());
        let response = EntryResponse::from(&entry);

        assert_eq!(response.id, entry.id.to_string());
        assert_eq!(response.short_id, entry.short_id());
        assert!(response.id.replace('-', "").starts_with(&response.short_id));
        assert_eq!(
            chrono::DateTime::parse_from_rfc3339(&response.timestamp).unwrap(),
            entry.timestamp
        );
    }

    #[test]
    fn test_to_entry_restores_the_entry() {
        let mut entry = ClipboardEntry::new("hello".into());
        entry.pinned = true;
        assert_eq!(EntryResponse::from(&entry).to_entry().unwrap(), entry);

        let broken = EntryResponse {
            id: "nope".into(),
            ..EntryResponse::from(&entry)
        };
        assert!(broken.to_entry().is_err());
    }

    #[test]
    fn test_list_query_pinned_and_limit() {
        let list = sample();

        let pinned = ListQuery { pinned: true, ..ListQuery::default() }.apply(list.iter().collect());
        assert_eq!(pinned.total, 1);
        assert_eq!(pinned.entries[0].content, "two");

        let limited = ListQuery { limit: Some(2), ..ListQuery::default() }.apply(list.iter().collect());
        assert_eq!(limited.total, 3);
        let contents: Vec<&str> = limited.entries.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["three", "two"]);
    }

    #[test]
    fn test_list_query_from_url_params() {
        let query: ListQuery = serde_json::from_str(r#"{"q":"abc","pinned":true}"#).unwrap();
        assert_eq!(query.q.as_deref(), Some("abc"));
        assert!(query.pinned);
        assert_eq!(query.limit, None);
    }
}
