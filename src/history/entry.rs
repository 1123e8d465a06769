use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of hex characters shown for an entry id in listings.
pub const SHORT_ID_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    pub id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub pinned: bool,
}

impl ClipboardEntry {
    pub fn new(content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            timestamp: Utc::now(),
            pinned: false,
        }
    }

    pub fn with_timestamp(content: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            timestamp,
            pinned: false,
        }
    }

    pub fn short_id(&self) -> String {
        let simple = self.id.simple().to_string();
        simple[..SHORT_ID_LEN].to_string()
    }

    pub fn matches_prefix(&self, prefix: &str) -> bool {
        let needle = prefix.to_ascii_lowercase().replace('-', "");
        self.id.simple().to_string().starts_with(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new() {
        let entry = ClipboardEntry::new("hello".to_string());
        assert_eq!(entry.content, "hello");
        assert!(!entry.pinned);
    }

    #[test]
    fn test_new_assigns_distinct_ids() {
        let a = ClipboardEntry::new("same".to_string());
        let b = ClipboardEntry::new("same".to_string());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_with_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 12, 31, 8, 30, 0).unwrap();
        let entry = ClipboardEntry::with_timestamp("old".to_string(), ts);
        assert_eq!(entry.timestamp, ts);
    }

    #[test]
    fn test_short_id() {
        let entry = ClipboardEntry::new("x".to_string());
        let short = entry.short_id();
        assert_eq!(short.len(), SHORT_ID_LEN);
        assert!(entry.id.to_string().starts_with(&short));
    }

    #[test]
    fn test_matches_prefix() {
        let mut entry = ClipboardEntry::new("x".to_string());
        entry.id = Uuid::parse_str("6f1c2d3e-4a5b-4c6d-8e7f-0123456789ab").unwrap();

        assert!(entry.matches_prefix("6f1c"));
        assert!(entry.matches_prefix("6F1C2D3E"));
        assert!(entry.matches_prefix("6f1c2d3e-4a5b"));
        assert!(!entry.matches_prefix("7f1c"));
    }

    #[test]
    fn test_missing_pinned_defaults_to_false() {
        let json = r#"{
            "id": "6f1c2d3e-4a5b-4c6d-8e7f-0123456789ab",
            "content": "from disk",
            "timestamp": "2025-12-31T08:30:00Z"
        }"#;
        let entry: ClipboardEntry = serde_json::from_str(json).unwrap();
        assert!(!entry.pinned);
        assert_eq!(entry.content, "from disk");
    }
}
