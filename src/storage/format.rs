use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::history::ClipboardEntry;
use crate::settings::{validate_capacity, validate_poll_interval, Hotkey, Settings, WindowPosition};

pub const HISTORY_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryDocument {
    pub version: u32,
    pub entries: Vec<ClipboardEntry>,
}

pub fn serialize_history(entries: &[ClipboardEntry]) -> serde_json::Result<String> {
    let document = HistoryDocument {
        version: HISTORY_VERSION,
        entries: entries.to_vec(),
    };
    serde_json::to_string_pretty(&document)
}

/// Parse `history.json`.
///
/// A versioned document is read strictly. A bare array may mix current
/// records, `{"text", "ts", "pinned"}` records and plain strings; each item
/// is converted on its own and items that cannot be read are skipped.
pub fn parse_history(content: &str, now: DateTime<Utc>) -> serde_json::Result<Vec<ClipboardEntry>> {
    let value: Value = serde_json::from_str(content)?;

    let items = match value {
        Value::Array(items) => items,
        other => return Ok(serde_json::from_value::<HistoryDocument>(other)?.entries),
    };

    let entries = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::String(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| {
                    ClipboardEntry::with_timestamp(text.to_string(), now - Duration::seconds(index as i64))
                })
            }
            Value::Object(record) => record_entry(record, now),
            _ => None,
        })
        .collect();

    Ok(entries)
}

fn record_entry(record: Map<String, Value>, now: DateTime<Utc>) -> Option<ClipboardEntry> {
    if record.contains_key("content") {
        return serde_json::from_value(Value::Object(record)).ok();
    }

    let text = match record.get("text")? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }

    let timestamp = record
        .get("ts")
        .and_then(|ts| match ts {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .and_then(epoch_seconds)
        .unwrap_or(now);

    let mut entry = ClipboardEntry::with_timestamp(text, timestamp);
    entry.pinned = record.get("pinned").is_some_and(truthy);
    Some(entry)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn epoch_seconds(ts: f64) -> Option<DateTime<Utc>> {
    if !ts.is_finite() || ts < 0.0 {
        return None;
    }
    let secs = ts.trunc() as i64;
    let nanos = (ts.fract() * 1_000_000_000.0) as u32;
    DateTime::from_timestamp(secs, nanos)
}

/// Every field optional so a partial or hand-edited file still loads.
#[derive(Debug, Default, Deserialize)]
struct SettingsDocument {
    capacity: Option<usize>,
    poll_interval_ms: Option<u64>,
    #[serde(alias = "monitoring_paused")]
    paused: Option<bool>,
    hotkey: Option<Hotkey>,
    window_position: Option<WindowPosition>,
    start_with_os: Option<bool>,
}

pub fn serialize_settings(settings: &Settings) -> serde_json::Result<String> {
    serde_json::to_string_pretty(settings)
}

/// Parse `settings.json`; missing or invalid fields keep the value from `base`.
pub fn parse_settings(content: &str, base: &Settings) -> serde_json::Result<Settings> {
    let document: SettingsDocument = serde_json::from_str(content)?;
    let base = base.clone();

    Ok(Settings {
        capacity: document
            .capacity
            .and_then(|c| validate_capacity(c).ok())
            .unwrap_or(base.capacity),
        poll_interval_ms: document
            .poll_interval_ms
            .and_then(|ms| validate_poll_interval(ms).ok())
            .unwrap_or(base.poll_interval_ms),
        paused: document.paused.unwrap_or(base.paused),
        hotkey: document.hotkey.unwrap_or(base.hotkey),
        window_position: document.window_position.or(base.window_position),
        start_with_os: document.start_with_os.unwrap_or(base.start_with_os),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_history_round_trip() {
        let mut pinned = ClipboardEntry::with_timestamp("pinned".into(), now());
        pinned.pinned = true;
        let entries = vec![
            ClipboardEntry::with_timestamp("latest".into(), now() + Duration::milliseconds(1500)),
            pinned,
        ];

        let json = serialize_history(&entries).unwrap();
        assert!(json.contains("\"version\": 1"));
        assert_eq!(parse_history(&json, now()).unwrap(), entries);
    }

    #[test]
    fn test_parse_bare_record_array() {
        let json = r#"[
            {"id": "6f1c2d3e-4a5b-4c6d-8e7f-0123456789ab", "content": "a", "timestamp": "2026-01-01T00:00:00Z", "pinned": true}
        ]"#;
        let entries = parse_history(json, now()).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].pinned);
    }

    #[test]
    fn test_parse_legacy_records() {
        let json = r#"[
            {"text": "  first  ", "ts": 1700000000.25, "pinned": true},
            {"text": "   "},
            {"text": "no timestamp"}
        ]"#;
        let entries = parse_history(json, now()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "first");
        assert!(entries[0].pinned);
        assert_eq!(entries[0].timestamp.timestamp(), 1_700_000_000);
        assert_eq!(entries[1].timestamp, now());
        assert!(!entries[1].pinned);
    }

    #[test]
    fn test_parse_legacy_records_leniently() {
        let json = r#"[
            {"text": "keep me", "ts": 1700000000, "pinned": 1},
            {"text": "string ts", "ts": "1700000100.5", "pinned": "yes"},
            {"text": "bad ts", "ts": "soon", "pinned": 0},
            {"text": ["not", "text"]},
            {"ts": 1700000000},
            {"text": 42, "pinned": null}
        ]"#;
        let entries = parse_history(json, now()).unwrap();
        let contents: Vec<&str> = entries.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["keep me", "string ts", "bad ts", "42"]);

        assert!(entries[0].pinned);
        assert_eq!(entries[0].timestamp.timestamp(), 1_700_000_000);
        assert!(entries[1].pinned);
        assert_eq!(entries[1].timestamp.timestamp(), 1_700_000_100);
        assert!(!entries[2].pinned);
        assert_eq!(entries[2].timestamp, now());
        assert!(!entries[3].pinned);
    }

    #[test]
    fn test_parse_mixed_legacy_list() {
        let json = r#"[
            "plain newest",
            {"text": "record", "ts": 1700000000},
            7,
            {"id": "6f1c2d3e-4a5b-4c6d-8e7f-0123456789ab", "content": "current", "timestamp": "2026-01-01T00:00:00Z"},
            "plain older"
        ]"#;
        let entries = parse_history(json, now()).unwrap();
        let contents: Vec<&str> = entries.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["plain newest", "record", "current", "plain older"]);
        assert_eq!(entries[0].timestamp, now());
        assert_eq!(entries[3].timestamp, now() - Duration::seconds(4));
    }

    #[test]
    fn test_parse_legacy_text_list() {
        let json = r#"["newest", "", "older"]"#;
        let entries = parse_history(json, now()).unwrap();
        let contents: Vec<&str> = entries.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["newest", "older"]);
        assert_eq!(entries[0].timestamp, now());
        assert_eq!(entries[1].timestamp, now() - Duration::seconds(1));
    }

    #[test]
    fn test_parse_corrupt_history_is_error() {
        assert!(parse_history("{ not json", now()).is_err());
        assert!(parse_history(r#"{"version": 1}"#, now()).is_err());
        assert!(parse_history("42", now()).is_err());
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = Settings {
            capacity: 12,
            poll_interval_ms: 250,
            paused: true,
            window_position: Some(WindowPosition { x: 10, y: -20 }),
            start_with_os: true,
            ..Settings::default()
        };
        let json = serialize_settings(&settings).unwrap();
        assert_eq!(parse_settings(&json, &Settings::default()).unwrap(), settings);
    }

    #[test]
    fn test_parse_settings_falls_back_per_field() {
        let base = Settings::with_defaults(30, 400);
        let json = r#"{"capacity": 0, "poll_interval_ms": 100, "unknown": "ignored"}"#;
        let settings = parse_settings(json, &base).unwrap();
        assert_eq!(settings.capacity, 30);
        assert_eq!(settings.poll_interval_ms, 100);
        assert!(!settings.paused);
    }

    #[test]
    fn test_parse_settings_accepts_monitoring_paused() {
        let json = r#"{"monitoring_paused": true, "hotkey": {"ctrl": true, "alt": false, "shift": true, "win": false, "key": "H"}}"#;
        let settings = parse_settings(json, &Settings::default()).unwrap();
        assert!(settings.paused);
        assert_eq!(settings.hotkey.to_string(), "Ctrl+Shift+H");
    }
}
