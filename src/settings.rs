use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CAPACITY: usize = 50;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("capacity must be a positive integer, got {0}")]
    InvalidCapacity(usize),

    #[error("polling interval must be a positive number of milliseconds, got {0}")]
    InvalidPollInterval(u64),
}

pub fn validate_capacity(capacity: usize) -> Result<usize, SettingsError> {
    if capacity == 0 {
        return Err(SettingsError::InvalidCapacity(capacity));
    }
    Ok(capacity)
}

pub fn validate_poll_interval(interval_ms: u64) -> Result<u64, SettingsError> {
    if interval_ms == 0 {
        return Err(SettingsError::InvalidPollInterval(interval_ms));
    }
    Ok(interval_ms)
}

/// Process-wide settings persisted next to the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub capacity: usize,
    pub poll_interval_ms: u64,
    pub paused: bool,
    pub hotkey: Hotkey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_position: Option<WindowPosition>,
    pub start_with_os: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            paused: false,
            hotkey: Hotkey::default(),
            window_position: None,
            start_with_os: false,
        }
    }
}

impl Settings {
    /// Settings seeded from startup defaults. Invalid defaults are ignored.
    pub fn with_defaults(capacity: usize, poll_interval_ms: u64) -> Self {
        let base = Self::default();
        Self {
            capacity: validate_capacity(capacity).unwrap_or(base.capacity),
            poll_interval_ms: validate_poll_interval(poll_interval_ms)
                .unwrap_or(base.poll_interval_ms),
            ..base
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPosition {
    pub x: i32,
    pub y: i32,
}

/// Show/hide shortcut handed to whatever registers global hotkeys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hotkey {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    #[serde(alias = "win")]
    pub super_key: bool,
    pub key: String,
}

impl Default for Hotkey {
    fn default() -> Self {
        Self {
            ctrl: true,
            alt: true,
            shift: false,
            super_key: false,
            key: "V".to_string(),
        }
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if self.ctrl {
            parts.push("Ctrl".to_string());
        }
        if self.alt {
            parts.push("Alt".to_string());
        }
        if self.shift {
            parts.push("Shift".to_string());
        }
        if self.super_key {
            parts.push(if cfg!(target_os = "macos") { "Cmd" } else { "Super" }.to_string());
        }
        let key = self.key.trim();
        if key.is_empty() {
            parts.push("?".to_string());
        } else if key.chars().count() == 1 {
            parts.push(key.to_uppercase());
        } else {
            parts.push(key.to_string());
        }
        write!(f, "{}", parts.join("+"))
    }
}
