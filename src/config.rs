use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::settings::{DEFAULT_CAPACITY, DEFAULT_POLL_INTERVAL_MS, Settings};
use crate::utils::paths::{get_clipkeep_dir, get_config_path, DataPaths};

/// Default loopback port for the control API.
pub const DEFAULT_CONTROL_PORT: u16 = 50677;

/// Startup configuration read from `config.toml`.
///
/// Unlike [`Settings`], which change at runtime and are saved back, these
/// values are only read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_control_port")]
    pub control_port: u16,

    #[serde(default = "default_capacity")]
    pub default_capacity: usize,

    #[serde(default = "default_poll_interval_ms")]
    pub default_poll_interval_ms: u64,

    #[serde(default = "default_clipboard_timeout_ms")]
    pub clipboard_timeout_ms: u64,

    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,

    #[serde(default = "default_preview_width")]
    pub preview_width: usize,
}

fn default_control_port() -> u16 {
    DEFAULT_CONTROL_PORT
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_clipboard_timeout_ms() -> u64 {
    1000
}

fn default_save_debounce_ms() -> u64 {
    200
}

fn default_preview_width() -> usize {
    72
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            control_port: default_control_port(),
            default_capacity: default_capacity(),
            default_poll_interval_ms: default_poll_interval_ms(),
            clipboard_timeout_ms: default_clipboard_timeout_ms(),
            save_debounce_ms: default_save_debounce_ms(),
            preview_width: default_preview_width(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config: {}", config_path.display()))?;

        Ok(config)
    }

    pub fn data_paths(&self) -> Result<DataPaths> {
        match &self.data_dir {
            Some(dir) => Ok(DataPaths::new(dir)),
            None => Ok(DataPaths::new(get_clipkeep_dir()?)),
        }
    }

    /// Settings used when nothing has been saved yet.
    pub fn initial_settings(&self) -> Settings {
        Settings::with_defaults(self.default_capacity, self.default_poll_interval_ms)
    }

    pub fn clipboard_timeout(&self) -> Duration {
        Duration::from_millis(self.clipboard_timeout_ms.max(1))
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn control_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.control_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.control_port, 50677);
        assert_eq!(config.default_capacity, 50);
        assert_eq!(config.default_poll_interval_ms, 500);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("control_port"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
        control_port = 4000
        default_capacity = 10
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.control_port, 4000);
        assert_eq!(config.default_capacity, 10);
        assert_eq!(config.clipboard_timeout_ms, 1000);
    }

    #[test]
    fn test_load_from_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config.control_port, DEFAULT_CONTROL_PORT);
    }

    #[test]
    fn test_load_from_invalid_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "control_port = \"not a number\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_data_dir_override() {
        let config: Config = toml::from_str(r#"data_dir = "/tmp/clipkeep-data""#).unwrap();
        let paths = config.data_paths().unwrap();
        assert_eq!(paths.dir(), Path::new("/tmp/clipkeep-data"));
    }

    #[test]
    fn test_initial_settings_use_config_defaults() {
        let config = Config {
            default_capacity: 7,
            default_poll_interval_ms: 0,
            ..Config::default()
        };
        let settings = config.initial_settings();
        assert_eq!(settings.capacity, 7);
        assert_eq!(settings.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }
}
