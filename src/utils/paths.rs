use anyhow::{anyhow, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides the default `~/.clipkeep` directory.
pub const HOME_ENV: &str = "CLIPKEEP_HOME";

const HISTORY_FILE: &str = "history.json";
const SETTINGS_FILE: &str = "settings.json";
const CONFIG_FILE: &str = "config.toml";

pub fn get_clipkeep_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(HOME_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
    Ok(home.join(".clipkeep"))
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_clipkeep_dir()?.join(CONFIG_FILE))
}

/// Locations of the persisted documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    dir: PathBuf,
}

impl DataPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    pub fn ensure_exists(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        }
        Ok(())
    }
}
