use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{MemoError, Result};

/// Number of notes shown while the widget is collapsed.
pub const DEFAULT_COLLAPSED_LIMIT: usize = 3;

/// How often the window position is sampled, in milliseconds.
pub const DEFAULT_POSITION_INTERVAL_MS: u64 = 1000;

/// Coordinates below this are what the OS reports for minimized windows.
pub const DEFAULT_INVALID_COORDINATE_THRESHOLD: i32 = -10_000;

const DEFAULT_STORE_FILE: &str = "deskmemo.json";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted widget state
    pub data_dir: PathBuf,

    /// File name of the key-value store inside `data_dir`
    pub store_file: String,

    /// How many notes the collapsed widget shows
    pub collapsed_limit: usize,

    /// Position sampling period in milliseconds
    pub position_interval_ms: u64,

    /// Samples with a coordinate below this value are not persisted
    pub invalid_coordinate_threshold: i32,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = ProjectDirs::from("com", "deskmemo", "deskmemo")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".deskmemo"));

        Config {
            data_dir,
            store_file: DEFAULT_STORE_FILE.to_string(),
            collapsed_limit: DEFAULT_COLLAPSED_LIMIT,
            position_interval_ms: DEFAULT_POSITION_INTERVAL_MS,
            invalid_coordinate_threshold: DEFAULT_INVALID_COORDINATE_THRESHOLD,
        }
    }
}

impl Config {
    /// Loads the configuration from `path`, or returns defaults when no path
    /// is given or the file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No config file given, using defaults");
            return Ok(Config::default());
        };

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Ok(Config::default());
        }

        let raw = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| MemoError::ConfigError {
            message: format!("{}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.collapsed_limit == 0 {
            return Err(MemoError::ConfigError {
                message: "collapsed_limit must be at least 1".to_string(),
            });
        }
        if self.position_interval_ms == 0 {
            return Err(MemoError::ConfigError {
                message: "position_interval_ms must be positive".to_string(),
            });
        }
        if self.store_file.trim().is_empty() {
            return Err(MemoError::ConfigError {
                message: "store_file must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Full path of the key-value store file.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_file)
    }

    pub fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            debug!("Creating data directory: {}", self.data_dir.display());
            fs::create_dir_all(&self.data_dir).map_err(|_| MemoError::DirectoryError {
                path: self.data_dir.clone(),
            })?;
        }
        Ok(())
    }
}
