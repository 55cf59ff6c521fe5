// Application configuration stored as JSON
// Every field is optional in the file; command-line flags override it

use crate::core::constants::DEFAULT_BAUD;
use crate::core::timestamp::{Zone, ZoneError, LOCAL_ZONE_ID};
use crate::session::ManagerSettings;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Zone(#[from] ZoneError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

fn default_time_zone() -> String {
    LOCAL_ZONE_ID.to_string()
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Prefix received lines with a timestamp
    #[serde(default)]
    pub timestamp_enabled: bool,

    /// IANA zone name, or "local"
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Baud rate for newly opened tabs
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Directory for log files started without a path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Ports opened at startup; empty opens every detected port
    #[serde(default)]
    pub ports: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timestamp_enabled: false,
            time_zone: default_time_zone(),
            baud_rate: DEFAULT_BAUD,
            log_dir: None,
            ports: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Read a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a config file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let config = Self::load(path)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json + "\n").map_err(io_err)
    }

    pub fn zone(&self) -> Result<Zone> {
        Ok(Zone::parse(&self.time_zone)?)
    }

    /// Settings handed to the tab manager
    pub fn manager_settings(&self) -> Result<ManagerSettings> {
        Ok(ManagerSettings {
            timestamp_enabled: self.timestamp_enabled,
            time_zone: self.zone()?,
            default_baud: self.baud_rate,
        })
    }
}
