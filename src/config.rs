// Drive Menu Configuration Module
// Pagination limits, sync interval, Drive access and resource strings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::strings::Strings;

pub const DEFAULT_MAX_BODY_LEN: usize = 4096;
pub const DEFAULT_MAX_FILES_PER_PAGE: usize = 6;
pub const DEFAULT_APPLICATION_NAME: &str = "drive-menu";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Pagination limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Files listed per page before a new page starts
    pub max_files_per_page: usize,
    /// Maximum body length of one node, in characters
    pub max_body_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_files_per_page: DEFAULT_MAX_FILES_PER_PAGE,
            max_body_len: DEFAULT_MAX_BODY_LEN,
        }
    }
}

impl Limits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_files_per_page == 0 {
            return Err(ConfigError::Invalid("max_files_per_page must be at least 1".to_string()));
        }
        if self.max_body_len == 0 {
            return Err(ConfigError::Invalid("max_body_len must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Google Drive access
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveSettings {
    /// Name of the Drive folder that acts as the menu root
    pub root_folder_name: String,
    /// Fixed bearer token. Overrides the refresh credentials when set.
    pub access_token: Option<String>,
    /// OAuth2 client used to refresh access tokens
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    /// Sent as the User-Agent of Drive requests
    pub application_name: String,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            root_folder_name: String::new(),
            access_token: None,
            client_id: None,
            client_secret: None,
            refresh_token: None,
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
        }
    }
}

/// Application configuration
///
/// Persisted to `~/.config/drive-menu/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub limits: Limits,
    /// Interval between background syncs in seconds (0 = disabled)
    pub sync_interval_secs: u64,
    pub drive: DriveSettings,
    pub strings: Strings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            sync_interval_secs: 3600,
            drive: DriveSettings::default(),
            strings: Strings::default(),
        }
    }
}

impl AppConfig {
    /// Default config file location
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let base = dirs::config_dir()
            .ok_or_else(|| ConfigError::Invalid("Cannot determine config directory".to_string()))?;
        Ok(base.join("drive-menu").join("config.json"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist. Environment overrides are applied on top.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            info!("No config found at {}. Using defaults.", path.display());
            Self::default()
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        info!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Save to `path`, creating the parent directory if needed
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;

        // Atomic write: temp file + rename
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Apply `DRIVE_MENU_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("DRIVE_MENU_ROOT_FOLDER") {
            self.drive.root_folder_name = name;
        }
        if let Some(token) = lookup("DRIVE_MENU_ACCESS_TOKEN") {
            self.drive.access_token = Some(token);
        }
        if let Some(id) = lookup("DRIVE_MENU_CLIENT_ID") {
            self.drive.client_id = Some(id);
        }
        if let Some(secret) = lookup("DRIVE_MENU_CLIENT_SECRET") {
            self.drive.client_secret = Some(secret);
        }
        if let Some(token) = lookup("DRIVE_MENU_REFRESH_TOKEN") {
            self.drive.refresh_token = Some(token);
        }
        if let Some(value) = lookup("DRIVE_MENU_SYNC_INTERVAL_SECS") {
            match value.parse() {
                Ok(secs) => self.sync_interval_secs = secs,
                Err(e) => warn!("Ignoring DRIVE_MENU_SYNC_INTERVAL_SECS={}: {}", value, e),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits.validate()
    }
}
