pub mod providers;

pub use providers::{ProvidersConfig, StorageEntry};

use crate::error::config::ConfigError;
use crate::storage::AdapterOptions;
use crate::sync::{DEFAULT_COMMIT_MESSAGE, SyncSettings};

use common::ErrorLocation;

use std::env;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;
const CONFIG_DIR_NAME: &str = "token-sync";
pub const CONFIG_DIR_ENV: &str = "TOKEN_SYNC_CONFIG_DIR";
const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncSection {
    /// Push local edits to JSONBin automatically.
    #[serde(default = "default_update_remote")]
    pub update_remote: bool,
    /// Allow directory paths (one file per token set) on git providers.
    #[serde(default)]
    pub multi_file: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_commit_message")]
    pub default_commit_message: String,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            update_remote: default_update_remote(),
            multi_file: false,
            request_timeout_secs: default_request_timeout_secs(),
            default_commit_message: default_commit_message(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokensSection {
    /// Theme to resolve with when a command names none.
    pub active_theme: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub sync: SyncSection,

    #[serde(default)]
    pub tokens: TokensSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            sync: SyncSection::default(),
            tokens: TokensSection::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_update_remote() -> bool {
    true
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_commit_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_string()
}

// ============================================
// IMPLEMENTATION
// ============================================

/// `$TOKEN_SYNC_CONFIG_DIR`, else `<platform config dir>/token-sync`.
///
/// # Errors
///
/// [`ConfigError::DirectoryNotFound`] when the platform has no config dir.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
        info!("Using {} override: {}", CONFIG_DIR_ENV, custom_dir);
        return Ok(PathBuf::from(custom_dir));
    }

    match dirs::config_dir() {
        Some(dir) => {
            let dir = dir.join(CONFIG_DIR_NAME);
            debug!("Platform config dir: {}", dir.display());
            Ok(dir)
        }
        None => Err(ConfigError::DirectoryNotFound {
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

/// Loads `.env` from the config dir, then the current directory. Variables
/// already set win.
pub fn load_env(config_dir: &Path) {
    let env_path = config_dir.join(".env");
    if env_path.exists() {
        match dotenvy::from_path(&env_path) {
            Ok(()) => info!("Loaded .env from: {}", env_path.display()),
            Err(e) => warn!("Failed to parse .env at {}: {}", env_path.display(), e),
        }
    }

    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded .env from: {}", path.display());
    }
}

impl AppConfig {
    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns `Ok(AppConfig)` if loaded successfully or defaults if file missing.
    /// Returns `Err(ConfigError)` if file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        let config: AppConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/config.json using atomic write.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, serialization, the write or the
    /// rename fails.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        // Atomic rename (POSIX guarantees atomicity)
        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        if self.sync.request_timeout_secs == 0
            || self.sync.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS
        {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid request timeout: {}s (must be 1-{})",
                    self.sync.request_timeout_secs, MAX_REQUEST_TIMEOUT_SECS
                ),
            });
        }

        if self.sync.default_commit_message.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "default_commit_message cannot be empty".to_string(),
            });
        }

        if let Some(ref theme) = self.tokens.active_theme
            && theme.trim().is_empty()
        {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "active_theme cannot be empty string".to_string(),
            });
        }

        Ok(())
    }

    pub fn adapter_options(&self) -> AdapterOptions {
        AdapterOptions {
            multi_file: self.sync.multi_file,
            request_timeout: Duration::from_secs(self.sync.request_timeout_secs),
        }
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            update_remote: self.sync.update_remote,
            default_commit_message: self.sync.default_commit_message.clone(),
        }
    }
}
