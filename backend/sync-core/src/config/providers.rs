use crate::error::config::ConfigError;

use common::{ErrorLocation, RedactedSecret};
use models::{StorageProvider, SyncContext};

use std::env;
use std::panic::Location;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

const PROVIDERS_FILE_NAME: &str = "providers.toml";

// ============================================
// PROVIDERS CONFIG STRUCTS
// ============================================

/// One configured remote. The secret itself never lives in the file;
/// `secret_env` names the environment variable holding it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageEntry {
    pub internal_id: String,
    pub name: String,
    pub provider: StorageProvider,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub secret_env: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default, rename = "storage")]
    pub entries: Vec<StorageEntry>,
}

// ============================================
// IMPLEMENTATION
// ============================================

impl StorageEntry {
    /// Builds the sync context, reading the secret from `secret_env`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::SecretMissing`] when `secret_env` is set but the
    /// variable is not.
    pub fn to_context(&self) -> Result<SyncContext, ConfigError> {
        let secret = match &self.secret_env {
            Some(variable) => match env::var(variable) {
                Ok(value) => RedactedSecret::new(value),
                Err(_) => {
                    return Err(ConfigError::SecretMissing {
                        location: ErrorLocation::from(Location::caller()),
                        provider: self.name.clone(),
                        variable: variable.clone(),
                    });
                }
            },
            None => RedactedSecret::default(),
        };

        let mut context = SyncContext::new(self.provider, self.id.clone())
            .with_name(self.name.clone())
            .with_internal_id(self.internal_id.clone())
            .with_secret(secret);
        if let Some(branch) = &self.branch {
            context = context.with_branch(branch.clone());
        }
        if let Some(file_path) = &self.file_path {
            context = context.with_file_path(file_path.clone());
        }
        if let Some(base_url) = &self.base_url {
            context = context.with_base_url(base_url.clone());
        }

        Ok(context)
    }
}

impl ProvidersConfig {
    /// Load {config_dir}/providers.toml. A missing file means no providers.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(PROVIDERS_FILE_NAME);
        if !path.exists() {
            info!("No {} in {}, no providers configured", PROVIDERS_FILE_NAME, config_dir.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            location: ErrorLocation::from(Location::caller()),
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: ProvidersConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        config.validate()?;

        debug!("Loaded {} storage entries from {}", config.entries.len(), path.display());
        Ok(config)
    }

    /// Validate storage entries.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.internal_id.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("Storage entry #{} has an empty internal_id", index + 1),
                });
            }

            if entry.name.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("Storage entry '{}' has an empty name", entry.internal_id),
                });
            }

            if self.entries[..index]
                .iter()
                .any(|earlier| earlier.internal_id == entry.internal_id)
            {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("Duplicate internal_id '{}'", entry.internal_id),
                });
            }

            if entry.provider.is_git() && entry.id.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!(
                        "Storage entry '{}' ({}) needs a repository id",
                        entry.name, entry.provider
                    ),
                });
            }

            if let Some(base_url) = &entry.base_url
                && !base_url.starts_with("http://")
                && !base_url.starts_with("https://")
            {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("Invalid base_url for '{}': {}", entry.name, base_url),
                });
            }
        }

        Ok(())
    }

    /// Looks an entry up by internal id, then by name.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ProviderNotFound`] when neither matches.
    pub fn find(&self, key: &str) -> Result<&StorageEntry, ConfigError> {
        self.entries
            .iter()
            .find(|entry| entry.internal_id == key)
            .or_else(|| self.entries.iter().find(|entry| entry.name == key))
            .ok_or_else(|| ConfigError::ProviderNotFound {
                location: ErrorLocation::from(Location::caller()),
                key: key.to_string(),
            })
    }
}
