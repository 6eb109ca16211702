//! Errors for remote storage adapters.
//!
//! Key design decisions:
//! - HTTP status codes stored directly (not parsed from strings)
//! - `error_message()` maps every variant to the canonical code hosts switch on
//! - All errors include ErrorLocation for debugging

use common::{ErrorLocation, HttpStatusCode};
use models::StorageProvider;

use std::panic::Location;

use thiserror::Error as ThisError;

pub const GENERAL_CONNECTION_ERROR: &str = "GENERAL_CONNECTION_ERROR";
pub const GIT_MULTIFILE_PERMISSION_ERROR: &str = "GIT_MULTIFILE_PERMISSION_ERROR";
pub const ID_NON_EXIST_ERROR: &str = "ID_NON_EXIST_ERROR";
pub const REMOTE_NEWER_ERROR: &str = "REMOTE_NEWER_ERROR";

#[derive(Debug, ThisError)]
pub enum StorageError {
    #[error("Connection Error for {provider}: {message} {location}")]
    Connection {
        provider: StorageProvider,
        message: String,
        is_timeout: bool,
        location: ErrorLocation,
    },

    #[error("Credential Error for {provider}: HTTP {status_code} - {message} {location}")]
    Credential {
        provider: StorageProvider,
        status_code: HttpStatusCode,
        message: String,
        location: ErrorLocation,
    },

    #[error("HTTP Error for {provider}: HTTP {status_code} - {message} {location}")]
    Http {
        provider: StorageProvider,
        status_code: HttpStatusCode,
        message: String,
        location: ErrorLocation,
    },

    #[error("Multi File Permission Error for {provider}: {path} is a directory {location}")]
    MultiFilePermission {
        provider: StorageProvider,
        path: String,
        location: ErrorLocation,
    },

    #[error("Missing Id Error for {provider} {location}")]
    MissingId {
        provider: StorageProvider,
        location: ErrorLocation,
    },

    #[error("Read Only Error: {provider} storage cannot be written {location}")]
    ReadOnly {
        provider: StorageProvider,
        location: ErrorLocation,
    },

    #[error("Remote Newer Error: remote updated {remote}, local {local} {location}")]
    RemoteNewer {
        remote: String,
        local: String,
        location: ErrorLocation,
    },

    #[error("Branch Error for {provider}: could not create '{branch}' {location}")]
    BranchCreation {
        provider: StorageProvider,
        branch: String,
        location: ErrorLocation,
    },

    #[error("Payload Error: {message} {location}")]
    Payload {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid Url Error: {message} {location}")]
    InvalidUrl {
        message: String,
        location: ErrorLocation,
    },

    #[error("Host Document Error: key '{key}': {message} {location}")]
    HostDocument {
        key: String,
        message: String,
        location: ErrorLocation,
    },
}

impl StorageError {
    #[track_caller]
    pub fn multi_file_permission(provider: StorageProvider, path: impl Into<String>) -> Self {
        StorageError::MultiFilePermission {
            provider,
            path: path.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn missing_id(provider: StorageProvider) -> Self {
        StorageError::MissingId {
            provider,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn read_only(provider: StorageProvider) -> Self {
        StorageError::ReadOnly {
            provider,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn remote_newer(remote: impl Into<String>, local: impl Into<String>) -> Self {
        StorageError::RemoteNewer {
            remote: remote.into(),
            local: local.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn branch_creation(provider: StorageProvider, branch: impl Into<String>) -> Self {
        StorageError::BranchCreation {
            provider,
            branch: branch.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn payload(message: impl Into<String>) -> Self {
        StorageError::Payload {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn host_document(key: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::HostDocument {
            key: key.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_url(message: impl Into<String>) -> Self {
        StorageError::InvalidUrl {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create from reqwest error with proper categorization.
    #[track_caller]
    pub fn from_reqwest(provider: StorageProvider, error: &reqwest::Error) -> Self {
        // Check for specific error types BEFORE converting to string
        if error.is_timeout() || error.is_connect() {
            return StorageError::Connection {
                provider,
                message: error.to_string(),
                is_timeout: error.is_timeout(),
                location: ErrorLocation::from(Location::caller()),
            };
        }

        if let Some(status) = error.status() {
            return Self::from_status(provider, status.as_u16(), error.to_string());
        }

        if error.is_decode() {
            return StorageError::Payload {
                message: error.to_string(),
                location: ErrorLocation::from(Location::caller()),
            };
        }

        StorageError::Connection {
            provider,
            message: error.to_string(),
            is_timeout: false,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create from an HTTP response status the provider returned.
    #[track_caller]
    pub fn from_status(provider: StorageProvider, status: u16, body: impl Into<String>) -> Self {
        let status_code = HttpStatusCode(status);

        if status_code.is_credential_failure() {
            return StorageError::Credential {
                provider,
                status_code,
                message: body.into(),
                location: ErrorLocation::from(Location::caller()),
            };
        }

        StorageError::Http {
            provider,
            status_code,
            message: body.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Canonical error code reported to the host.
    pub fn error_message(&self) -> &'static str {
        match self {
            StorageError::Credential { provider, .. } | StorageError::ReadOnly { provider, .. } => {
                provider.credential_error_code()
            }
            StorageError::MultiFilePermission { .. } => GIT_MULTIFILE_PERMISSION_ERROR,
            StorageError::MissingId { .. } => ID_NON_EXIST_ERROR,
            StorageError::RemoteNewer { .. } => REMOTE_NEWER_ERROR,
            StorageError::Connection { .. }
            | StorageError::Http { .. }
            | StorageError::BranchCreation { .. }
            | StorageError::Payload { .. }
            | StorageError::InvalidUrl { .. }
            | StorageError::HostDocument { .. } => GENERAL_CONNECTION_ERROR,
        }
    }

    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            StorageError::Credential { .. } | StorageError::ReadOnly { .. }
        )
    }
}

impl From<serde_json::Error> for StorageError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        StorageError::Payload {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<url::ParseError> for StorageError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        StorageError::InvalidUrl {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
