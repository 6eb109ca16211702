use common::ErrorLocation;

use sync_core::error::{ConfigError, StorageError, SyncError};

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the `token-sync` binary.
///
/// Core errors pass through unchanged so their canonical codes stay
/// available; everything the app itself does carries a location.
#[derive(Debug, Error)]
pub enum AppError {
    /// Error from this App
    #[error("Token Sync Error: {message} {location}")]
    App {
        message: String,
        location: ErrorLocation,
    },

    /// The local document file could not be read or written
    #[error("Document Error: {path}: {message} {location}")]
    Document {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl AppError {
    #[track_caller]
    pub fn app(message: impl Into<String>) -> Self {
        AppError::App {
            message: message.into(),
            location: ErrorLocation::from(std::panic::Location::caller()),
        }
    }

    #[track_caller]
    pub fn document(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        AppError::Document {
            path: path.into(),
            message: message.into(),
            location: ErrorLocation::from(std::panic::Location::caller()),
        }
    }

    /// Canonical code for sync failures, `None` for local failures.
    pub fn error_code(&self) -> Option<String> {
        match self {
            AppError::Storage(e) => Some(e.error_message().to_string()),
            AppError::Sync(e) => Some(e.error_message()),
            AppError::App { .. } | AppError::Document { .. } | AppError::Config(_) => None,
        }
    }
}
