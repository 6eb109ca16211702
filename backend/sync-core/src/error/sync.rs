use crate::error::edit::EditError;
use crate::error::storage::{ID_NON_EXIST_ERROR, StorageError};

use common::ErrorLocation;
use models::StorageProvider;

use std::panic::Location;

use thiserror::Error as ThisError;

pub const EMPTY_BRANCH_ERROR: &str = "EMPTY_BRANCH_ERROR";

#[derive(Debug, ThisError)]
pub enum SyncError {
    #[error("Empty Branch Error: {provider} returned no branches {location}")]
    EmptyBranch {
        provider: StorageProvider,
        location: ErrorLocation,
    },

    #[error("Missing Credentials Error: {provider} needs an id and secret {location}")]
    MissingCredentials {
        provider: StorageProvider,
        location: ErrorLocation,
    },

    #[error("No Tokens Error: {provider} returned no tokens {location}")]
    NoTokens {
        provider: StorageProvider,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Store(#[from] EditError),
}

impl SyncError {
    #[track_caller]
    pub fn empty_branch(provider: StorageProvider) -> Self {
        SyncError::EmptyBranch {
            provider,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn missing_credentials(provider: StorageProvider) -> Self {
        SyncError::MissingCredentials {
            provider,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn no_tokens(provider: StorageProvider) -> Self {
        SyncError::NoTokens {
            provider,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Canonical error code reported to the host in `failure{errorMessage}`.
    pub fn error_message(&self) -> String {
        match self {
            SyncError::EmptyBranch { .. } => String::from(EMPTY_BRANCH_ERROR),
            SyncError::MissingCredentials { .. } => String::from(ID_NON_EXIST_ERROR),
            SyncError::NoTokens { provider, .. } => String::from(provider.credential_error_code()),
            SyncError::Storage(error) => String::from(error.error_message()),
            SyncError::Store(error) => error.to_string(),
        }
    }
}
