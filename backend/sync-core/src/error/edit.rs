use common::ErrorLocation;
use models::ModelError;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum EditError {
    #[error("Token Exists Error: '{name}' already exists in set '{set}' {location}")]
    TokenExists {
        set: String,
        name: String,
        location: ErrorLocation,
    },

    #[error("Token Not Found Error: '{name}' not found in set '{set}' {location}")]
    TokenNotFound {
        set: String,
        name: String,
        location: ErrorLocation,
    },

    #[error("Token Set Not Found Error: '{set}' {location}")]
    SetNotFound { set: String, location: ErrorLocation },

    #[error("Invalid Token Error: {message} {location}")]
    InvalidToken {
        message: String,
        location: ErrorLocation,
    },

    #[error("Edit Prohibited Error: document is read-only {location}")]
    Prohibited { location: ErrorLocation },

    #[error("Store Unavailable Error: {message} {location}")]
    StoreUnavailable {
        message: String,
        location: ErrorLocation,
    },
}

impl EditError {
    #[track_caller]
    pub fn token_exists(set: impl Into<String>, name: impl Into<String>) -> Self {
        EditError::TokenExists {
            set: set.into(),
            name: name.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn token_not_found(set: impl Into<String>, name: impl Into<String>) -> Self {
        EditError::TokenNotFound {
            set: set.into(),
            name: name.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn set_not_found(set: impl Into<String>) -> Self {
        EditError::SetNotFound {
            set: set.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn prohibited() -> Self {
        EditError::Prohibited {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        EditError::StoreUnavailable {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ModelError> for EditError {
    #[track_caller]
    fn from(error: ModelError) -> Self {
        EditError::InvalidToken {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
