use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// Raised when something tries to persist a provider secret.
#[derive(Debug, ThisError)]
pub enum RedactError {
    #[error("Secret Leak Error: {secret} refused to serialize {location}")]
    SerializationRefused {
        secret: &'static str,
        location: ErrorLocation,
    },
}
