// Unit tests for the app error type

use crate::error::AppError;

use sync_core::error::{ConfigError, StorageError, SyncError};

use models::StorageProvider;

/// **VALUE**: Verifies sync failures keep their canonical code through the
/// app error.
///
/// **WHY THIS MATTERS**: The binary prints the code on stderr; scripts match
/// on it to tell a bad token from a bad branch.
///
/// **BUG THIS CATCHES**: Would catch if the `#[from]` conversions wrap core
/// errors in a way that loses `error_message()`.
#[test]
fn given_storage_credential_error_when_converted_then_code_is_kept() {
    // GIVEN: A 401 from GitHub
    let storage = StorageError::from_status(StorageProvider::GitHub, 401, "Bad credentials");

    // WHEN: Converting through the app error
    let error = AppError::from(storage);

    // THEN: The canonical code survives
    assert_eq!(error.error_code().as_deref(), Some("GITHUB_CREDENTIAL_ERROR"));
}

#[test]
fn given_sync_error_when_converted_then_code_is_kept() {
    let error = AppError::from(SyncError::from(StorageError::from_status(
        StorageProvider::GitLab,
        403,
        "Forbidden",
    )));

    assert_eq!(error.error_code().as_deref(), Some("GITLAB_CREDENTIAL_ERROR"));
}

#[test]
fn given_local_errors_when_asking_for_code_then_none() {
    let app = AppError::app("boom");
    let document = AppError::document("tokens.json", "not a JSON object");
    let config = AppError::from(ConfigError::DirectoryNotFound {
        location: common::ErrorLocation::from(std::panic::Location::caller()),
    });

    assert!(app.error_code().is_none());
    assert!(document.error_code().is_none());
    assert!(config.error_code().is_none());
}

#[test]
fn given_document_error_when_displayed_then_path_and_message_are_shown() {
    let error = AppError::document("tokens.json", "not a JSON object");

    let text = error.to_string();

    assert!(text.contains("tokens.json"), "got: {text}");
    assert!(text.contains("not a JSON object"), "got: {text}");
}
