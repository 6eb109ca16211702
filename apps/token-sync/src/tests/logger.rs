// Unit tests for logger initialization

use crate::error::AppError;
use crate::logger::{LOG_FILE_NAME, dispatch, initialize};

use tempfile::TempDir;

/// **VALUE**: Verifies that calling initialize() twice does not fail.
///
/// **WHY THIS MATTERS**: fern panics when a second global logger is set. Any
/// code path that initializes again (tests, a retry in `main`) would crash.
///
/// **BUG THIS CATCHES**: Would catch if the Once or AtomicBool guards are
/// removed.
#[test]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A valid temporary directory
    let dir = TempDir::new().expect("temp dir");

    // WHEN: Calling initialize twice
    let first = initialize(dir.path(), false);
    let second = initialize(dir.path(), true);

    // THEN: Both return Ok
    assert!(first.is_ok(), "First initialization should succeed");
    assert!(second.is_ok(), "Second initialization should be a no-op");
}

/// **VALUE**: Verifies a missing log directory is an error, not a panic.
///
/// **WHY THIS MATTERS**: `main` creates the directory first, but a config dir
/// on a read-only mount would otherwise crash before anything is logged.
///
/// **BUG THIS CATCHES**: Would catch an `unwrap()` around `fern::log_file`.
#[test]
fn given_missing_log_dir_when_building_dispatch_then_app_error() {
    // GIVEN: A directory that does not exist
    let dir = TempDir::new().expect("temp dir");
    let missing = dir.path().join("does").join("not").join("exist");

    // WHEN: Building the dispatcher without installing it
    let result = dispatch(&missing, false);

    // THEN: A clear app error
    assert!(matches!(result, Err(AppError::App { .. })));
}

#[test]
fn given_valid_dir_when_building_dispatch_then_log_file_is_created() {
    let dir = TempDir::new().expect("temp dir");

    let result = dispatch(dir.path(), false);

    assert!(result.is_ok());
    assert!(dir.path().join(LOG_FILE_NAME).exists());
}
