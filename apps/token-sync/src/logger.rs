//! Logging for the `token-sync` binary.
//!
//! Dual output (coloured stderr + plain file) with thread-safe initialization.

use crate::error::AppError;

use std::io::stderr;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

/// Thread-safe initialization guard.
static INIT_LOGGER_ONCE: Once = Once::new();

/// Tracks if logger initialization was already attempted.
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const LOG_FILE_NAME: &str = "token-sync.log";

const LOGGER_INITIALIZED_MESSAGE_PREFIX: &str = "Logger initialized with level: ";

const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

#[cfg(debug_assertions)]
const LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Initialize the logger with dual output (terminal + file).
///
/// Safe to call multiple times: later calls log a warning and return Ok.
/// The terminal shows warnings and errors, or everything down to Debug with
/// `verbose`. The file records at the build's level.
///
/// # Errors
///
/// Returns an error if the log file cannot be created or the dispatcher
/// cannot be installed.
pub fn initialize(log_dir: &Path, verbose: bool) -> Result<(), AppError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = dispatch(log_dir, verbose).and_then(|dispatch| {
            dispatch
                .apply()
                .map_err(|e| AppError::app(format!("Failed to initialize logger: {e}")))
        });
        if result.is_ok() {
            info!("{LOGGER_INITIALIZED_MESSAGE_PREFIX}{LOG_LEVEL:?}");
        }
    });

    result
}

/// Builds the dispatcher without installing it.
///
/// Terminal output goes to stderr so command output on stdout stays
/// machine-readable.
pub fn dispatch(log_dir: &Path, verbose: bool) -> Result<Dispatch, AppError> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);

    let color_configuration = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let terminal_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let terminal_dispatch = Dispatch::new()
        .level(terminal_level)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = color_configuration.color(record.level()),
                message = message,
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0),
            ))
        })
        .chain(stderr());

    let file_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = record.level(),
                message = message,
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0)
            ))
        })
        .chain(
            fern::log_file(&log_file_path)
                .map_err(|e| AppError::app(format!("Failed to create log file: {e}")))?,
        );

    Ok(Dispatch::new()
        .level(LOG_LEVEL.max(terminal_level))
        // reqwest's connection pool is noisy at debug
        .level_for("hyper_util", LevelFilter::Info)
        .chain(terminal_dispatch)
        .chain(file_dispatch))
}
