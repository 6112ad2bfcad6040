//! Error types for the file engine session.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the file engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Change monitor error.
    #[error("watcher error: {0}")]
    Watcher(#[from] file_engine_directory_watcher::WatcherError),

    /// Tree scan error.
    #[error("scan error: {0}")]
    Scan(#[from] file_engine_scanner::ScanError),

    /// Settings file could not be parsed.
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
