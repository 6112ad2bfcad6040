//! Error types for the directory watcher.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Errors that can occur in the directory watcher.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// The recursive watch could not be acquired.
    #[error("failed to watch {path} (os error {code:?}): {reason}")]
    WatchSetup {
        path: PathBuf,
        code: Option<i32>,
        reason: String,
    },

    /// A raw notification buffer was malformed.
    #[error("malformed notification buffer: {0}")]
    Decode(#[from] DecodeError),

    /// The notification source went away.
    #[error("notification source closed")]
    SourceClosed,

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bounds violations found while parsing a raw notification buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("record header at offset {offset} runs past buffer end ({len} bytes)")]
    TruncatedHeader { offset: usize, len: usize },

    #[error("record name at offset {offset} ({name_len} bytes) runs past buffer end")]
    TruncatedName { offset: usize, name_len: usize },

    #[error("record name length {0} is not a whole number of UTF-16 units")]
    OddNameLength(usize),

    #[error("next entry offset {next} at offset {offset} does not advance")]
    BadNextOffset { offset: usize, next: usize },
}

impl WatcherError {
    /// Wrap a watch acquisition failure, keeping the OS error code when there is one.
    pub(crate) fn watch_setup(path: impl Into<PathBuf>, err: notify::Error) -> Self {
        let code = match &err.kind {
            notify::ErrorKind::Io(io) => io.raw_os_error(),
            _ => None,
        };
        Self::WatchSetup {
            path: path.into(),
            code,
            reason: err.to_string(),
        }
    }
}
