//! Error types for the tree scanner.

use thiserror::Error;

/// Result type alias for scan operations.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors that can occur while scanning.
///
/// Directories that cannot be listed are skipped rather than reported.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The extension filter is not a usable pattern.
    #[error("invalid extension filter {filter:?}: {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: glob::PatternError,
    },
}
