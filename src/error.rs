//! Error types for agent-sessions.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the library.
///
/// Most recoverable conditions (malformed entries, unreadable storage
/// units, missing sessions) never surface here: extractors log them and
/// degrade unit-by-unit instead. What remains is genuine I/O and database
/// failure on a single storage unit.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A locked store could not be duplicated for reading.
    #[error("failed to copy storage unit {path}: {source}")]
    StoreCopy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for agent-sessions.
pub type Result<T> = std::result::Result<T, Error>;
