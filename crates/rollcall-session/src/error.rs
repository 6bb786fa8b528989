//! Error types for the session layer.

use std::path::PathBuf;

/// Errors that can occur while handling credentials.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A slot id must be exactly six ASCII letters.
    #[error("invalid slot id {0:?}: expected six letters")]
    InvalidSlotId(String),

    /// Reading or writing a store file failed.
    #[error("store {path} unavailable: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A store file exists but does not hold a JSON object.
    #[error("store {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
