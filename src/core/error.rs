//! Error types for document decoding and selection persistence

use thiserror::Error;

/// Failure to decode one of the API documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Body was not valid JSON or did not match the expected shape
    #[error("Failed to decode {document} document: {source}")]
    Decode {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Body decoded but is unusable (e.g. a series whose points disagree with its types)
    #[error("Invalid {document} document: {reason}")]
    Invalid {
        document: &'static str,
        reason: String,
    },
}

/// Failure to persist selection state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend refused the write (browser quota, private mode, ...)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type DocumentResult<T> = Result<T, DocumentError>;
