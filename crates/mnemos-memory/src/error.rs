//! Error types for memory operations.

/// Errors returned by memory stores.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The session has no stored memory.
    #[error("session not found: {0}")]
    SessionNotFound(String),
    /// Session id cannot be used as a storage key.
    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),
}
