//! Error types for Mirra

use thiserror::Error;

/// Core Mirra errors
///
/// Permission denials and validation failures are deliberately absent:
/// they are values (`PermissionCheckResult`, `None`), not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirraError {
    // Host errors
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Host rejected mutation: {0}")]
    MutationRejected(String),

    // Model errors
    #[error("Model data was unloaded before the operation completed")]
    Unloaded,

    #[error("Unknown watch key {key:?} for {model}")]
    InvalidWatchKey { model: &'static str, key: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    // Data errors
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Runtime errors
    #[error("No async runtime available")]
    NoRuntime,
}

impl From<serde_json::Error> for MirraError {
    fn from(err: serde_json::Error) -> Self {
        MirraError::Serialization(err.to_string())
    }
}

/// Result type for Mirra operations
pub type MirraResult<T> = Result<T, MirraError>;
