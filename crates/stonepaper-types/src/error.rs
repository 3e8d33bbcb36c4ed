use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("{0} must be a non-empty string")]
    EmptyField(&'static str),

    #[error("record type mismatch: expected {expected}, found {found}")]
    RecordTypeMismatch { expected: String, found: String },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
