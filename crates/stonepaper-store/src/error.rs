/// Errors from world-state operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Keys must be non-empty.
    #[error("key must not be empty")]
    EmptyKey,

    /// The backend failed to serve the request.
    #[error("backend error: {0}")]
    Backend(String),

    /// A rich query string could not be parsed or uses unsupported syntax.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A key read by the transaction changed before commit.
    #[error("MVCC read conflict on key {key}")]
    MvccConflict { key: String },

    /// The transaction has already been committed or aborted.
    #[error("transaction already closed")]
    TransactionClosed,

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from snapshot persistence.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding the state was poisoned by a panicking writer.
    #[error("state lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
