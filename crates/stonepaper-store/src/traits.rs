use crate::error::StoreResult;

/// Transactional key-value world state.
///
/// Implementations must satisfy these invariants:
/// - `get_state` distinguishes "absent" (`Ok(None)`) from an empty value
///   (`Ok(Some(vec![]))`).
/// - Errors are propagated, never folded into "absent".
/// - Concurrent writers to the same key are serialized by the backend's own
///   concurrency control; callers hold no locks across a read and a write.
pub trait StateStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write `value` under `key`, replacing any previous value.
    fn put_state(&self, key: &str, value: &[u8]) -> StoreResult<()>;
}

/// Selector-based query engine over JSON world-state documents.
pub trait RichQuery: Send + Sync {
    /// Execute a query string of the form `{"selector":{...}}`.
    ///
    /// Returns the serialized result set: a JSON array of
    /// `{"Key": ..., "Record": ...}` objects, `[]` when nothing matches.
    fn query(&self, query: &str) -> StoreResult<Vec<u8>>;
}
