use stonepaper_identity::IdentityError;
use stonepaper_store::StoreError;
use stonepaper_types::TypeError;
use thiserror::Error;

/// Errors returned by registry operations.
///
/// Every error is the synchronous result of one invocation. The registry
/// never retries; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Argument count, emptiness or numeric-format violation.
    #[error("{0}")]
    Validation(String),

    /// The hash is already registered.
    #[error("this hash already exists: {0}")]
    Duplicate(String),

    /// The key-value store failed a get or put.
    #[error("failed to {op} document: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: StoreError,
    },

    /// The rich-query engine failed.
    #[error("query failed: {0}")]
    Query(#[source] StoreError),

    /// No record exists for the hash.
    #[error("document does not exist: {0}")]
    NotFound(String),

    /// The operation name is not in the dispatch table.
    #[error("received unknown function invocation: {0}")]
    UnknownFunction(String),

    /// The operation is reserved but has no behavior yet.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// The caller's ambient identity could not be read.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// The record could not be encoded or decoded.
    #[error("record encoding error: {0}")]
    Encoding(#[from] TypeError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RegistryError {
    pub(crate) fn storage(op: &'static str, source: StoreError) -> Self {
        Self::Storage { op, source }
    }

    /// Stable error code for callers that report errors across a boundary.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::Duplicate(_) => "DuplicateError",
            Self::Storage { .. } => "StorageError",
            Self::Query(_) => "QueryError",
            Self::NotFound(_) => "NotFoundError",
            Self::UnknownFunction(_) => "UnknownFunctionError",
            Self::NotImplemented(_) => "NotImplementedError",
            Self::Identity(_) => "IdentityError",
            Self::Encoding(_) => "EncodingError",
            Self::Config(_) => "ConfigError",
        }
    }
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_mentions_operation() {
        let err = RegistryError::storage("get", StoreError::Backend("peer unreachable".into()));
        assert_eq!(
            err.to_string(),
            "failed to get document: backend error: peer unreachable"
        );
        assert_eq!(err.code(), "StorageError");
    }

    #[test]
    fn codes_are_distinct() {
        let errors = [
            RegistryError::Validation("v".into()),
            RegistryError::Duplicate("h".into()),
            RegistryError::Query(StoreError::InvalidQuery("q".into())),
            RegistryError::NotFound("h".into()),
            RegistryError::UnknownFunction("f".into()),
            RegistryError::NotImplemented("setName"),
        ];
        let mut codes: Vec<_> = errors.iter().map(RegistryError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
