//! Error types for identity operations.

use thiserror::Error;

/// Errors that can occur while reading the caller's identity.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The invocation carries no caller identity.
    #[error("caller identity unavailable: {0}")]
    CallerUnavailable(String),

    /// The credential does not carry the requested attribute.
    #[error("attribute {name} not found in caller credential")]
    AttributeNotFound { name: String },

    /// The credential's attribute payload could not be decoded.
    #[error("malformed credential attributes: {0}")]
    MalformedAttributes(String),

    /// The credential subsystem failed.
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Convenience type alias for identity operations.
pub type IdentityResult<T> = std::result::Result<T, IdentityError>;
