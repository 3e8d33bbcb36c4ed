use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content hash of a registered document.
///
/// A `DocHash` is the registry's primary key. The registry does not impose a
/// hash algorithm on callers: any non-empty string is accepted, so documents
/// hashed by external tooling can be registered as-is. [`DocHash::of_content`]
/// derives a BLAKE3 hex digest for callers that want one computed locally.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocHash(String);

impl DocHash {
    /// Wrap a caller-supplied hash string. Rejects the empty string.
    pub fn new(hash: impl Into<String>) -> Result<Self, TypeError> {
        let hash = hash.into();
        if hash.is_empty() {
            return Err(TypeError::EmptyField("docHash"));
        }
        Ok(Self(hash))
    }

    /// BLAKE3 digest of `content`, hex-encoded.
    pub fn of_content(content: &[u8]) -> Self {
        Self(hex::encode(blake3::hash(content).as_bytes()))
    }

    /// The hash as a string slice (also the store key).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for log lines (first 12 characters).
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(12) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl TryFrom<String> for DocHash {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocHash> for String {
    fn from(hash: DocHash) -> Self {
        hash.0
    }
}

impl AsRef<str> for DocHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DocHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocHash({})", self.short())
    }
}

impl fmt::Display for DocHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
