//! Creator resolution for new records.

use tracing::warn;

use crate::error::{IdentityError, IdentityResult};
use crate::provider::IdentityProvider;

/// Attribute appended to an explicit creator unless configured otherwise.
pub const DEFAULT_ATTRIBUTE: &str = "username";

/// Produces the `creator` string stamped on a new record.
///
/// - Without an explicit creator, the caller's ambient identity is used
///   verbatim.
/// - With an explicit creator, the configured attribute is fetched from the
///   caller's credential and appended: `"<creator>-<value>"`. If the fetch
///   fails the error text is embedded instead: `"<creator>-Failed <error>"`.
///   Attribute enrichment is best-effort and never fails the resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityResolver {
    attribute: String,
}

impl IdentityResolver {
    /// Resolver that appends the named credential attribute.
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }

    /// The attribute appended to explicit creators.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Resolve the creator for one invocation.
    ///
    /// Only the ambient path can fail, when the provider has no caller or
    /// reports an empty one.
    pub fn resolve(
        &self,
        provider: &dyn IdentityProvider,
        explicit: Option<&str>,
    ) -> IdentityResult<String> {
        let Some(creator) = explicit else {
            let caller = provider.caller_identity()?;
            if caller.is_empty() {
                return Err(IdentityError::CallerUnavailable(
                    "caller identity is empty".into(),
                ));
            }
            return Ok(caller);
        };

        match provider.attribute(&self.attribute) {
            Ok(value) => Ok(format!("{creator}-{value}")),
            Err(e) => {
                warn!(attribute = %self.attribute, error = %e, "attribute lookup failed; embedding diagnostic in creator");
                Ok(format!("{creator}-Failed {e}"))
            }
        }
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ATTRIBUTE)
    }
}
