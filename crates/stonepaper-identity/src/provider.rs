//! The [`IdentityProvider`] trait and a static in-process implementation.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{IdentityError, IdentityResult};

/// Source of the invoking caller's identity and credential attributes.
///
/// Implementations are bound to a single invocation: both methods answer for
/// the caller of the operation currently being executed.
pub trait IdentityProvider: Send + Sync {
    /// The ambient identity of the caller, as the ledger reports it.
    fn caller_identity(&self) -> IdentityResult<String>;

    /// Value of the named attribute on the caller's credential.
    ///
    /// Returns [`IdentityError::AttributeNotFound`] when the credential does
    /// not carry the attribute.
    fn attribute(&self, name: &str) -> IdentityResult<String>;
}

/// A fixed caller identity with an in-memory attribute map.
///
/// Used by the CLI and in tests. A provider built with [`StaticIdentity::anonymous`]
/// has no caller identity at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticIdentity {
    caller: Option<String>,
    attributes: BTreeMap<String, String>,
}

/// Attribute payload embedded in enrollment certificates:
/// `{"attrs":{"name":"value",...}}`.
#[derive(Deserialize)]
struct AttributePayload {
    attrs: BTreeMap<String, String>,
}

impl StaticIdentity {
    /// A caller with no attributes.
    pub fn new(caller: impl Into<String>) -> Self {
        Self {
            caller: Some(caller.into()),
            attributes: BTreeMap::new(),
        }
    }

    /// A provider with no caller identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Add or replace an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Build from a caller id and a certificate attribute payload.
    pub fn from_attrs_json(caller: impl Into<String>, payload: &str) -> IdentityResult<Self> {
        let parsed: AttributePayload = serde_json::from_str(payload)
            .map_err(|e| IdentityError::MalformedAttributes(e.to_string()))?;
        Ok(Self {
            caller: Some(caller.into()),
            attributes: parsed.attrs,
        })
    }

    /// All attributes, sorted by name.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

impl IdentityProvider for StaticIdentity {
    fn caller_identity(&self) -> IdentityResult<String> {
        self.caller
            .clone()
            .ok_or_else(|| IdentityError::CallerUnavailable("no caller bound to invocation".into()))
    }

    fn attribute(&self, name: &str) -> IdentityResult<String> {
        self.attributes
            .get(name)
            .cloned()
            .ok_or_else(|| IdentityError::AttributeNotFound { name: name.into() })
    }
}
