use std::path::Path;

use serde::{Deserialize, Serialize};
use stonepaper_identity::DEFAULT_ATTRIBUTE;

use crate::error::{RegistryError, RegistryResult};

/// Where the `creator` of a new record comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatorMode {
    /// `createDoc` takes 4 arguments; the creator is the caller's ambient
    /// identity.
    #[default]
    Ambient,
    /// `createDoc` takes 5 arguments; the 5th names the creator, which is
    /// then enriched with a credential attribute.
    Explicit,
}

impl CreatorMode {
    /// Number of positional `createDoc` arguments in this mode.
    pub fn create_arg_count(&self) -> usize {
        match self {
            Self::Ambient => 4,
            Self::Explicit => 5,
        }
    }
}

/// Which lookup `getDoc` performs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupMode {
    /// Direct key fetch; returns the stored record bytes.
    #[default]
    Key,
    /// Rich-query selector; returns the serialized result set.
    Selector,
}

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Calling convention for `createDoc`.
    pub creator_mode: CreatorMode,
    /// Lookup performed by `getDoc`.
    pub lookup_mode: LookupMode,
    /// Credential attribute appended to explicit creators.
    pub attribute_name: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            creator_mode: CreatorMode::Ambient,
            lookup_mode: LookupMode::Key,
            attribute_name: DEFAULT_ATTRIBUTE.into(),
        }
    }
}

impl RegistryConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> RegistryResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| RegistryError::Config(e.to_string()))?;
        if config.attribute_name.is_empty() {
            return Err(RegistryError::Config(
                "attribute_name must not be empty".into(),
            ));
        }
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> RegistryResult<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }
}
