use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::config::LookupMode;
use crate::error::{RegistryError, RegistryResult};
use crate::registry::Registry;

/// The operations a ledger invocation can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateDoc,
    GetDoc,
    SetDatabase,
    SetName,
}

impl Operation {
    /// Every dispatchable operation.
    pub const ALL: [Operation; 4] = [
        Self::CreateDoc,
        Self::GetDoc,
        Self::SetDatabase,
        Self::SetName,
    ];

    /// The invocation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateDoc => "createDoc",
            Self::GetDoc => "getDoc",
            Self::SetDatabase => "setDatabase",
            Self::SetName => "setName",
        }
    }

    /// Whether the operation may write world state.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::GetDoc)
    }
}

impl FromStr for Operation {
    type Err = RegistryError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == name)
            .ok_or_else(|| RegistryError::UnknownFunction(name.to_string()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Registry {
    /// Instantiation hook. Accepts any arguments and writes nothing.
    pub fn init(&self, _args: &[String]) -> RegistryResult<Vec<u8>> {
        Ok(Vec::new())
    }

    /// Route a named invocation to its handler.
    ///
    /// Successful mutations return an empty payload; `getDoc` returns the
    /// record bytes or the query result set depending on
    /// [`RegistryConfig::lookup_mode`](crate::RegistryConfig::lookup_mode).
    pub fn invoke(&self, function: &str, args: &[String]) -> RegistryResult<Vec<u8>> {
        debug!(function, args = args.len(), "invoke is running");
        let operation: Operation = function.parse()?;

        match operation {
            Operation::CreateDoc => self.create_doc(args).map(|()| Vec::new()),
            Operation::GetDoc => match self.config().lookup_mode {
                LookupMode::Key => self.get_doc(args),
                LookupMode::Selector => self.query_executor().get_doc(args),
            },
            Operation::SetDatabase => self.set_database(args),
            Operation::SetName => self.set_name(args),
        }
    }
}
