//! Document registration core for StonePaper.
//!
//! Registers documents by content hash on top of an external transactional
//! key-value ledger. Each hash can be registered exactly once; records are
//! append-only and can be looked up by key or through a rich-query selector.
//!
//! - [`Registry`] -- create/read workflow and the operation dispatch table
//! - [`QueryExecutor`] -- selector-based lookup via the rich-query engine
//! - [`RegistryConfig`] -- calling-convention and lookup modes
//! - [`Operation`] -- the named operations a ledger invocation can target
//!
//! # Concurrency
//!
//! `createDoc` is a read-then-write with no lock held by the registry. Two
//! concurrent creates of the same unregistered hash can both pass the
//! existence check; the ledger's MVCC validation at commit is what rejects
//! the second writer. The registry does not re-implement that guarantee.

pub mod args;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod query;
pub mod registry;

pub use args::CreateDocArgs;
pub use config::{CreatorMode, LookupMode, RegistryConfig};
pub use dispatch::Operation;
pub use error::{RegistryError, RegistryResult};
pub use query::QueryExecutor;
pub use registry::Registry;
