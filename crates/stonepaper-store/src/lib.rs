//! World-state storage for StonePaper.
//!
//! The registry never talks to a ledger directly. It consumes two
//! collaborator traits defined here:
//!
//! - [`StateStore`] -- get/put by key, where `None` means "absent"
//! - [`RichQuery`] -- selector queries returning a serialized result set
//!
//! # Backends
//!
//! - [`InMemoryStateStore`] -- `BTreeMap`-based world state for tests, demos
//!   and the CLI, with versioned keys, optimistic [`Transaction`]s and JSON
//!   snapshot persistence
//!
//! # Design Rules
//!
//! 1. The store never interprets values, except that rich queries only see
//!    values that parse as JSON objects.
//! 2. Uniqueness checks made by callers (read, then write) are only safe under
//!    the backend's MVCC validation at commit.
//! 3. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod query;
pub mod traits;
pub mod transaction;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStateStore;
pub use query::{QueryResult, Selector};
pub use traits::{RichQuery, StateStore};
pub use transaction::Transaction;
