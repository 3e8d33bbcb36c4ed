//! Foundation types for StonePaper.
//!
//! This crate provides the value types shared by every other StonePaper
//! crate: the document hash used as the registry's primary key, the
//! registration timestamp, and the [`DocumentRecord`] together with its
//! deterministic JSON encoding.
//!
//! # Key Types
//!
//! - [`DocHash`]: Non-empty document hash, the registry's primary key
//! - [`Timestamp`]: Wall-clock registration time (RFC 3339, UTC)
//! - [`DocumentRecord`]: The registered record and its encoder/decoder

pub mod error;
pub mod hash;
pub mod record;
pub mod time;

pub use error::TypeError;
pub use hash::DocHash;
pub use record::{DocumentRecord, RECORD_TYPE};
pub use time::Timestamp;
