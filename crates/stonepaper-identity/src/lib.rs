//! Caller identity for StonePaper.
//!
//! The ledger runtime knows who submitted an invocation and which attributes
//! their credential carries. This crate models that collaborator as the
//! [`IdentityProvider`] trait and builds the creator-stamping policy on top
//! of it.
//!
//! # Modules
//!
//! - [`provider`]: The [`IdentityProvider`] trait and [`StaticIdentity`]
//! - [`resolver`]: [`IdentityResolver`], which turns an optional explicit
//!   creator into the final `creator` string of a record
//! - [`error`]: Error types for identity lookups

pub mod error;
pub mod provider;
pub mod resolver;

pub use error::{IdentityError, IdentityResult};
pub use provider::{IdentityProvider, StaticIdentity};
pub use resolver::{IdentityResolver, DEFAULT_ATTRIBUTE};
