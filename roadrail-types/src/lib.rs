//! Core type definitions for road/rail synchronization.
//!
//! This crate defines the identifiers and content fingerprints shared by the
//! model, storage and sync crates:
//! - Source-side identity ([`SourceId`], [`ScopeId`], [`Kind`])
//! - Target-side identity ([`TargetId`], [`StableIdentifier`])
//! - Content fingerprints used purely for change classification ([`Fingerprint`])
//!
//! Geometry, entity graphs and storage concerns live in their own crates.

mod fingerprint;
mod ids;
mod kind;

pub use fingerprint::Fingerprint;
pub use ids::{ScopeId, SourceId, StableIdentifier, TargetId};
pub use kind::Kind;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown entity kind: {0}")]
    UnknownKind(String),

    #[error("invalid target id: {0}")]
    InvalidTargetId(i64),
}
