//! Error types for the sync layer.
//!
//! [`SyncError`] aborts a whole run. [`ConvertError`] is local to one entity:
//! it is logged and recorded in the run report, and siblings keep converting.

use crate::orchestrator::Phase;
use roadrail_model::{FingerprintError, GeometryError};
use roadrail_storage::StorageError;
use roadrail_types::{Kind, SourceId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for run-level operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Result type for single-entity conversions.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors that abort a conversion run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The schema update could not be published.
    #[error("schema publish failed: {0}")]
    SchemaPublish(String),

    /// Target store or schema repository error outside an entity boundary.
    #[error("storage error: {0}")]
    Storage(String),

    /// SyncInfo store error outside an entity boundary.
    #[error("sync info store error: {0}")]
    SyncInfo(String),

    /// The discovery feed failed.
    #[error("discovery failed: {0}")]
    Discovery(String),

    /// Cancellation was requested; checked between phases only.
    #[error("conversion cancelled before {0} phase")]
    Cancelled(Phase),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors local to one source entity.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Nothing to convert. A silent skip, not a failure.
    #[error("{kind} {source_id} has no convertible geometry")]
    EmptyGeometry { kind: Kind, source_id: SourceId },

    /// A dependency has no target identity (yet).
    #[error("{kind} {source_id} references unresolved {missing}")]
    UnresolvedReference {
        kind: Kind,
        source_id: SourceId,
        missing: String,
    },

    /// The target store rejected a create or update.
    #[error("persistence failure: {0}")]
    Persistence(#[from] StorageError),

    /// The SyncInfo record could not be written after a successful target write.
    #[error("sync info write failed: {0}")]
    SyncWrite(String),

    /// The prior SyncInfo record could not be read, so nothing was classified.
    #[error("sync info lookup failed: {0}")]
    SyncLookup(String),

    #[error("geometry marshaling failed: {0}")]
    Geometry(#[from] GeometryError),

    #[error("fingerprint failed: {0}")]
    Fingerprint(String),
}

impl From<FingerprintError> for ConvertError {
    fn from(e: FingerprintError) -> Self {
        match e {
            FingerprintError::EmptyGeometry { kind, source_id } => {
                ConvertError::EmptyGeometry { kind, source_id }
            }
            FingerprintError::Serialization(e) => ConvertError::Fingerprint(e.to_string()),
        }
    }
}

/// Taxonomy class of a per-entity failure, as recorded in the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    EmptyGeometry,
    UnresolvedReference,
    Persistence,
    SyncWrite,
    SyncLookup,
    Geometry,
    Fingerprint,
}

impl ConvertError {
    #[must_use]
    pub fn class(&self) -> FailureClass {
        match self {
            ConvertError::EmptyGeometry { .. } => FailureClass::EmptyGeometry,
            ConvertError::UnresolvedReference { .. } => FailureClass::UnresolvedReference,
            ConvertError::Persistence(_) => FailureClass::Persistence,
            ConvertError::SyncWrite(_) => FailureClass::SyncWrite,
            ConvertError::SyncLookup(_) => FailureClass::SyncLookup,
            ConvertError::Geometry(_) => FailureClass::Geometry,
            ConvertError::Fingerprint(_) => FailureClass::Fingerprint,
        }
    }
}
