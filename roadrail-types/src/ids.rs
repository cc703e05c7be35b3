//! Identifier types used throughout the synchronization engine.
//!
//! Source identifiers come from the external design feed and are stable across
//! runs. Target identifiers are assigned by the storage layer on first creation.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a logical entity in the source feed.
///
/// Stable across runs for the same logical entity, but not necessarily unique
/// in a raw feed: the same entity can be discovered through several traversal
/// paths. Ordering is lexicographic, which the dedup pass relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Creates a source id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a stable identifier when this id is GUID-shaped.
    #[must_use]
    pub fn stable_identifier(&self) -> Option<StableIdentifier> {
        StableIdentifier::parse(&self.0)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for SourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifier of a persisted target entity.
///
/// Assigned by the storage layer on first creation and stable thereafter.
/// Valid ids are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(i64);

impl TargetId {
    /// Wraps a raw storage id, rejecting non-positive values.
    pub fn new(raw: i64) -> crate::Result<Self> {
        if raw > 0 {
            Ok(Self(raw))
        } else {
            Err(crate::Error::InvalidTargetId(raw))
        }
    }

    /// Returns the raw storage id.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic GUID derived from a GUID-shaped [`SourceId`].
///
/// Accepts every textual form `uuid` understands (hyphenated, simple, braced,
/// urn). Anything else yields no identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StableIdentifier(Uuid);

impl StableIdentifier {
    /// Parses a stable identifier, returning `None` for non-GUID strings.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(Self)
    }

    /// Creates a stable identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for StableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StableIdentifier {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// Synchronization scope, typically one source repository or model.
///
/// SyncInfo records are partitioned by scope so that two sources converted
/// into the same target never see each other's state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    /// Creates a scope id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
