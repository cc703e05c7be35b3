//! Content fingerprints for change classification.
//!
//! A fingerprint is never used as identity. It only answers "did the content
//! of this entity change since the last recorded run?".

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 digest of an entity's serialized payload plus the source's
/// last-modified timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Lowercase hex SHA-256 of the serialized content.
    digest: String,
    /// Last-modified time reported by the source (milliseconds since epoch).
    last_modified: i64,
}

impl Fingerprint {
    /// Hashes `content` into a fingerprint.
    #[must_use]
    pub fn of_bytes(content: &[u8], last_modified: i64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        Self {
            digest: hex::encode(hasher.finalize()),
            last_modified,
        }
    }

    /// Rebuilds a fingerprint from persisted parts.
    pub fn from_parts(digest: impl Into<String>, last_modified: i64) -> Self {
        Self {
            digest: digest.into(),
            last_modified,
        }
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Returns the source last-modified timestamp.
    #[must_use]
    pub const fn last_modified(&self) -> i64 {
        self.last_modified
    }

    /// True when both fingerprints describe byte-identical content.
    ///
    /// The timestamp is informational: a source that re-saves identical
    /// geometry does not invalidate previously converted targets.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}
