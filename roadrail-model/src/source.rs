//! Source entity arena.
//!
//! The discovery feed is snapshotted once per run into a [`SourceGraph`].
//! Parent and cross references are stored as [`SourceId`] values and resolved
//! through the graph, so alignment ↔ corridor ↔ profile back-pointers never
//! form ownership cycles.

use crate::geometry::GeometryPayload;
use roadrail_types::{Kind, SourceId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Meaning of a cross reference between source entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossRefRole {
    /// Corridor → the design alignment it is built on.
    Alignment,
    /// Alignment → its designated active vertical profile.
    ActiveProfile,
    /// 3D linear → the corridor that generated it.
    Corridor,
}

/// A typed reference to another source entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrossRef {
    pub role: CrossRefRole,
    pub target: SourceId,
}

/// One logical unit from the external design feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntity {
    pub kind: Kind,
    pub source_id: SourceId,
    pub display_name: String,
    /// Feature definition path, e.g. `Alignment\Road\Centerline`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<SourceId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cross_refs: Vec<CrossRef>,
    pub payload: GeometryPayload,
    /// Milliseconds since epoch, as reported by the source.
    #[serde(default)]
    pub last_modified: i64,
}

impl SourceEntity {
    /// Creates an entity with an empty payload.
    pub fn new(kind: Kind, source_id: impl Into<SourceId>, display_name: impl Into<String>) -> Self {
        Self {
            kind,
            source_id: source_id.into(),
            display_name: display_name.into(),
            feature_name: None,
            parent: None,
            cross_refs: Vec::new(),
            payload: GeometryPayload::Empty,
            last_modified: 0,
        }
    }

    #[must_use]
    pub fn with_feature(mut self, feature_name: impl Into<String>) -> Self {
        self.feature_name = Some(feature_name.into());
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<SourceId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn with_cross_ref(mut self, role: CrossRefRole, target: impl Into<SourceId>) -> Self {
        self.cross_refs.push(CrossRef {
            role,
            target: target.into(),
        });
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: GeometryPayload) -> Self {
        self.payload = payload;
        self
    }

    #[must_use]
    pub fn with_last_modified(mut self, last_modified: i64) -> Self {
        self.last_modified = last_modified;
        self
    }

    /// First cross reference with the given role.
    #[must_use]
    pub fn cross_ref(&self, role: CrossRefRole) -> Option<&SourceId> {
        self.cross_refs
            .iter()
            .find(|r| r.role == role)
            .map(|r| &r.target)
    }

    /// True for alignments whose feature path starts with `prefix`.
    #[must_use]
    pub fn is_design_alignment(&self, prefix: &str) -> bool {
        self.kind == Kind::Alignment
            && self
                .feature_name
                .as_deref()
                .is_some_and(|f| f.starts_with(prefix))
    }
}

/// Arena of source entities for one run, indexed by `(Kind, SourceId)`.
///
/// The raw feed may contain the same logical entity more than once; every
/// occurrence is kept here and dedup is left to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct SourceGraph {
    entities: Vec<SourceEntity>,
    by_id: HashMap<(Kind, SourceId), Vec<usize>>,
    by_parent: HashMap<SourceId, Vec<usize>>,
}

impl SourceGraph {
    /// Snapshots a raw discovery feed.
    #[must_use]
    pub fn from_feed(entities: Vec<SourceEntity>) -> Self {
        let mut by_id: HashMap<(Kind, SourceId), Vec<usize>> = HashMap::new();
        let mut by_parent: HashMap<SourceId, Vec<usize>> = HashMap::new();
        for (idx, e) in entities.iter().enumerate() {
            by_id
                .entry((e.kind, e.source_id.clone()))
                .or_default()
                .push(idx);
            if let Some(parent) = &e.parent {
                by_parent.entry(parent.clone()).or_default().push(idx);
            }
        }
        Self {
            entities,
            by_id,
            by_parent,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All raw entities, duplicates included, in feed order.
    #[must_use]
    pub fn entities(&self) -> &[SourceEntity] {
        &self.entities
    }

    /// Raw entities of one kind, duplicates included, in feed order.
    pub fn of_kind(&self, kind: Kind) -> impl Iterator<Item = &SourceEntity> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    /// Canonical occurrence of an entity: the lexicographically first by
    /// display name among all occurrences sharing the id.
    #[must_use]
    pub fn resolve(&self, kind: Kind, id: &SourceId) -> Option<&SourceEntity> {
        self.by_id
            .get(&(kind, id.clone()))?
            .iter()
            .map(|&i| &self.entities[i])
            .min_by(|a, b| a.display_name.cmp(&b.display_name))
    }

    /// Raw children of `parent` with the given kind, duplicates included.
    #[must_use]
    pub fn children(&self, parent: &SourceId, kind: Kind) -> Vec<&SourceEntity> {
        self.by_parent
            .get(parent)
            .map(|idx| {
                idx.iter()
                    .map(|&i| &self.entities[i])
                    .filter(|e| e.kind == kind)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Distinct feature names observed on entities of one kind.
    #[must_use]
    pub fn feature_names(&self, kind: Kind) -> BTreeSet<&str> {
        self.of_kind(kind)
            .filter_map(|e| e.feature_name.as_deref())
            .collect()
    }
}
