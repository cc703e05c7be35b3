//! Fingerprinting wrapper around one source entity.

use crate::geometry::GeometryPayload;
use crate::source::{CrossRef, SourceEntity, SourceGraph};
use roadrail_types::{Fingerprint, Kind, SourceId};
use serde::Serialize;
use std::cell::OnceCell;
use std::collections::BTreeMap;

/// Why a fingerprint could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    /// The entity has nothing to convert. Not a failure: callers skip it.
    #[error("{kind} {source_id} has no convertible geometry")]
    EmptyGeometry { kind: Kind, source_id: SourceId },

    #[error("failed to serialize geometry: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Anything the change detector can classify.
pub trait FingerprintSource {
    fn id(&self) -> &SourceId;
    fn kind(&self) -> Kind;
    /// Content fingerprint. Deterministic for identical content.
    fn fingerprint(&self) -> Result<Fingerprint, FingerprintError>;
}

/// A source entity viewed through its graph.
///
/// The fingerprint is computed lazily, at most once. Corridor fingerprints
/// also cover the corridor's surfaces, so a changed surface list reclassifies
/// the corridor.
pub struct SourceItem<'g> {
    entity: &'g SourceEntity,
    graph: &'g SourceGraph,
    cached: OnceCell<Fingerprint>,
}

#[derive(Serialize)]
struct FingerprintInput<'a> {
    kind: Kind,
    feature_name: Option<&'a str>,
    cross_refs: &'a [CrossRef],
    payload: &'a GeometryPayload,
    components: Vec<ComponentInput<'a>>,
}

#[derive(Serialize)]
struct ComponentInput<'a> {
    source_id: &'a SourceId,
    feature_name: Option<&'a str>,
    payload: &'a GeometryPayload,
}

impl<'g> SourceItem<'g> {
    #[must_use]
    pub fn new(entity: &'g SourceEntity, graph: &'g SourceGraph) -> Self {
        Self {
            entity,
            graph,
            cached: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn entity(&self) -> &'g SourceEntity {
        self.entity
    }

    fn components(&self) -> Vec<ComponentInput<'g>> {
        if self.entity.kind != Kind::Corridor {
            return Vec::new();
        }
        let mut canonical: BTreeMap<&SourceId, &SourceEntity> = BTreeMap::new();
        for child in self
            .graph
            .children(&self.entity.source_id, Kind::CorridorSurface)
        {
            canonical
                .entry(&child.source_id)
                .and_modify(|kept| {
                    if child.display_name < kept.display_name {
                        *kept = child;
                    }
                })
                .or_insert(child);
        }
        canonical
            .into_values()
            .map(|c| ComponentInput {
                source_id: &c.source_id,
                feature_name: c.feature_name.as_deref(),
                payload: &c.payload,
            })
            .collect()
    }

    fn compute(&self) -> Result<Fingerprint, FingerprintError> {
        if !self.entity.payload.is_convertible() {
            return Err(FingerprintError::EmptyGeometry {
                kind: self.entity.kind,
                source_id: self.entity.source_id.clone(),
            });
        }
        let input = FingerprintInput {
            kind: self.entity.kind,
            feature_name: self.entity.feature_name.as_deref(),
            cross_refs: &self.entity.cross_refs,
            payload: &self.entity.payload,
            components: self.components(),
        };
        let bytes = serde_json::to_vec(&input)?;
        Ok(Fingerprint::of_bytes(&bytes, self.entity.last_modified))
    }
}

impl FingerprintSource for SourceItem<'_> {
    fn id(&self) -> &SourceId {
        &self.entity.source_id
    }

    fn kind(&self) -> Kind {
        self.entity.kind
    }

    fn fingerprint(&self) -> Result<Fingerprint, FingerprintError> {
        if let Some(fp) = self.cached.get() {
            return Ok(fp.clone());
        }
        let fp = self.compute()?;
        let _ = self.cached.set(fp.clone());
        Ok(fp)
    }
}
