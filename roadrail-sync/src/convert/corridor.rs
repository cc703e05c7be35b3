//! Corridor converter: corridor, pathway and one component per surface.

use super::{new_target_data, write_target, ConversionContext, ConversionOutcome};
use crate::change_detector::{ChangeRecord, Classification};
use crate::error::{ConvertError, ConvertResult};
use crate::orchestrator::dedup_by_source_id;
use roadrail_model::{
    Container, CorridorHeader, CrossRefRole, GeometryPayload, SourceEntity, SourceItem,
    TargetData, TargetQuery, CORRIDOR_COMPONENT_BASE,
};
use roadrail_storage::StorageError;
use roadrail_types::{Kind, TargetId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

pub const CORRIDOR_CLASS: &str = "Corridor";
/// Target id of the corridor's design alignment.
pub const ALIGNMENT_PROPERTY: &str = "alignment";
pub const CLASSIFICATION_PROPERTY: &str = "classification";
pub const START_STATION_PROPERTY: &str = "start_station";
pub const END_STATION_PROPERTY: &str = "end_station";
pub const FEATURE_PROPERTY: &str = "feature";

/// Coarse corridor classification, deciding the pathway class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorridorClassification {
    Road,
    Rail,
    Undetermined,
}

impl CorridorClassification {
    /// Cant data means rail, superelevation means road.
    #[must_use]
    pub fn from_header(header: &CorridorHeader) -> Self {
        if header.has_cant {
            CorridorClassification::Rail
        } else if header.has_superelevation {
            CorridorClassification::Road
        } else {
            CorridorClassification::Undetermined
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CorridorClassification::Road => "road",
            CorridorClassification::Rail => "rail",
            CorridorClassification::Undetermined => "undetermined",
        }
    }

    #[must_use]
    pub const fn pathway_class(&self) -> &'static str {
        match self {
            CorridorClassification::Road => "RoadPathway",
            CorridorClassification::Rail => "RailPathway",
            CorridorClassification::Undetermined => "UndeterminedPathway",
        }
    }
}

impl fmt::Display for CorridorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts one corridor.
///
/// The corridor's alignment must already be in the identity map; otherwise
/// nothing is written and [`ConvertError::UnresolvedReference`] is returned.
/// A `Changed` corridor keeps its own target as is and only re-synchronizes
/// its components. Components are visited for `Unchanged` corridors too, so
/// a component that failed in an earlier run is retried.
pub fn convert_corridor(
    ctx: &mut ConversionContext<'_>,
    entity: &SourceEntity,
) -> ConvertResult<ConversionOutcome> {
    let graph = ctx.graph;
    let alignment_id = match resolve_alignment(ctx, entity) {
        Ok(id) => id,
        Err(e) => {
            mark_tree_seen(ctx, entity);
            return Err(e);
        }
    };

    let header = match &entity.payload {
        GeometryPayload::Corridor(h) => *h,
        _ => CorridorHeader::default(),
    };
    let classification = CorridorClassification::from_header(&header);

    let record = ctx.detector.detect(&SourceItem::new(entity, graph))?;
    let existing = match (record.classification, record.prior_target_id) {
        (Classification::Unchanged | Classification::Changed, Some(id)) => ctx.store.get_entity(id)?,
        _ => None,
    };

    let outcome = match existing {
        Some(stored) if record.classification == Classification::Unchanged => {
            ConversionOutcome::Unchanged(stored.id)
        }
        Some(stored) => {
            if let Some(previous) = stored.data.target_ref(ALIGNMENT_PROPERTY)
                && previous != alignment_id
            {
                debug!(
                    corridor = %entity.source_id,
                    stored = %previous,
                    resolved = %alignment_id,
                    "corridor alignment reference moved; stored link kept"
                );
            }
            ConversionOutcome::Updated(stored.id)
        }
        None => {
            // A recorded target that no longer exists is recreated.
            let record = match record.classification {
                Classification::Unchanged => ChangeRecord {
                    classification: Classification::Changed,
                    ..record
                },
                _ => record,
            };
            let marshaler = ctx.marshaler;
            let transform = ctx.config.spatial_transform;
            let written = write_target(ctx, Container::Corridors, entity, CORRIDOR_CLASS, record, |data| {
                data.set_property(ALIGNMENT_PROPERTY, alignment_id.value());
                data.set_property(CLASSIFICATION_PROPERTY, classification.as_str());
                data.geometry = marshaler.marshal(&entity.payload, &transform)?;
                Ok(())
            });
            match written {
                Ok(outcome) => outcome,
                Err(e) => {
                    mark_tree_seen(ctx, entity);
                    return Err(e);
                }
            }
        }
    };

    let corridor_id = outcome.target_id();
    let pathway_id = match ensure_pathway(ctx, entity, corridor_id, classification) {
        Ok(id) => id,
        Err(e) => {
            mark_tree_seen(ctx, entity);
            return Err(e);
        }
    };
    sync_components(ctx, entity, pathway_id);

    if matches!(outcome, ConversionOutcome::Updated(_)) {
        ctx.commit(Kind::Corridor, &entity.source_id, corridor_id);
    }
    Ok(outcome)
}

fn resolve_alignment(ctx: &ConversionContext<'_>, entity: &SourceEntity) -> ConvertResult<TargetId> {
    let unresolved = |missing: String| ConvertError::UnresolvedReference {
        kind: Kind::Corridor,
        source_id: entity.source_id.clone(),
        missing,
    };
    let alignment = entity
        .cross_ref(CrossRefRole::Alignment)
        .ok_or_else(|| unresolved("alignment reference".to_string()))?;
    ctx.identity
        .get(alignment)
        .ok_or_else(|| unresolved(format!("alignment {alignment}")))
}

/// Marks a corridor and its surfaces seen without converting them.
fn mark_tree_seen(ctx: &mut ConversionContext<'_>, entity: &SourceEntity) {
    let graph = ctx.graph;
    ctx.detector.mark_seen(Kind::Corridor, &entity.source_id);
    for surface in graph.children(&entity.source_id, Kind::CorridorSurface) {
        ctx.detector.mark_seen(Kind::CorridorSurface, &surface.source_id);
    }
}

/// The corridor's pathway, created on first need. An existing pathway keeps
/// its class.
fn ensure_pathway(
    ctx: &mut ConversionContext<'_>,
    corridor: &SourceEntity,
    corridor_id: TargetId,
    classification: CorridorClassification,
) -> ConvertResult<TargetId> {
    let container = Container::Pathways(corridor_id);
    if let Some(id) = ctx.store.find_by_code(container, corridor.source_id.as_str())? {
        return Ok(id);
    }

    let data = TargetData::new(
        classification.pathway_class(),
        corridor.source_id.as_str(),
        format!("{} ({classification})", corridor.display_name),
    )
    .with_stable_id(corridor.source_id.stable_identifier());
    let id = ctx.store.create_entity(container, &data)?;
    ctx.report.created += 1;
    debug!(corridor = %corridor.source_id, pathway = %id, %classification, "pathway created");
    Ok(id)
}

fn sync_components(ctx: &mut ConversionContext<'_>, corridor: &SourceEntity, pathway_id: TargetId) {
    let graph = ctx.graph;
    for surface in dedup_by_source_id(graph.children(&corridor.source_id, Kind::CorridorSurface)) {
        if let Err(e) = convert_component(ctx, surface, pathway_id) {
            ctx.entity_failed(Kind::CorridorSurface, &surface.source_id, &e);
        }
    }
}

/// Converts one surface into a component, matching an existing component
/// through its recorded source reference rather than the SyncInfo target id.
fn convert_component(
    ctx: &mut ConversionContext<'_>,
    surface: &SourceEntity,
    pathway_id: TargetId,
) -> ConvertResult<ConversionOutcome> {
    let record = ctx.detector.detect(&SourceItem::new(surface, ctx.graph))?;
    if let (Classification::Unchanged, Some(id)) = (record.classification, record.prior_target_id) {
        return Ok(ConversionOutcome::Unchanged(id));
    }

    let container = Container::Components(pathway_id);
    let class_name = ctx
        .catalog
        .resolve(surface.feature_name.as_deref(), CORRIDOR_COMPONENT_BASE);
    let transform = ctx.config.spatial_transform;
    let geometry = ctx.marshaler.marshal(&surface.payload, &transform)?;
    let (start, end) = match &surface.payload {
        GeometryPayload::Surface(mesh) => (
            transform.apply_length(mesh.start_station),
            transform.apply_length(mesh.end_station),
        ),
        _ => (0.0, 0.0),
    };

    let fill = |data: &mut TargetData| {
        data.class_name = class_name.clone();
        data.label = surface.display_name.clone();
        data.geometry = geometry;
        data.set_property(START_STATION_PROPERTY, start);
        data.set_property(END_STATION_PROPERTY, end);
        if let Some(feature) = &surface.feature_name {
            data.set_property(FEATURE_PROPERTY, feature.as_str());
        }
    };

    let query = TargetQuery::by_source_ref(Kind::CorridorSurface, &surface.source_id).in_container(container);
    let existing = ctx.store.query(&query)?.into_iter().next();
    let outcome = match existing {
        Some(id) => {
            let mut data = ctx
                .store
                .get_entity(id)?
                .ok_or_else(|| StorageError::NotFound(id.to_string()))?
                .data;
            fill(&mut data);
            ctx.store.update_entity(id, &data)?;
            ctx.report.updated += 1;
            ConversionOutcome::Updated(id)
        }
        None => {
            let mut data = new_target_data(surface, &class_name);
            fill(&mut data);
            let id = ctx.store.create_entity(container, &data)?;
            ctx.report.created += 1;
            ConversionOutcome::Created(id)
        }
    };

    ctx.commit(Kind::CorridorSurface, &surface.source_id, outcome.target_id());
    Ok(outcome)
}
