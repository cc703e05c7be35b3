//! Alignment converter: design alignments with their vertical profiles, and
//! 3D linears.

use super::{write_target, ConversionContext, ConversionOutcome};
use crate::error::ConvertResult;
use crate::orchestrator::dedup_by_source_id;
use roadrail_model::{
    approximate_3d, Container, CrossRefRole, GeometryPayload, SourceEntity, SourceItem,
    TargetGeometry, LINEAR_BASE,
};
use roadrail_storage::StorageError;
use roadrail_types::{Kind, TargetId};
use tracing::debug;

pub const DESIGN_ALIGNMENT_CLASS: &str = "DesignAlignment";
pub const VERTICAL_PROFILE_CLASS: &str = "VerticalProfile";
/// Target id of the active vertical profile, on design alignments.
pub const ACTIVE_PROFILE_PROPERTY: &str = "active_profile";
/// Approximate 3D polyline derived from the active profile.
pub const APPROX_3D_PROPERTY: &str = "approx_3d";

/// Converts one alignment.
///
/// Design alignments land in [`Container::DesignAlignments`] and bring their
/// vertical profiles along; everything else is a 3D linear. Profile failures
/// are recorded against the profile and do not fail the alignment.
pub fn convert_alignment(
    ctx: &mut ConversionContext<'_>,
    entity: &SourceEntity,
) -> ConvertResult<ConversionOutcome> {
    let graph = ctx.graph;
    let design = entity.is_design_alignment(&ctx.config.design_alignment_prefix);
    let (container, class_name) = if design {
        (Container::DesignAlignments, DESIGN_ALIGNMENT_CLASS.to_string())
    } else {
        (
            Container::Linears3d,
            ctx.catalog.resolve(entity.feature_name.as_deref(), LINEAR_BASE),
        )
    };

    let record = ctx.detector.detect(&SourceItem::new(entity, graph))?;
    let marshaler = ctx.marshaler;
    let transform = ctx.config.spatial_transform;
    let outcome = write_target(ctx, container, entity, &class_name, record, |data| {
        data.class_name = class_name.clone();
        data.label = entity.display_name.clone();
        data.geometry = marshaler.marshal(&entity.payload, &transform)?;
        Ok(())
    })?;

    if design {
        sync_profiles(ctx, entity, outcome);
    }
    Ok(outcome)
}

fn sync_profiles(ctx: &mut ConversionContext<'_>, alignment: &SourceEntity, outcome: ConversionOutcome) {
    let graph = ctx.graph;
    let alignment_id = outcome.target_id();
    let active_ref = alignment.cross_ref(CrossRefRole::ActiveProfile);

    let mut active = None;
    for profile in dedup_by_source_id(graph.children(&alignment.source_id, Kind::VerticalAlignment)) {
        match convert_profile(ctx, profile, alignment_id) {
            Ok(p) if active_ref == Some(&profile.source_id) => active = Some(p),
            Ok(_) => {}
            Err(e) => ctx.entity_failed(Kind::VerticalAlignment, &profile.source_id, &e),
        }
    }

    if let Some(profile) = active
        && let Err(e) = refresh_active_profile(ctx, alignment, outcome, profile)
    {
        ctx.entity_failed(Kind::Alignment, &alignment.source_id, &e);
    }
}

fn convert_profile(
    ctx: &mut ConversionContext<'_>,
    profile: &SourceEntity,
    alignment_id: TargetId,
) -> ConvertResult<ConversionOutcome> {
    let record = ctx.detector.detect(&SourceItem::new(profile, ctx.graph))?;
    let marshaler = ctx.marshaler;
    let transform = ctx.config.spatial_transform;
    write_target(
        ctx,
        Container::Profiles(alignment_id),
        profile,
        VERTICAL_PROFILE_CLASS,
        record,
        |data| {
            data.label = profile.display_name.clone();
            data.geometry = marshaler.marshal(&profile.payload, &transform)?;
            Ok(())
        },
    )
}

/// Points the alignment at its active profile and regenerates the
/// approximate 3D representation when the alignment, the profile or the
/// reference changed. Writes nothing otherwise.
fn refresh_active_profile(
    ctx: &mut ConversionContext<'_>,
    alignment: &SourceEntity,
    alignment_outcome: ConversionOutcome,
    profile_outcome: ConversionOutcome,
) -> ConvertResult<()> {
    let alignment_id = alignment_outcome.target_id();
    let profile_id = profile_outcome.target_id();
    let mut target = ctx
        .store
        .get_entity(alignment_id)?
        .ok_or_else(|| StorageError::NotFound(alignment_id.to_string()))?;

    let mut dirty = target
        .data
        .set_property(ACTIVE_PROFILE_PROPERTY, profile_id.value());
    let stale = dirty
        || alignment_outcome.wrote()
        || profile_outcome.wrote()
        || !target.data.properties.contains_key(APPROX_3D_PROPERTY);

    if stale {
        let profile = ctx
            .store
            .get_entity(profile_id)?
            .ok_or_else(|| StorageError::NotFound(profile_id.to_string()))?;
        let start_station = match &alignment.payload {
            GeometryPayload::Horizontal(h) => ctx.config.spatial_transform.apply_length(h.start_station),
            _ => 0.0,
        };
        if let (TargetGeometry::Polyline { points }, TargetGeometry::Profile { points: elevations }) =
            (&target.data.geometry, &profile.data.geometry)
        {
            let approx = approximate_3d(points, start_station, elevations);
            let value = serde_json::to_value(approx).map_err(StorageError::from)?;
            dirty |= target.data.set_property(APPROX_3D_PROPERTY, value);
        }
    }

    if dirty {
        ctx.store.update_entity(alignment_id, &target.data)?;
        if !alignment_outcome.wrote() {
            ctx.report.updated += 1;
        }
        debug!(source_id = %alignment.source_id, %profile_id, "active profile refreshed");
    }
    Ok(())
}

