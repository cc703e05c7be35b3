//! Entity converters and the state they share during one run.
//!
//! Converters are plain functions over a [`ConversionContext`]. A converter
//! failure aborts only the entity at hand: the caller logs it, records it in
//! the run report and moves on.

mod alignment;
mod corridor;

pub use alignment::{
    convert_alignment, ACTIVE_PROFILE_PROPERTY, APPROX_3D_PROPERTY, DESIGN_ALIGNMENT_CLASS,
    VERTICAL_PROFILE_CLASS,
};
pub use corridor::{
    convert_corridor, CorridorClassification, ALIGNMENT_PROPERTY, CLASSIFICATION_PROPERTY,
    CORRIDOR_CLASS, END_STATION_PROPERTY, FEATURE_PROPERTY, START_STATION_PROPERTY,
};

use crate::change_detector::{ChangeDetector, ChangeRecord, Classification};
use crate::config::ConversionConfig;
use crate::error::{ConvertError, ConvertResult};
use crate::identity::AlignmentIdentityMap;
use crate::report::ConversionReport;
use crate::schema_phase::SchemaCatalog;
use roadrail_model::{Container, GeometryMarshaler, SourceEntity, SourceGraph, TargetData};
use roadrail_storage::TargetStore;
use roadrail_types::{Kind, SourceId, TargetId};
use tracing::{debug, error, warn};

/// What a converter did with its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionOutcome {
    Created(TargetId),
    Updated(TargetId),
    /// An existing target without a SyncInfo record was taken over.
    Adopted(TargetId),
    Unchanged(TargetId),
}

impl ConversionOutcome {
    #[must_use]
    pub fn target_id(&self) -> TargetId {
        match *self {
            ConversionOutcome::Created(id)
            | ConversionOutcome::Updated(id)
            | ConversionOutcome::Adopted(id)
            | ConversionOutcome::Unchanged(id) => id,
        }
    }

    /// True when the target content was written in this run.
    #[must_use]
    pub fn wrote(&self) -> bool {
        !matches!(self, ConversionOutcome::Unchanged(_))
    }
}

/// Everything a converter reads or mutates during one run.
pub struct ConversionContext<'a> {
    pub(crate) graph: &'a SourceGraph,
    pub(crate) config: &'a ConversionConfig,
    pub(crate) store: &'a dyn TargetStore,
    pub(crate) marshaler: &'a dyn GeometryMarshaler,
    pub(crate) catalog: &'a SchemaCatalog,
    pub(crate) detector: ChangeDetector,
    pub(crate) identity: AlignmentIdentityMap,
    pub(crate) report: ConversionReport,
}

impl<'a> ConversionContext<'a> {
    pub fn new(
        graph: &'a SourceGraph,
        config: &'a ConversionConfig,
        store: &'a dyn TargetStore,
        marshaler: &'a dyn GeometryMarshaler,
        catalog: &'a SchemaCatalog,
        detector: ChangeDetector,
    ) -> Self {
        Self {
            graph,
            config,
            store,
            marshaler,
            catalog,
            detector,
            identity: AlignmentIdentityMap::new(),
            report: ConversionReport::default(),
        }
    }

    #[must_use]
    pub fn identity(&self) -> &AlignmentIdentityMap {
        &self.identity
    }

    #[must_use]
    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    #[must_use]
    pub fn report(&self) -> &ConversionReport {
        &self.report
    }

    /// Consumes the context, folding classification counts into the report.
    pub fn finish(mut self) -> (ChangeDetector, AlignmentIdentityMap, ConversionReport) {
        for (kind, classifications) in self.detector.classifications() {
            for c in classifications {
                self.report.count(kind, c);
            }
        }
        (self.detector, self.identity, self.report)
    }

    /// Logs a per-entity failure at the level its class calls for and
    /// records it. Empty geometry is counted as a skip.
    pub(crate) fn entity_failed(&mut self, kind: Kind, source_id: &SourceId, err: &ConvertError) {
        match err {
            ConvertError::EmptyGeometry { .. } => {
                debug!(%kind, %source_id, "nothing to convert");
                self.report.skipped_empty += 1;
                return;
            }
            ConvertError::UnresolvedReference { .. } => warn!(%kind, %source_id, "skipped: {err}"),
            _ => error!(%kind, %source_id, "conversion failed: {err}"),
        }
        self.report.fail(kind, source_id, err);
    }

    /// Reports a converted target back to the change detector. A SyncInfo
    /// write failure is logged and recorded but does not invalidate the
    /// target for dependents.
    pub(crate) fn commit(&mut self, kind: Kind, source_id: &SourceId, target_id: TargetId) {
        if let Err(e) = self.detector.record_conversion(kind, source_id, target_id) {
            self.report.fail(kind, source_id, &e);
        }
    }

    fn count_write(&mut self, outcome: ConversionOutcome) {
        match outcome {
            ConversionOutcome::Created(_) => self.report.created += 1,
            ConversionOutcome::Updated(_) => self.report.updated += 1,
            ConversionOutcome::Adopted(_) => self.report.adopted += 1,
            ConversionOutcome::Unchanged(_) => {}
        }
    }
}

/// Writes the target of one classified entity and commits its SyncInfo.
///
/// `fill` runs only when something is written, on fresh data for a create
/// or on the stored data for an update, so attributes it does not touch
/// survive. `Unchanged` records write nothing.
pub(crate) fn write_target(
    ctx: &mut ConversionContext<'_>,
    container: Container,
    entity: &SourceEntity,
    class_name: &str,
    record: ChangeRecord,
    fill: impl FnOnce(&mut TargetData) -> ConvertResult<()>,
) -> ConvertResult<ConversionOutcome> {
    let outcome = match (record.classification, record.prior_target_id) {
        (Classification::Unchanged, Some(id)) => return Ok(ConversionOutcome::Unchanged(id)),
        (Classification::Changed, Some(id)) => match ctx.store.get_entity(id)? {
            Some(existing) => {
                let mut data = existing.data;
                fill(&mut data)?;
                ctx.store.update_entity(id, &data)?;
                ConversionOutcome::Updated(id)
            }
            None => {
                warn!(kind = %entity.kind, source_id = %entity.source_id, target_id = %id, "recorded target is gone, recreating");
                create_or_adopt(ctx, container, entity, class_name, fill)?
            }
        },
        _ => create_or_adopt(ctx, container, entity, class_name, fill)?,
    };

    ctx.count_write(outcome);
    ctx.commit(entity.kind, &entity.source_id, outcome.target_id());
    Ok(outcome)
}

/// Creates a target, unless one with the same code already exists in the
/// container: that is a target written by an earlier run whose SyncInfo
/// record was lost, and it is adopted instead of duplicated.
fn create_or_adopt(
    ctx: &mut ConversionContext<'_>,
    container: Container,
    entity: &SourceEntity,
    class_name: &str,
    fill: impl FnOnce(&mut TargetData) -> ConvertResult<()>,
) -> ConvertResult<ConversionOutcome> {
    if let Some(id) = ctx.store.find_by_code(container, entity.source_id.as_str())?
        && let Some(existing) = ctx.store.get_entity(id)?
    {
        warn!(
            kind = %entity.kind,
            source_id = %entity.source_id,
            target_id = %id,
            "adopting existing target with no sync info record"
        );
        let mut data = existing.data;
        fill(&mut data)?;
        ctx.store.update_entity(id, &data)?;
        return Ok(ConversionOutcome::Adopted(id));
    }

    let mut data = new_target_data(entity, class_name);
    fill(&mut data)?;
    let id = ctx.store.create_entity(container, &data)?;
    debug!(kind = %entity.kind, source_id = %entity.source_id, target_id = %id, %container, "created");
    Ok(ConversionOutcome::Created(id))
}

/// Fresh target data: code is the source id, label the display name.
pub(crate) fn new_target_data(entity: &SourceEntity, class_name: &str) -> TargetData {
    TargetData::new(class_name, entity.source_id.as_str(), &entity.display_name)
        .with_stable_id(entity.source_id.stable_identifier())
        .with_source_ref(entity.kind, &entity.source_id)
}
