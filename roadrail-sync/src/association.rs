//! Links 3D linears to the corridor that generated them.
//!
//! Both ends are re-resolved through the target store by source reference,
//! since the corridor may have been converted from a different instance of
//! the alignment than the one the linear points at.

use crate::convert::ConversionContext;
use crate::error::{ConvertError, ConvertResult};
use crate::orchestrator::dedup_by_source_id;
use roadrail_model::{Container, CrossRefRole, SourceEntity, TargetQuery};
use roadrail_storage::TargetStore;
use roadrail_types::{Kind, SourceId, TargetId};

/// Target id of the owning corridor, on 3D linears.
pub const CORRIDOR_PROPERTY: &str = "corridor";

/// Runs the association pass, returning how many links were written.
pub fn associate_linears(ctx: &mut ConversionContext<'_>) -> usize {
    let graph = ctx.graph;
    let prefix = ctx.config.design_alignment_prefix.clone();
    let mut linked = 0;

    for linear in dedup_by_source_id(graph.of_kind(Kind::Alignment))
        .into_iter()
        .filter(|a| !a.is_design_alignment(&prefix))
    {
        let Some(corridor) = linear.cross_ref(CrossRefRole::Corridor) else {
            continue;
        };
        match link(ctx.store, linear, corridor) {
            Ok(true) => linked += 1,
            Ok(false) => {}
            Err(e) => ctx.entity_failed(Kind::Alignment, &linear.source_id, &e),
        }
    }

    ctx.report.associated += linked;
    linked
}

fn find_one(store: &dyn TargetStore, kind: Kind, id: &SourceId, container: Container) -> ConvertResult<Option<TargetId>> {
    let query = TargetQuery::by_source_ref(kind, id).in_container(container);
    Ok(store.query(&query)?.into_iter().next())
}

/// Writes the corridor reference when it differs from the stored one.
fn link(store: &dyn TargetStore, linear: &SourceEntity, corridor: &SourceId) -> ConvertResult<bool> {
    // Not converted this run or earlier: nothing to link.
    let Some(linear_id) = find_one(store, Kind::Alignment, &linear.source_id, Container::Linears3d)? else {
        return Ok(false);
    };
    let corridor_id = find_one(store, Kind::Corridor, corridor, Container::Corridors)?.ok_or_else(|| {
        ConvertError::UnresolvedReference {
            kind: Kind::Alignment,
            source_id: linear.source_id.clone(),
            missing: format!("corridor {corridor}"),
        }
    })?;

    let Some(mut target) = store.get_entity(linear_id)? else {
        return Ok(false);
    };
    if !target.data.set_property(CORRIDOR_PROPERTY, corridor_id.value()) {
        return Ok(false);
    }
    store.update_entity(linear_id, &target.data)?;
    Ok(true)
}
