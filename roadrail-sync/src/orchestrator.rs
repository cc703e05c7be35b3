//! Conversion orchestrator: dedup and dependency-ordered phases.
//!
//! Phases run strictly in order: design alignments, corridors, remaining
//! 3D linears, association. Each phase completes (and commits its targets
//! to the identity map) before the next starts. Cancellation is checked
//! between phases only.

use crate::association::associate_linears;
use crate::convert::{convert_alignment, convert_corridor, ConversionContext};
use crate::engine::Cancellation;
use crate::error::SyncResult;
use roadrail_model::SourceEntity;
use roadrail_types::Kind;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Top-level phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Schema,
    Alignments,
    Corridors,
    Linears,
    Association,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Schema => "schema",
            Phase::Alignments => "alignment",
            Phase::Corridors => "corridor",
            Phase::Linears => "3D linear",
            Phase::Association => "association",
        })
    }
}

/// Keeps one entity per source id.
///
/// Entities are sorted by `(source_id, display_name)` and adjacent
/// duplicates dropped, so the survivor is the lexicographically first name
/// whatever the feed order was.
pub fn dedup_by_source_id<'g, I>(entities: I) -> Vec<&'g SourceEntity>
where
    I: IntoIterator<Item = &'g SourceEntity>,
{
    let mut sorted: Vec<&SourceEntity> = entities.into_iter().collect();
    sorted.sort_by(|a, b| {
        a.source_id
            .cmp(&b.source_id)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
    sorted.dedup_by(|later, kept| later.source_id == kept.source_id);
    sorted
}

/// Drives the converters over one source graph.
pub struct Orchestrator<'a> {
    ctx: ConversionContext<'a>,
    cancellation: Cancellation,
}

impl<'a> Orchestrator<'a> {
    pub fn new(ctx: ConversionContext<'a>, cancellation: Cancellation) -> Self {
        Self { ctx, cancellation }
    }

    #[must_use]
    pub fn context(&self) -> &ConversionContext<'a> {
        &self.ctx
    }

    #[must_use]
    pub fn into_context(self) -> ConversionContext<'a> {
        self.ctx
    }

    /// Runs every conversion phase in order.
    pub fn run(mut self) -> SyncResult<ConversionContext<'a>> {
        self.cancellation.check(Phase::Alignments)?;
        self.convert_design_alignments();

        self.cancellation.check(Phase::Corridors)?;
        self.convert_corridors();

        self.cancellation.check(Phase::Linears)?;
        self.convert_linears();

        self.cancellation.check(Phase::Association)?;
        self.associate();

        Ok(self.ctx)
    }

    fn alignments(&self) -> Vec<&'a SourceEntity> {
        let graph = self.ctx.graph;
        dedup_by_source_id(graph.of_kind(Kind::Alignment))
    }

    /// Phase 1: design alignments, recorded in the identity map.
    pub fn convert_design_alignments(&mut self) {
        let prefix = self.ctx.config.design_alignment_prefix.as_str();
        let design: Vec<_> = self
            .alignments()
            .into_iter()
            .filter(|a| a.is_design_alignment(prefix))
            .collect();
        info!(count = design.len(), "converting design alignments");
        self.convert_alignments(design);
    }

    /// Phase 2: corridors, resolving alignments through the identity map.
    pub fn convert_corridors(&mut self) {
        let graph = self.ctx.graph;
        let corridors = dedup_by_source_id(graph.of_kind(Kind::Corridor));
        info!(count = corridors.len(), "converting corridors");
        for corridor in corridors {
            if let Err(e) = convert_corridor(&mut self.ctx, corridor) {
                self.ctx.entity_failed(Kind::Corridor, &corridor.source_id, &e);
            }
        }
    }

    /// Phase 3: alignments not mapped by phase 1.
    pub fn convert_linears(&mut self) {
        let linears: Vec<_> = self
            .alignments()
            .into_iter()
            .filter(|a| !self.ctx.identity.contains(&a.source_id))
            .collect();
        info!(count = linears.len(), "converting 3D linears");
        self.convert_alignments(linears);
    }

    /// Phase 4: link 3D linears to their corridors.
    pub fn associate(&mut self) {
        let linked = associate_linears(&mut self.ctx);
        info!(linked, "association pass complete");
    }

    fn convert_alignments(&mut self, alignments: Vec<&'a SourceEntity>) {
        for alignment in alignments {
            match convert_alignment(&mut self.ctx, alignment) {
                Ok(outcome) => {
                    self.ctx
                        .identity
                        .insert(alignment.source_id.clone(), outcome.target_id());
                }
                Err(e) => self.ctx.entity_failed(Kind::Alignment, &alignment.source_id, &e),
            }
        }
    }
}
