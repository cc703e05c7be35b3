use crate::change_detector::Classification;
use crate::error::{ConvertError, FailureClass};
use roadrail_model::SchemaVersion;
use roadrail_types::{Kind, SourceId, TargetId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Classification counts for one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub new: usize,
    pub changed: usize,
    pub unchanged: usize,
}

/// A per-entity failure, logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityFailure {
    pub kind: Kind,
    pub source_id: SourceId,
    pub class: FailureClass,
    pub message: String,
}

/// A record from an earlier run whose source entity is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedEntry {
    pub kind: Kind,
    pub source_id: SourceId,
    pub target_id: TargetId,
}

/// Summary of one `convert_road_rail_elements` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    pub counts: BTreeMap<Kind, KindCounts>,
    /// Targets created.
    pub created: usize,
    /// Targets updated in place.
    pub updated: usize,
    /// Orphaned targets adopted instead of duplicated.
    pub adopted: usize,
    /// 3D linears linked to their corridor by the association pass.
    pub associated: usize,
    pub skipped_empty: usize,
    pub failures: Vec<EntityFailure>,
    /// Never destroyed here; listed for an external sweep.
    pub deleted: Vec<DeletedEntry>,
    pub schema_published: Option<SchemaVersion>,
    pub extension_failures: Vec<String>,
}

impl ConversionReport {
    #[must_use]
    pub fn counts(&self, kind: Kind) -> KindCounts {
        self.counts.get(&kind).copied().unwrap_or_default()
    }

    /// Sum over all kinds.
    #[must_use]
    pub fn totals(&self) -> KindCounts {
        self.counts.values().fold(KindCounts::default(), |acc, c| KindCounts {
            new: acc.new + c.new,
            changed: acc.changed + c.changed,
            unchanged: acc.unchanged + c.unchanged,
        })
    }

    pub(crate) fn count(&mut self, kind: Kind, classification: Classification) {
        let counts = self.counts.entry(kind).or_default();
        match classification {
            Classification::New => counts.new += 1,
            Classification::Changed => counts.changed += 1,
            Classification::Unchanged => counts.unchanged += 1,
            Classification::Deleted => {}
        }
    }

    pub(crate) fn fail(&mut self, kind: Kind, source_id: &SourceId, err: &ConvertError) {
        self.failures.push(EntityFailure {
            kind,
            source_id: source_id.clone(),
            class: err.class(),
            message: err.to_string(),
        });
    }

    #[must_use]
    pub fn failures_of(&self, class: FailureClass) -> Vec<&EntityFailure> {
        self.failures.iter().filter(|f| f.class == class).collect()
    }
}
