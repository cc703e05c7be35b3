//! Per-entity change classification against previously recorded state.
//!
//! Every entity is classified at most once per run; repeated calls return
//! the cached record. The detector is the only writer of SyncInfo records.

use crate::error::{ConvertError, ConvertResult, SyncResult};
use crate::sync_info::{SyncInfoRecord, SyncInfoStore};
use roadrail_model::FingerprintSource;
use roadrail_types::{Fingerprint, Kind, ScopeId, SourceId, TargetId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error};

/// How a source entity relates to what the previous run recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    New,
    Changed,
    Unchanged,
    /// Recorded by an earlier run but not seen in this one.
    Deleted,
}

/// Classification plus the previously recorded target, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub classification: Classification,
    pub prior_target_id: Option<TargetId>,
}

impl ChangeRecord {
    #[must_use]
    pub fn needs_write(&self) -> bool {
        matches!(
            self.classification,
            Classification::New | Classification::Changed
        )
    }
}

type Key = (Kind, SourceId);

struct Detected {
    record: ChangeRecord,
    fingerprint: Fingerprint,
}

/// Classifies entities of one scope and persists their SyncInfo records.
pub struct ChangeDetector {
    store: Arc<dyn SyncInfoStore>,
    scope: ScopeId,
    spatial_transform_changed: bool,
    detected: HashMap<Key, Detected>,
    written: HashSet<Key>,
    seen: HashSet<Key>,
}

impl ChangeDetector {
    pub fn new(store: Arc<dyn SyncInfoStore>, scope: ScopeId) -> Self {
        Self {
            store,
            scope,
            spatial_transform_changed: false,
            detected: HashMap::new(),
            written: HashSet::new(),
            seen: HashSet::new(),
        }
    }

    /// Forces every previously recorded entity to [`Classification::Changed`].
    #[must_use]
    pub fn with_spatial_transform_changed(mut self, changed: bool) -> Self {
        self.spatial_transform_changed = changed;
        self
    }

    #[must_use]
    pub fn scope(&self) -> &ScopeId {
        &self.scope
    }

    /// Classifies `item`, marking it seen.
    ///
    /// Fails with [`ConvertError::EmptyGeometry`] when the item has nothing
    /// to convert; the entity is still marked seen so that its earlier
    /// target is not reported as deleted.
    pub fn detect(&mut self, item: &dyn FingerprintSource) -> ConvertResult<ChangeRecord> {
        let key = (item.kind(), item.id().clone());
        self.seen.insert(key.clone());
        if let Some(d) = self.detected.get(&key) {
            return Ok(d.record);
        }

        let fingerprint = item.fingerprint()?;
        let prior = self
            .store
            .find(&self.scope, key.0, &key.1)
            .map_err(|e| ConvertError::SyncLookup(e.to_string()))?;

        let record = match prior {
            None => ChangeRecord {
                classification: Classification::New,
                prior_target_id: None,
            },
            Some(prior) => {
                let classification = if self.spatial_transform_changed
                    || !prior.fingerprint.same_content(&fingerprint)
                {
                    Classification::Changed
                } else {
                    Classification::Unchanged
                };
                ChangeRecord {
                    classification,
                    prior_target_id: Some(prior.target_id),
                }
            }
        };

        debug!(kind = %key.0, source_id = %key.1, classification = ?record.classification, "classified");
        self.detected.insert(key, Detected { record, fingerprint });
        Ok(record)
    }

    /// Marks an entity seen without classifying it.
    pub fn mark_seen(&mut self, kind: Kind, source_id: &SourceId) {
        self.seen.insert((kind, source_id.clone()));
    }

    #[must_use]
    pub fn is_seen(&self, kind: Kind, source_id: &SourceId) -> bool {
        self.seen.contains(&(kind, source_id.clone()))
    }

    /// The record produced for an entity in this run, if classified.
    #[must_use]
    pub fn record(&self, kind: Kind, source_id: &SourceId) -> Option<ChangeRecord> {
        self.detected
            .get(&(kind, source_id.clone()))
            .map(|d| d.record)
    }

    /// Persists the SyncInfo record after a successful New/Changed conversion.
    ///
    /// At most one write per entity per run: a second report is ignored.
    pub fn record_conversion(&mut self, kind: Kind, source_id: &SourceId, target_id: TargetId) -> ConvertResult<()> {
        let key = (kind, source_id.clone());
        if self.written.contains(&key) {
            debug!(%kind, %source_id, "sync info already written this run");
            return Ok(());
        }
        let detected = self.detected.get(&key).ok_or_else(|| {
            ConvertError::SyncWrite(format!("{kind} {source_id} was never classified"))
        })?;

        let record = SyncInfoRecord {
            scope: self.scope.clone(),
            kind,
            source_id: source_id.clone(),
            target_id,
            fingerprint: detected.fingerprint.clone(),
        };
        self.store.write(&record).map_err(|e| {
            error!(%kind, %source_id, %target_id, "failed to write sync info: {e}");
            ConvertError::SyncWrite(e.to_string())
        })?;
        self.written.insert(key);
        Ok(())
    }

    /// Classification counts per kind for everything classified this run.
    #[must_use]
    pub fn classifications(&self) -> BTreeMap<Kind, Vec<Classification>> {
        let mut out: BTreeMap<Kind, Vec<Classification>> = BTreeMap::new();
        for ((kind, _), d) in &self.detected {
            out.entry(*kind).or_default().push(d.record.classification);
        }
        out
    }

    /// Records of this scope that were not seen this run, as `Deleted`.
    pub fn deleted(&self) -> SyncResult<Vec<(Kind, SourceId, ChangeRecord)>> {
        Ok(self
            .store
            .list_scope(&self.scope)?
            .into_iter()
            .filter(|r| !self.seen.contains(&(r.kind, r.source_id.clone())))
            .map(|r| {
                let record = ChangeRecord {
                    classification: Classification::Deleted,
                    prior_target_id: Some(r.target_id),
                };
                (r.kind, r.source_id, record)
            })
            .collect())
    }
}
