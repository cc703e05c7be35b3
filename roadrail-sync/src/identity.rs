use roadrail_types::{SourceId, TargetId};
use std::collections::BTreeMap;

/// Source id → target id of every alignment converted in this run.
///
/// Written once per alignment, read by corridors, the association pass and
/// extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentIdentityMap {
    entries: BTreeMap<SourceId, TargetId>,
}

impl AlignmentIdentityMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a mapping. The first mapping for a source id wins.
    pub fn insert(&mut self, source_id: SourceId, target_id: TargetId) -> TargetId {
        *self.entries.entry(source_id).or_insert(target_id)
    }

    #[must_use]
    pub fn get(&self, source_id: &SourceId) -> Option<TargetId> {
        self.entries.get(source_id).copied()
    }

    #[must_use]
    pub fn contains(&self, source_id: &SourceId) -> bool {
        self.entries.contains_key(source_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SourceId, TargetId)> {
        self.entries.iter().map(|(s, t)| (s, *t))
    }
}
