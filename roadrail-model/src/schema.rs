//! Schema snapshots and the class-level schema comparer.
//!
//! Evolution is additive only: a class that the source stops producing is
//! kept as a sealed stub so that previously persisted instances stay valid.
//! Every function here is pure; the persisted schema is never mutated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One generated category class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaClass {
    pub name: String,
    pub base_class: String,
    #[serde(default)]
    pub sealed: bool,
}

impl SchemaClass {
    pub fn new(name: impl Into<String>, base_class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_class: base_class.into(),
            sealed: false,
        }
    }

    /// A non-extensible stub retained for a category that is no longer produced.
    #[must_use]
    pub fn sealed_stub(of: &SchemaClass) -> Self {
        Self {
            name: of.name.clone(),
            base_class: of.base_class.clone(),
            sealed: true,
        }
    }
}

/// `read.write.minor` schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub read: u32,
    pub write: u32,
    pub minor: u32,
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self {
            read: 1,
            write: 0,
            minor: 0,
        }
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}.{:02}.{:02}", self.read, self.write, self.minor)
    }
}

/// In-memory schema description, rebuilt from the source feed every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub name: String,
    #[serde(default)]
    pub version: SchemaVersion,
    #[serde(default)]
    pub classes: BTreeMap<String, SchemaClass>,
}

impl SchemaSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: SchemaVersion::default(),
            classes: BTreeMap::new(),
        }
    }

    /// Adds a class, replacing any class with the same name.
    pub fn add_class(&mut self, class: SchemaClass) {
        self.classes.insert(class.name.clone(), class);
    }

    #[must_use]
    pub fn with_class(mut self, class: SchemaClass) -> Self {
        self.add_class(class);
        self
    }

    #[must_use]
    pub fn class(&self, name: &str) -> Option<&SchemaClass> {
        self.classes.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }
}

/// A class-level difference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassChange {
    /// Present in the new snapshot only.
    Added(String),
    /// Present in the persisted schema only.
    Removed(String),
    /// Present in both with a different class modifier (sealed flag).
    Modifier(String),
}

/// Class-level differences between a snapshot and the persisted schema.
/// Property-level and base-class changes are intentionally not represented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiff {
    pub changes: Vec<ClassChange>,
}

impl SchemaDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn added(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().filter_map(|c| match c {
            ClassChange::Added(n) => Some(n.as_str()),
            _ => None,
        })
    }

    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().filter_map(|c| match c {
            ClassChange::Removed(n) => Some(n.as_str()),
            _ => None,
        })
    }
}

/// Class-level structural diff: additions, then removals, then modifier
/// changes, each ordered by class name.
#[must_use]
pub fn diff(snapshot: &SchemaSnapshot, persisted: &SchemaSnapshot) -> SchemaDiff {
    let mut changes: Vec<ClassChange> = snapshot
        .classes
        .keys()
        .filter(|name| !persisted.contains(name))
        .map(|name| ClassChange::Added(name.clone()))
        .collect();
    changes.extend(
        persisted
            .classes
            .keys()
            .filter(|name| !snapshot.contains(name))
            .map(|name| ClassChange::Removed(name.clone())),
    );
    changes.extend(snapshot.classes.values().filter_map(|class| {
        persisted
            .class(&class.name)
            .filter(|old| old.sealed != class.sealed)
            .map(|_| ClassChange::Modifier(class.name.clone()))
    }));
    SchemaDiff { changes }
}

/// Returns a new snapshot that keeps every persisted class.
///
/// Classes missing from `snapshot` are re-added as sealed stubs sharing the
/// persisted base class. The version is the persisted version, with the minor
/// component incremented by one when the result differs from `persisted`.
#[must_use]
pub fn reconcile(snapshot: &SchemaSnapshot, persisted: &SchemaSnapshot) -> SchemaSnapshot {
    let mut out = snapshot.clone();
    for class in persisted.classes.values() {
        if !out.contains(&class.name) {
            out.add_class(SchemaClass::sealed_stub(class));
        }
    }

    out.version = persisted.version;
    if !diff(&out, persisted).is_empty() {
        out.version.minor += 1;
    }
    out
}

/// Outcome of comparing a fresh snapshot with the persisted schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDecision {
    /// Nothing to publish.
    UpToDate,
    /// Publish this reconciled snapshot.
    Publish(SchemaSnapshot),
}

/// Decides whether and what to publish.
#[must_use]
pub fn evaluate(snapshot: &SchemaSnapshot, persisted: Option<&SchemaSnapshot>) -> SchemaDecision {
    let Some(persisted) = persisted else {
        return SchemaDecision::Publish(snapshot.clone());
    };

    let reconciled = reconcile(snapshot, persisted);
    if diff(&reconciled, persisted).is_empty() {
        SchemaDecision::UpToDate
    } else {
        SchemaDecision::Publish(reconciled)
    }
}

/// True when a schema publish is needed.
#[must_use]
pub fn requires_update(snapshot: &SchemaSnapshot, persisted: Option<&SchemaSnapshot>) -> bool {
    matches!(evaluate(snapshot, persisted), SchemaDecision::Publish(_))
}
