mod common;

use common::*;
use pretty_assertions::assert_eq;
use roadrail_model::{
    SchemaClass, SchemaSnapshot, SchemaVersion, SourceEntity, SourceGraph,
    CORRIDOR_COMPONENT_BASE, LINEAR_BASE,
};
use roadrail_storage::{
    DuckSchemaRepository, DuckTargetStore, SchemaRepository, StorageError, StorageResult,
    TargetStore,
};
use roadrail_sync::{
    run_schema_phase, ConversionConfig, RoadRailConverter, SchemaCatalog, SqliteSyncInfoStore,
    StaticFeed, SyncError,
};
use roadrail_types::ScopeId;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Wraps a real repository, counting publishes and optionally failing them.
struct ProbeRepository {
    inner: DuckSchemaRepository,
    publishes: AtomicUsize,
    fail_publish: AtomicBool,
    fail_load: AtomicBool,
}

impl ProbeRepository {
    fn new() -> Self {
        Self {
            inner: DuckSchemaRepository::open_in_memory().unwrap(),
            publishes: AtomicUsize::new(0),
            fail_publish: AtomicBool::new(false),
            fail_load: AtomicBool::new(false),
        }
    }

    fn publishes(&self) -> usize {
        self.publishes.load(Ordering::SeqCst)
    }

    fn persisted(&self) -> SchemaSnapshot {
        self.inner.load_persisted("RoadRailDynamic").unwrap().unwrap()
    }
}

impl SchemaRepository for ProbeRepository {
    fn load_persisted(&self, name: &str) -> StorageResult<Option<SchemaSnapshot>> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(StorageError::InvalidData("corrupt schema row".to_string()));
        }
        self.inner.load_persisted(name)
    }

    fn publish(&self, snapshot: &SchemaSnapshot) -> StorageResult<()> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(StorageError::InvalidData("schema locked".to_string()));
        }
        self.publishes.fetch_add(1, Ordering::SeqCst);
        self.inner.publish(snapshot)
    }
}

fn feed(surfaces: &[&str]) -> SourceGraph {
    let mut entities: Vec<SourceEntity> = vec![
        design_alignment(G1, "Centerline"),
        corridor(G2, G1),
        linear("L1", "Linear\\Edge"),
    ];
    for (i, feature) in surfaces.iter().enumerate() {
        entities.push(corridor_surface(&format!("S{i}"), G2, feature));
    }
    SourceGraph::from_feed(entities)
}

fn version(minor: u32) -> SchemaVersion {
    SchemaVersion {
        minor,
        ..SchemaVersion::default()
    }
}

// ── Evolution ───────────────────────────────────────────────────

#[test]
fn first_run_publishes_generated_classes() {
    let repo = ProbeRepository::new();
    let config = ConversionConfig::default();
    let outcome = run_schema_phase(&feed(&["Mesh\\Top"]), &config, &repo).unwrap();

    assert_eq!(outcome.published, Some(version(0)));
    assert_eq!(repo.publishes(), 1);
    let persisted = repo.persisted();
    let classes: Vec<(&str, &str)> = persisted
        .classes
        .values()
        .map(|c| (c.name.as_str(), c.base_class.as_str()))
        .collect();
    assert_eq!(
        classes,
        vec![("Linear_Edge", LINEAR_BASE), ("Mesh_Top", CORRIDOR_COMPONENT_BASE)]
    );
    assert!(outcome.catalog.contains("Mesh_Top"));
}

#[test]
fn identical_feed_publishes_nothing() {
    let repo = ProbeRepository::new();
    let config = ConversionConfig::default();
    run_schema_phase(&feed(&["Mesh\\Top"]), &config, &repo).unwrap();

    let outcome = run_schema_phase(&feed(&["Mesh\\Top"]), &config, &repo).unwrap();
    assert_eq!(outcome.published, None);
    assert_eq!(repo.publishes(), 1);
    assert!(outcome.catalog.contains("Mesh_Top"));
}

#[test]
fn vanished_category_is_kept_as_sealed_stub() {
    let repo = ProbeRepository::new();
    let config = ConversionConfig::default();
    run_schema_phase(&feed(&["Mesh\\Top", "Mesh\\Base"]), &config, &repo).unwrap();

    let outcome = run_schema_phase(&feed(&["Mesh\\Top"]), &config, &repo).unwrap();
    assert_eq!(outcome.published, Some(version(1)));
    let persisted = repo.persisted();
    assert!(persisted.class("Mesh_Base").unwrap().sealed);
    assert!(!persisted.class("Mesh_Top").unwrap().sealed);

    // Stable once sealed.
    let again = run_schema_phase(&feed(&["Mesh\\Top"]), &config, &repo).unwrap();
    assert_eq!(again.published, None);

    // Reappearing unseals it with another minor bump.
    let back = run_schema_phase(&feed(&["Mesh\\Top", "Mesh\\Base"]), &config, &repo).unwrap();
    assert_eq!(back.published, Some(version(2)));
    assert!(!repo.persisted().class("Mesh_Base").unwrap().sealed);
    assert_eq!(repo.publishes(), 3);
}

#[test]
fn disabled_update_keeps_persisted_catalog() {
    let repo = ProbeRepository::new();
    let config = ConversionConfig::default();
    run_schema_phase(&feed(&["Mesh\\Top"]), &config, &repo).unwrap();

    let frozen = ConversionConfig {
        update_schema: false,
        ..ConversionConfig::default()
    };
    let outcome = run_schema_phase(&feed(&["Mesh\\Top", "Mesh\\Base"]), &frozen, &repo).unwrap();
    assert_eq!(outcome.published, None);
    assert_eq!(repo.publishes(), 1);
    assert!(outcome.catalog.contains("Mesh_Top"));
    assert!(!outcome.catalog.contains("Mesh_Base"));
}

// ── Failures ────────────────────────────────────────────────────

#[test]
fn publish_failure_is_fatal() {
    let repo = ProbeRepository::new();
    repo.fail_publish.store(true, Ordering::SeqCst);
    let err = run_schema_phase(&feed(&["Mesh\\Top"]), &ConversionConfig::default(), &repo)
        .unwrap_err();
    assert!(matches!(err, SyncError::SchemaPublish(ref m) if m.contains("schema locked")));
}

#[test]
fn load_failure_is_a_storage_error() {
    let repo = ProbeRepository::new();
    repo.fail_load.store(true, Ordering::SeqCst);
    let err = run_schema_phase(&feed(&[]), &ConversionConfig::default(), &repo).unwrap_err();
    assert!(matches!(err, SyncError::Storage(_)));
}

#[test]
fn publish_failure_aborts_the_run_before_any_write() {
    let repo = Arc::new(ProbeRepository::new());
    repo.fail_publish.store(true, Ordering::SeqCst);
    let targets = Arc::new(DuckTargetStore::open_in_memory().unwrap());
    let converter = RoadRailConverter::new(
        ConversionConfig::default(),
        Arc::new(StaticFeed(vec![
            design_alignment(G1, "Centerline"),
            corridor(G2, G1),
            corridor_surface("S1", G2, "Mesh\\Top"),
        ])),
        targets.clone(),
        repo,
        Arc::new(SqliteSyncInfoStore::open_in_memory().unwrap()),
    );

    let err = converter.convert_road_rail_elements(&ScopeId::new("site")).unwrap_err();
    assert!(matches!(err, SyncError::SchemaPublish(_)));
    assert_eq!(targets.count().unwrap(), 0);
}

// ── Catalog ─────────────────────────────────────────────────────

#[test]
fn catalog_resolves_remap_then_generated_then_base() {
    let mut config = ConversionConfig::default();
    config
        .category_remap
        .insert("Mesh\\Top".to_string(), "Pavement".to_string());
    let schema = SchemaSnapshot::new("RoadRailDynamic")
        .with_class(SchemaClass::new("Pavement", CORRIDOR_COMPONENT_BASE))
        .with_class(SchemaClass::new("Mesh_Base", CORRIDOR_COMPONENT_BASE));
    let catalog = SchemaCatalog::new(&config, Some(&schema));

    assert_eq!(catalog.resolve(Some("Mesh\\Top"), CORRIDOR_COMPONENT_BASE), "Pavement");
    assert_eq!(catalog.resolve(Some("Mesh\\Base"), CORRIDOR_COMPONENT_BASE), "Mesh_Base");
    assert_eq!(
        catalog.resolve(Some("Mesh\\Unknown"), CORRIDOR_COMPONENT_BASE),
        CORRIDOR_COMPONENT_BASE
    );
    assert_eq!(catalog.resolve(None, LINEAR_BASE), LINEAR_BASE);
}

#[test]
fn catalog_without_schema_always_falls_back() {
    let catalog = SchemaCatalog::new(&ConversionConfig::default(), None);
    assert_eq!(catalog.resolve(Some("Mesh\\Top"), CORRIDOR_COMPONENT_BASE), CORRIDOR_COMPONENT_BASE);
    assert!(!catalog.contains("Mesh_Top"));
}
