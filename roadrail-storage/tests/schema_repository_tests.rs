use pretty_assertions::assert_eq;
use roadrail_model::{SchemaClass, SchemaSnapshot};
use roadrail_storage::{DuckSchemaRepository, DuckTargetStore, SchemaRepository};

fn snapshot() -> SchemaSnapshot {
    SchemaSnapshot::new("RoadRailDynamic")
        .with_class(SchemaClass::new("Mesh_Top", "CorridorComponent"))
        .with_class(SchemaClass::sealed_stub(&SchemaClass::new("Old", "Linear3d")))
}

#[test]
fn nothing_persisted_initially() {
    let repo = DuckSchemaRepository::open_in_memory().unwrap();
    assert!(repo.load_persisted("RoadRailDynamic").unwrap().is_none());
}

#[test]
fn publish_then_load() {
    let repo = DuckSchemaRepository::open_in_memory().unwrap();
    repo.publish(&snapshot()).unwrap();
    assert_eq!(repo.load_persisted("RoadRailDynamic").unwrap(), Some(snapshot()));
    assert!(repo.load_persisted("Other").unwrap().is_none());
}

#[test]
fn republish_replaces() {
    let repo = DuckSchemaRepository::open_in_memory().unwrap();
    repo.publish(&snapshot()).unwrap();

    let mut next = snapshot().with_class(SchemaClass::new("Mesh_Base", "CorridorComponent"));
    next.version.minor += 1;
    repo.publish(&next).unwrap();

    let loaded = repo.load_persisted("RoadRailDynamic").unwrap().unwrap();
    assert_eq!(loaded.version.minor, 1);
    assert!(loaded.contains("Mesh_Base"));
}

#[test]
fn shares_connection_with_target_store() {
    let store = DuckTargetStore::open_in_memory().unwrap();
    let repo = DuckSchemaRepository::open_with_conn(store.connection()).unwrap();
    repo.publish(&snapshot()).unwrap();

    let again = DuckSchemaRepository::open_with_conn(store.connection()).unwrap();
    assert!(again.load_persisted("RoadRailDynamic").unwrap().is_some());
}
