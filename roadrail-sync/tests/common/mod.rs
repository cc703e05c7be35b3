#![allow(dead_code)]

use roadrail_model::{
    Container, CorridorHeader, CrossRefRole, GeometryPayload, HorizontalGeometry,
    HorizontalSegment, Point3, ProfilePoint, SourceEntity, SurfaceMesh, TargetEntity,
    VerticalGeometry,
};
use roadrail_storage::{DuckSchemaRepository, DuckTargetStore, TargetStore};
use roadrail_sync::{
    ConversionConfig, ConversionReport, ExtensionRegistry, RoadRailConverter,
    SqliteSyncInfoStore, StaticFeed, SyncResult,
};
use roadrail_types::{Kind, ScopeId};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Routes engine logs to the test writer; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub const G1: &str = "{6F9619FF-8B86-D011-B42D-00C04FC964FF}";
pub const G2: &str = "{0B0C6B2E-3F0A-4E6B-9E57-2B8C5D2A1F01}";
pub const G3: &str = "{5C2D7A10-9A41-4C7D-8D8B-0E3B7C5F9A22}";

pub fn line(length: f64) -> GeometryPayload {
    GeometryPayload::Horizontal(HorizontalGeometry {
        start_station: 0.0,
        segments: vec![HorizontalSegment::line(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(length, 0.0, 0.0),
        )],
    })
}

pub fn profile(start_elevation: f64, end_elevation: f64) -> GeometryPayload {
    GeometryPayload::Vertical(VerticalGeometry {
        points: vec![
            ProfilePoint::new(0.0, start_elevation),
            ProfilePoint::new(100.0, end_elevation),
        ],
    })
}

pub fn surface(end_station: f64) -> GeometryPayload {
    GeometryPayload::Surface(SurfaceMesh {
        start_station: 0.0,
        end_station,
        vertices: vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(end_station, 0.0, 0.0),
            Point3::new(0.0, 5.0, 0.0),
        ],
        triangles: vec![[0, 1, 2]],
    })
}

pub fn design_alignment(id: &str, name: &str) -> SourceEntity {
    SourceEntity::new(Kind::Alignment, id, name)
        .with_feature("Alignment\\Road\\Centerline")
        .with_payload(line(100.0))
}

pub fn linear(id: &str, feature: &str) -> SourceEntity {
    SourceEntity::new(Kind::Alignment, id, "Edge")
        .with_feature(feature)
        .with_payload(line(100.0))
}

pub fn vertical(id: &str, alignment: &str, start: f64, end: f64) -> SourceEntity {
    SourceEntity::new(Kind::VerticalAlignment, id, format!("Profile {id}"))
        .with_parent(alignment)
        .with_payload(profile(start, end))
}

pub fn corridor(id: &str, alignment: &str) -> SourceEntity {
    SourceEntity::new(Kind::Corridor, id, "Main Road")
        .with_cross_ref(CrossRefRole::Alignment, alignment)
        .with_payload(GeometryPayload::Corridor(CorridorHeader {
            has_cant: false,
            has_superelevation: true,
        }))
}

pub fn corridor_surface(id: &str, corridor: &str, feature: &str) -> SourceEntity {
    SourceEntity::new(Kind::CorridorSurface, id, feature)
        .with_parent(corridor)
        .with_feature(feature)
        .with_payload(surface(100.0))
}

/// Stores shared across runs, as a real deployment keeps them.
pub struct Harness {
    pub targets: Arc<DuckTargetStore>,
    pub schemas: Arc<DuckSchemaRepository>,
    pub sync_info: Arc<SqliteSyncInfoStore>,
    pub config: ConversionConfig,
    pub scope: ScopeId,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        let targets = DuckTargetStore::open_in_memory().unwrap();
        let schemas = DuckSchemaRepository::open_with_conn(targets.connection()).unwrap();
        Self {
            targets: Arc::new(targets),
            schemas: Arc::new(schemas),
            sync_info: Arc::new(SqliteSyncInfoStore::open_in_memory().unwrap()),
            config: ConversionConfig::default(),
            scope: ScopeId::new("site"),
        }
    }

    pub fn converter(&self, feed: Vec<SourceEntity>) -> RoadRailConverter {
        RoadRailConverter::new(
            self.config.clone(),
            Arc::new(StaticFeed(feed)),
            self.targets.clone(),
            self.schemas.clone(),
            self.sync_info.clone(),
        )
    }

    pub fn try_run(&self, feed: Vec<SourceEntity>) -> SyncResult<ConversionReport> {
        self.converter(feed).convert_road_rail_elements(&self.scope)
    }

    pub fn run(&self, feed: Vec<SourceEntity>) -> ConversionReport {
        self.try_run(feed).unwrap()
    }

    pub fn run_with(&self, feed: Vec<SourceEntity>, extensions: ExtensionRegistry) -> ConversionReport {
        self.converter(feed)
            .with_extensions(extensions)
            .convert_road_rail_elements(&self.scope)
            .unwrap()
    }

    pub fn count(&self) -> usize {
        self.targets.count().unwrap()
    }

    /// The target with `code` in `container`.
    pub fn target(&self, container: Container, code: &str) -> TargetEntity {
        let id = self
            .targets
            .find_by_code(container, code)
            .unwrap()
            .unwrap_or_else(|| panic!("no target {code} in {container}"));
        self.targets.get_entity(id).unwrap().unwrap()
    }

    pub fn find(&self, container: Container, code: &str) -> Option<TargetEntity> {
        self.targets
            .find_by_code(container, code)
            .unwrap()
            .map(|id| self.targets.get_entity(id).unwrap().unwrap())
    }
}
