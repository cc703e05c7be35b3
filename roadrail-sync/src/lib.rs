//! Incremental road/rail → BIM synchronization engine.
//!
//! Converts a graph of civil design entities (alignments, vertical profiles,
//! corridors, corridor surfaces) into a persisted target graph, repeatedly
//! and incrementally: unchanged entities are left alone, changed ones are
//! updated in place, new ones are created, and target identity is stable
//! across runs.
//!
//! ## Components
//!
//! - **SyncInfo**: persisted `(scope, kind, source_id) → (target, fingerprint)` records
//! - **Change detector**: classifies entities as new, changed or unchanged
//! - **Converters**: alignments with profiles, corridors with pathway and components
//! - **Orchestrator**: dedup and dependency-ordered phases
//! - **Schema phase**: additive-only evolution of the generated categories
//! - **Engine**: the `convert_road_rail_elements` entry point
//!
//! ## Run
//!
//! 1. **Discovery**: snapshot the source feed into a graph
//! 2. **Schema**: generate, reconcile and publish category classes
//! 3. **Alignments**: design alignments and their profiles
//! 4. **Corridors**: resolved through the alignment identity map
//! 5. **3D linears**: remaining alignments
//! 6. **Association**: link linears to their corridors
//!
//! # Example
//!
//! ```
//! use roadrail_storage::{DuckSchemaRepository, DuckTargetStore};
//! use roadrail_sync::{ConversionConfig, RoadRailConverter, SqliteSyncInfoStore, StaticFeed};
//! use roadrail_types::ScopeId;
//! use std::sync::Arc;
//!
//! let targets = DuckTargetStore::open_in_memory().unwrap();
//! let schemas = DuckSchemaRepository::open_with_conn(targets.connection()).unwrap();
//! let converter = RoadRailConverter::new(
//!     ConversionConfig::default(),
//!     Arc::new(StaticFeed::default()),
//!     Arc::new(targets),
//!     Arc::new(schemas),
//!     Arc::new(SqliteSyncInfoStore::open_in_memory().unwrap()),
//! );
//!
//! let report = converter.convert_road_rail_elements(&ScopeId::new("site")).unwrap();
//! assert_eq!(report.created, 0);
//! ```

mod association;
pub mod change_detector;
pub mod config;
pub mod convert;
mod engine;
mod error;
mod identity;
pub mod orchestrator;
mod registry;
mod report;
pub mod schema_phase;
pub mod sync_info;

pub use association::{associate_linears, CORRIDOR_PROPERTY};
pub use change_detector::{ChangeDetector, ChangeRecord, Classification};
pub use config::{ConversionConfig, UPDATE_SCHEMA_ENV};
pub use convert::{
    convert_alignment, convert_corridor, ConversionContext, ConversionOutcome,
    CorridorClassification,
};
pub use engine::{
    Cancellation, DiscoveryFeed, RoadRailConverter, StaticFeed, SPATIAL_TRANSFORM_SETTING,
};
pub use error::{ConvertError, ConvertResult, FailureClass, SyncError, SyncResult};
pub use identity::AlignmentIdentityMap;
pub use orchestrator::{dedup_by_source_id, Orchestrator, Phase};
pub use registry::{ConversionExtension, ExtensionRegistry};
pub use report::{ConversionReport, DeletedEntry, EntityFailure, KindCounts};
pub use schema_phase::{run_schema_phase, SchemaCatalog, SchemaPhaseOutcome};
pub use sync_info::{SqliteSyncInfoStore, SyncInfoRecord, SyncInfoStore};
