//! Conversion engine: the single `convert_road_rail_elements` entry point.
//!
//! A run is sequential: discovery, schema evolution, then the orchestrator
//! phases, extensions and the deletion report. Per-entity failures end up in
//! the [`ConversionReport`]; only discovery, schema publication, store
//! initialization and cancellation abort the run.

use crate::change_detector::ChangeDetector;
use crate::config::ConversionConfig;
use crate::convert::ConversionContext;
use crate::error::{SyncError, SyncResult};
use crate::orchestrator::{Orchestrator, Phase};
use crate::registry::ExtensionRegistry;
use crate::report::{ConversionReport, DeletedEntry};
use crate::schema_phase::run_schema_phase;
use crate::sync_info::SyncInfoStore;
use roadrail_model::{AffineMarshaler, GeometryMarshaler, SourceEntity, SourceGraph, SpatialTransform};
use roadrail_storage::{SchemaRepository, TargetStore};
use roadrail_types::ScopeId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Scope setting holding the last spatial transform used, as JSON.
pub const SPATIAL_TRANSFORM_SETTING: &str = "spatial_transform";

/// Yields the raw source entities of a scope. Called once per run.
pub trait DiscoveryFeed: Send + Sync {
    fn discover(&self, scope: &ScopeId) -> anyhow::Result<Vec<SourceEntity>>;
}

/// A feed returning a fixed entity list, whatever the scope.
#[derive(Debug, Clone, Default)]
pub struct StaticFeed(pub Vec<SourceEntity>);

impl DiscoveryFeed for StaticFeed {
    fn discover(&self, _scope: &ScopeId) -> anyhow::Result<Vec<SourceEntity>> {
        Ok(self.0.clone())
    }
}

/// Cooperative cancellation flag, checked between phases.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Errors with [`SyncError::Cancelled`] if cancellation was requested
    /// before `phase` starts.
    pub fn check(&self, phase: Phase) -> SyncResult<()> {
        if self.is_cancelled() {
            info!(%phase, "conversion cancelled");
            return Err(SyncError::Cancelled(phase));
        }
        Ok(())
    }
}

/// The road/rail converter with its collaborators.
pub struct RoadRailConverter {
    config: ConversionConfig,
    feed: Arc<dyn DiscoveryFeed>,
    targets: Arc<dyn TargetStore>,
    schemas: Arc<dyn SchemaRepository>,
    sync_info: Arc<dyn SyncInfoStore>,
    marshaler: Arc<dyn GeometryMarshaler>,
    extensions: ExtensionRegistry,
    cancellation: Cancellation,
}

impl RoadRailConverter {
    /// Creates a converter using the [`AffineMarshaler`] and no extensions.
    pub fn new(
        config: ConversionConfig,
        feed: Arc<dyn DiscoveryFeed>,
        targets: Arc<dyn TargetStore>,
        schemas: Arc<dyn SchemaRepository>,
        sync_info: Arc<dyn SyncInfoStore>,
    ) -> Self {
        Self {
            config,
            feed,
            targets,
            schemas,
            sync_info,
            marshaler: Arc::new(AffineMarshaler),
            extensions: ExtensionRegistry::new(),
            cancellation: Cancellation::new(),
        }
    }

    #[must_use]
    pub fn with_marshaler(mut self, marshaler: Arc<dyn GeometryMarshaler>) -> Self {
        self.marshaler = marshaler;
        self
    }

    #[must_use]
    pub fn with_extensions(mut self, extensions: ExtensionRegistry) -> Self {
        self.extensions = extensions;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Handle for cancelling a run from another thread.
    #[must_use]
    pub fn cancellation(&self) -> Cancellation {
        self.cancellation.clone()
    }

    /// Runs the full phase sequence for one scope.
    pub fn convert_road_rail_elements(&self, scope: &ScopeId) -> SyncResult<ConversionReport> {
        self.config.validate()?;
        info!(%scope, "road/rail conversion started");

        let feed = self
            .feed
            .discover(scope)
            .map_err(|e| SyncError::Discovery(format!("{e:#}")))?;
        let graph = SourceGraph::from_feed(feed);
        info!(entities = graph.len(), "source feed discovered");

        self.cancellation.check(Phase::Schema)?;
        let schema = run_schema_phase(&graph, &self.config, self.schemas.as_ref())?;

        let transform_changed = self.spatial_transform_changed(scope)?;
        if transform_changed {
            warn!(%scope, "spatial transform changed, all recorded entities will be rewritten");
        }
        let detector = ChangeDetector::new(Arc::clone(&self.sync_info), scope.clone())
            .with_spatial_transform_changed(transform_changed);

        let ctx = ConversionContext::new(
            &graph,
            &self.config,
            self.targets.as_ref(),
            self.marshaler.as_ref(),
            &schema.catalog,
            detector,
        );
        let ctx = Orchestrator::new(ctx, self.cancellation.clone()).run()?;
        let (detector, identity, mut report) = ctx.finish();
        report.schema_published = schema.published;

        report.extension_failures = self.extensions.notify(scope, &identity, self.targets.as_ref());

        report.deleted = detector
            .deleted()?
            .into_iter()
            .filter_map(|(kind, source_id, record)| {
                record.prior_target_id.map(|target_id| DeletedEntry {
                    kind,
                    source_id,
                    target_id,
                })
            })
            .collect();

        self.save_spatial_transform(scope)?;

        let totals = report.totals();
        info!(
            %scope,
            new = totals.new,
            changed = totals.changed,
            unchanged = totals.unchanged,
            created = report.created,
            updated = report.updated,
            failures = report.failures.len(),
            deleted = report.deleted.len(),
            "road/rail conversion finished"
        );
        Ok(report)
    }

    /// True when a transform was recorded for the scope and differs from
    /// the configured one. The first run of a scope has nothing to compare.
    fn spatial_transform_changed(&self, scope: &ScopeId) -> SyncResult<bool> {
        let Some(raw) = self.sync_info.read_setting(scope, SPATIAL_TRANSFORM_SETTING)? else {
            return Ok(false);
        };
        let previous: SpatialTransform = serde_json::from_str(&raw)
            .map_err(|e| SyncError::SyncInfo(format!("invalid recorded spatial transform: {e}")))?;
        Ok(previous != self.config.spatial_transform)
    }

    fn save_spatial_transform(&self, scope: &ScopeId) -> SyncResult<()> {
        let raw = serde_json::to_string(&self.config.spatial_transform)
            .map_err(|e| SyncError::SyncInfo(e.to_string()))?;
        self.sync_info
            .write_setting(scope, SPATIAL_TRANSFORM_SETTING, &raw)
    }
}
