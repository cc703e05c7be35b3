//! Schema evolution phase: generate, reconcile, publish.

use crate::config::ConversionConfig;
use crate::error::{SyncError, SyncResult};
use roadrail_model::{
    class_name_for_feature, evaluate, DynamicSchemaGenerator, SchemaDecision, SchemaSnapshot, SchemaVersion, SourceGraph,
};
use roadrail_storage::SchemaRepository;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Resolves source feature names to target class names for converters.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    remap: BTreeMap<String, String>,
    classes: BTreeSet<String>,
}

impl SchemaCatalog {
    /// Catalog over the classes of an effective (published or persisted) schema.
    #[must_use]
    pub fn new(config: &ConversionConfig, schema: Option<&SchemaSnapshot>) -> Self {
        Self {
            remap: config.category_remap.clone(),
            classes: schema
                .map(|s| s.classes.keys().cloned().collect())
                .unwrap_or_default(),
        }
    }

    /// Class for a feature: remapped or generated class when the schema has
    /// it, otherwise `base`.
    #[must_use]
    pub fn resolve(&self, feature: Option<&str>, base: &str) -> String {
        let Some(feature) = feature else {
            return base.to_string();
        };
        let class = self
            .remap
            .get(feature)
            .cloned()
            .unwrap_or_else(|| class_name_for_feature(feature));
        if self.classes.contains(&class) {
            class
        } else {
            debug!(feature, class = %class, base, "category not in schema, using base class");
            base.to_string()
        }
    }

    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

/// Result of the schema phase.
#[derive(Debug, Clone)]
pub struct SchemaPhaseOutcome {
    pub catalog: SchemaCatalog,
    /// Version published in this run, if any.
    pub published: Option<SchemaVersion>,
}

/// Runs schema evolution for one feed.
///
/// A publish failure is fatal to the run. When `update_schema` is off the
/// pending update is logged and the persisted schema stays effective.
pub fn run_schema_phase(
    graph: &SourceGraph,
    config: &ConversionConfig,
    repository: &dyn SchemaRepository,
) -> SyncResult<SchemaPhaseOutcome> {
    let snapshot = DynamicSchemaGenerator::new(
        &config.schema_name,
        &config.design_alignment_prefix,
        &config.category_remap,
    )
    .generate(graph);

    let persisted = repository
        .load_persisted(&config.schema_name)
        .map_err(|e| SyncError::Storage(format!("failed to load schema {}: {e}", config.schema_name)))?;

    match evaluate(&snapshot, persisted.as_ref()) {
        SchemaDecision::UpToDate => {
            debug!(schema = %config.schema_name, "schema up to date");
            Ok(SchemaPhaseOutcome {
                catalog: SchemaCatalog::new(config, persisted.as_ref()),
                published: None,
            })
        }
        SchemaDecision::Publish(next) if config.update_schema => {
            repository
                .publish(&next)
                .map_err(|e| SyncError::SchemaPublish(e.to_string()))?;
            info!(schema = %next.name, version = %next.version, classes = next.classes.len(), "schema updated");
            Ok(SchemaPhaseOutcome {
                catalog: SchemaCatalog::new(config, Some(&next)),
                published: Some(next.version),
            })
        }
        SchemaDecision::Publish(next) => {
            info!(
                schema = %next.name,
                pending = %next.version,
                "schema update required but disabled; keeping persisted schema"
            );
            Ok(SchemaPhaseOutcome {
                catalog: SchemaCatalog::new(config, persisted.as_ref()),
                published: None,
            })
        }
    }
}
