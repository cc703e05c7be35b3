//! Conversion configuration.
//!
//! Loaded from TOML, with `ROADRAIL_UPDATE_SCHEMA` able to switch schema
//! publishing off for a single run.

use crate::error::{SyncError, SyncResult};
use roadrail_model::SpatialTransform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Environment variable overriding [`ConversionConfig::update_schema`].
pub const UPDATE_SCHEMA_ENV: &str = "ROADRAIL_UPDATE_SCHEMA";

/// Configuration for one converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Feature path prefix identifying design alignments.
    pub design_alignment_prefix: String,
    /// Name of the generated dynamic schema.
    pub schema_name: String,
    /// Publish schema updates. When false the diff is still evaluated.
    pub update_schema: bool,
    /// Source feature name → target class name.
    pub category_remap: BTreeMap<String, String>,
    /// Unit/coordinate transform applied while marshaling.
    pub spatial_transform: SpatialTransform,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            design_alignment_prefix: "Alignment\\".to_string(),
            schema_name: "RoadRailDynamic".to_string(),
            update_schema: true,
            category_remap: BTreeMap::new(),
            spatial_transform: SpatialTransform::default(),
        }
    }
}

impl ConversionConfig {
    pub fn from_toml_str(s: &str) -> SyncResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> SyncResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Applies environment overrides.
    #[must_use]
    pub fn apply_env(self) -> Self {
        let value = std::env::var(UPDATE_SCHEMA_ENV).ok();
        self.with_update_schema_override(value.as_deref())
    }

    /// Applies a raw `ROADRAIL_UPDATE_SCHEMA` value. Unrecognized values are
    /// ignored with a warning.
    #[must_use]
    pub fn with_update_schema_override(mut self, value: Option<&str>) -> Self {
        let Some(value) = value else {
            return self;
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => self.update_schema = true,
            "0" | "false" | "no" | "off" => self.update_schema = false,
            other => tracing::warn!(value = other, "ignoring unrecognized {UPDATE_SCHEMA_ENV}"),
        }
        self
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.schema_name.trim().is_empty() {
            return Err(SyncError::Config("schema_name must not be empty".into()));
        }
        if self.design_alignment_prefix.is_empty() {
            return Err(SyncError::Config(
                "design_alignment_prefix must not be empty".into(),
            ));
        }
        let scale = self.spatial_transform.scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(SyncError::Config(format!(
                "spatial_transform.scale must be positive, got {scale}"
            )));
        }
        Ok(())
    }
}
