use crate::geometry::TargetGeometry;
use roadrail_types::{Kind, SourceId, StableIdentifier, TargetId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a target entity lives in the persisted graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    /// Alignments authored as route centerlines.
    DesignAlignments,
    /// Alignment-shaped byproducts of corridors.
    Linears3d,
    /// Road/rail corridors.
    Corridors,
    /// Vertical profiles of one alignment.
    Profiles(TargetId),
    /// Pathway (road/rail/undetermined portion) of one corridor.
    Pathways(TargetId),
    /// Components attached to one pathway.
    Components(TargetId),
}

impl Container {
    /// Persisted key, e.g. `design_alignments` or `profiles/42`.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Container::DesignAlignments => "design_alignments".to_string(),
            Container::Linears3d => "linears_3d".to_string(),
            Container::Corridors => "corridors".to_string(),
            Container::Profiles(id) => format!("profiles/{id}"),
            Container::Pathways(id) => format!("pathways/{id}"),
            Container::Components(id) => format!("components/{id}"),
        }
    }

    /// Parses a key produced by [`Container::key`].
    #[must_use]
    pub fn parse_key(key: &str) -> Option<Self> {
        match key {
            "design_alignments" => return Some(Container::DesignAlignments),
            "linears_3d" => return Some(Container::Linears3d),
            "corridors" => return Some(Container::Corridors),
            _ => {}
        }
        let (prefix, raw) = key.split_once('/')?;
        let owner = TargetId::new(raw.parse().ok()?).ok()?;
        match prefix {
            "profiles" => Some(Container::Profiles(owner)),
            "pathways" => Some(Container::Pathways(owner)),
            "components" => Some(Container::Components(owner)),
            _ => None,
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Cross-reference value recorded on targets: `kind:source_id`.
#[must_use]
pub fn source_ref(kind: Kind, id: &SourceId) -> String {
    format!("{kind}:{id}")
}

/// Content written to the target store for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetData {
    pub class_name: String,
    /// Unique within the container.
    pub code: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stable_id: Option<StableIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    #[serde(default)]
    pub geometry: TargetGeometry,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl TargetData {
    pub fn new(
        class_name: impl Into<String>,
        code: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            code: code.into(),
            label: label.into(),
            stable_id: None,
            source_ref: None,
            geometry: TargetGeometry::None,
            properties: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_stable_id(mut self, stable_id: Option<StableIdentifier>) -> Self {
        self.stable_id = stable_id;
        self
    }

    #[must_use]
    pub fn with_source_ref(mut self, kind: Kind, id: &SourceId) -> Self {
        self.source_ref = Some(source_ref(kind, id));
        self
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: TargetGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Sets a property, returning true when the stored value changed.
    pub fn set_property(&mut self, name: &str, value: impl Into<serde_json::Value>) -> bool {
        let value = value.into();
        if self.properties.get(name) == Some(&value) {
            return false;
        }
        self.properties.insert(name.to_string(), value);
        true
    }

    /// Reads a target-id valued property.
    #[must_use]
    pub fn target_ref(&self, name: &str) -> Option<TargetId> {
        self.properties
            .get(name)
            .and_then(serde_json::Value::as_i64)
            .and_then(|raw| TargetId::new(raw).ok())
    }

    /// Reads a numeric property.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        self.properties.get(name).and_then(serde_json::Value::as_f64)
    }
}

/// A persisted target entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEntity {
    pub id: TargetId,
    pub container: Container,
    pub data: TargetData,
}

/// Criteria for a target store query. All set fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetQuery {
    pub container: Option<Container>,
    pub class_name: Option<String>,
    pub source_ref: Option<String>,
}

impl TargetQuery {
    /// Matches every target whose recorded cross-reference is `kind:id`.
    #[must_use]
    pub fn by_source_ref(kind: Kind, id: &SourceId) -> Self {
        Self {
            source_ref: Some(source_ref(kind, id)),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn in_container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    #[must_use]
    pub fn of_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }
}
