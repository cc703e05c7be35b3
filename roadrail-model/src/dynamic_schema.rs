use crate::schema::{SchemaClass, SchemaSnapshot};
use crate::source::SourceGraph;
use roadrail_types::Kind;
use std::collections::BTreeMap;

/// Base class of generated corridor component categories.
pub const CORRIDOR_COMPONENT_BASE: &str = "CorridorComponent";
/// Base class of generated 3D linear categories.
pub const LINEAR_BASE: &str = "Linear3d";

/// Synthesizes a [`SchemaSnapshot`] from the categories observed in a feed.
///
/// Corridor surfaces contribute one class per feature name (or per remapped
/// class name); non-design alignments do the same under [`LINEAR_BASE`].
pub struct DynamicSchemaGenerator<'a> {
    schema_name: &'a str,
    design_alignment_prefix: &'a str,
    remap: &'a BTreeMap<String, String>,
}

impl<'a> DynamicSchemaGenerator<'a> {
    #[must_use]
    pub fn new(
        schema_name: &'a str,
        design_alignment_prefix: &'a str,
        remap: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            schema_name,
            design_alignment_prefix,
            remap,
        }
    }

    /// Class name for a source feature, honouring the remap table.
    #[must_use]
    pub fn class_for_feature(&self, feature: &str) -> String {
        self.remap
            .get(feature)
            .cloned()
            .unwrap_or_else(|| class_name_for_feature(feature))
    }

    #[must_use]
    pub fn generate(&self, graph: &SourceGraph) -> SchemaSnapshot {
        let mut snapshot = SchemaSnapshot::new(self.schema_name);

        for feature in graph.feature_names(Kind::CorridorSurface) {
            snapshot.add_class(SchemaClass::new(
                self.class_for_feature(feature),
                CORRIDOR_COMPONENT_BASE,
            ));
        }

        for alignment in graph
            .of_kind(Kind::Alignment)
            .filter(|a| !a.is_design_alignment(self.design_alignment_prefix))
        {
            if let Some(feature) = alignment.feature_name.as_deref() {
                let name = self.class_for_feature(feature);
                if !snapshot.contains(&name) {
                    snapshot.add_class(SchemaClass::new(name, LINEAR_BASE));
                }
            }
        }

        snapshot
    }
}

/// Turns a feature path such as `Linear\Pavement\Asphalt 1` into a valid
/// class name (`Linear_Pavement_Asphalt_1`).
#[must_use]
pub fn class_name_for_feature(feature: &str) -> String {
    let mut name = String::with_capacity(feature.len());
    let mut pending_sep = false;
    for c in feature.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !name.is_empty() {
                name.push('_');
            }
            pending_sep = false;
            name.push(c);
        } else {
            pending_sep = true;
        }
    }

    if name.is_empty() {
        return "Unnamed".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "C_");
    }
    name
}
