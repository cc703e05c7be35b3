use pretty_assertions::assert_eq;
use roadrail_model::{
    class_name_for_feature, DynamicSchemaGenerator, SourceEntity, SourceGraph,
    CORRIDOR_COMPONENT_BASE, LINEAR_BASE,
};
use roadrail_types::Kind;
use std::collections::BTreeMap;

#[test]
fn feature_paths_become_class_names() {
    assert_eq!(class_name_for_feature("Linear\\Pavement\\Asphalt 1"), "Linear_Pavement_Asphalt_1");
    assert_eq!(class_name_for_feature("\\\\Mesh--Top\\"), "Mesh_Top");
    assert_eq!(class_name_for_feature("3D Linear"), "C_3D_Linear");
    assert_eq!(class_name_for_feature("***"), "Unnamed");
}

#[test]
fn generator_collects_surface_and_linear_categories() {
    let graph = SourceGraph::from_feed(vec![
        SourceEntity::new(Kind::Alignment, "a1", "CL").with_feature("Alignment\\Road\\CL"),
        SourceEntity::new(Kind::Alignment, "a2", "EOP").with_feature("Linear\\EOP"),
        SourceEntity::new(Kind::CorridorSurface, "s1", "Top").with_feature("Mesh\\Top"),
        SourceEntity::new(Kind::CorridorSurface, "s2", "Top").with_feature("Mesh\\Top"),
        SourceEntity::new(Kind::CorridorSurface, "s3", "Base").with_feature("Mesh\\Base"),
    ]);
    let remap = BTreeMap::new();
    let snapshot = DynamicSchemaGenerator::new("RoadRailDynamic", "Alignment\\", &remap).generate(&graph);

    let names: Vec<_> = snapshot.classes.keys().cloned().collect();
    assert_eq!(names, vec!["Linear_EOP", "Mesh_Base", "Mesh_Top"]);
    assert_eq!(snapshot.class("Mesh_Top").unwrap().base_class, CORRIDOR_COMPONENT_BASE);
    assert_eq!(snapshot.class("Linear_EOP").unwrap().base_class, LINEAR_BASE);
    assert!(snapshot.classes.values().all(|c| !c.sealed));
}

#[test]
fn remapped_features_use_the_remapped_class() {
    let graph = SourceGraph::from_feed(vec![
        SourceEntity::new(Kind::CorridorSurface, "s1", "Top").with_feature("Mesh\\Top"),
    ]);
    let mut remap = BTreeMap::new();
    remap.insert("Mesh\\Top".to_string(), "PavementSurface".to_string());
    let generator = DynamicSchemaGenerator::new("RoadRailDynamic", "Alignment\\", &remap);

    assert_eq!(generator.class_for_feature("Mesh\\Top"), "PavementSurface");
    let snapshot = generator.generate(&graph);
    assert!(snapshot.contains("PavementSurface"));
    assert!(!snapshot.contains("Mesh_Top"));
}

#[test]
fn generation_is_independent_of_feed_order() {
    let a = SourceEntity::new(Kind::CorridorSurface, "s1", "x").with_feature("B");
    let b = SourceEntity::new(Kind::CorridorSurface, "s2", "y").with_feature("A");
    let remap = BTreeMap::new();
    let generator = DynamicSchemaGenerator::new("S", "Alignment\\", &remap);
    let one = generator.generate(&SourceGraph::from_feed(vec![a.clone(), b.clone()]));
    let two = generator.generate(&SourceGraph::from_feed(vec![b, a]));
    assert_eq!(one, two);
}
