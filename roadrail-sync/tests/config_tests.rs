use pretty_assertions::assert_eq;
use roadrail_model::{Point3, SpatialTransform};
use roadrail_sync::{ConversionConfig, SyncError};
use std::io::Write;

#[test]
fn defaults() {
    let config = ConversionConfig::default();
    assert_eq!(config.design_alignment_prefix, "Alignment\\");
    assert_eq!(config.schema_name, "RoadRailDynamic");
    assert!(config.update_schema);
    assert!(config.category_remap.is_empty());
    assert_eq!(config.spatial_transform, SpatialTransform::default());
    assert!(config.validate().is_ok());
}

#[test]
fn full_toml() {
    let config = ConversionConfig::from_toml_str(
        r#"
        design_alignment_prefix = "Align\\"
        schema_name = "SiteSchema"
        update_schema = false

        [category_remap]
        "Mesh\\Top" = "Pavement"

        [spatial_transform]
        scale = 0.3048
        offset = { x = 1000.0, y = 2000.0, z = 0.0 }
        "#,
    )
    .unwrap();

    assert_eq!(config.design_alignment_prefix, "Align\\");
    assert_eq!(config.schema_name, "SiteSchema");
    assert!(!config.update_schema);
    assert_eq!(config.category_remap["Mesh\\Top"], "Pavement");
    assert_eq!(
        config.spatial_transform,
        SpatialTransform {
            scale: 0.3048,
            offset: Point3::new(1000.0, 2000.0, 0.0),
        }
    );
}

#[test]
fn partial_toml_keeps_defaults() {
    let config = ConversionConfig::from_toml_str("schema_name = \"Other\"").unwrap();
    assert_eq!(
        config,
        ConversionConfig {
            schema_name: "Other".to_string(),
            ..ConversionConfig::default()
        }
    );
}

#[test]
fn malformed_toml_is_a_config_error() {
    let err = ConversionConfig::from_toml_str("update_schema = maybe").unwrap_err();
    assert!(matches!(err, SyncError::Config(_)));
}

#[test]
fn invalid_values_are_rejected() {
    for toml in [
        "schema_name = \"  \"",
        "design_alignment_prefix = \"\"",
        "[spatial_transform]\nscale = 0.0\noffset = { x = 0.0, y = 0.0, z = 0.0 }",
        "[spatial_transform]\nscale = -2.0\noffset = { x = 0.0, y = 0.0, z = 0.0 }",
    ] {
        let err = ConversionConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)), "accepted {toml:?}");
    }
}

#[test]
fn update_schema_override_values() {
    let on = ConversionConfig {
        update_schema: true,
        ..ConversionConfig::default()
    };
    for off in ["0", "false", "No", " OFF "] {
        assert!(!on.clone().with_update_schema_override(Some(off)).update_schema, "{off}");
    }

    let off = ConversionConfig {
        update_schema: false,
        ..ConversionConfig::default()
    };
    for value in ["1", "TRUE", "yes", "on"] {
        assert!(off.clone().with_update_schema_override(Some(value)).update_schema, "{value}");
    }

    // Unset or unrecognized leaves the setting alone.
    assert!(!off.clone().with_update_schema_override(None).update_schema);
    assert!(!off.with_update_schema_override(Some("sometimes")).update_schema);
}

#[test]
fn from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "update_schema = false").unwrap();
    writeln!(file, "[category_remap]").unwrap();
    writeln!(file, "\"Linear\\\\Edge\" = \"EdgeLine\"").unwrap();

    let config = ConversionConfig::from_file(file.path()).unwrap();
    assert!(!config.update_schema);
    assert_eq!(config.category_remap["Linear\\Edge"], "EdgeLine");
}

#[test]
fn missing_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConversionConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, SyncError::Config(ref m) if m.contains("absent.toml")));
}
