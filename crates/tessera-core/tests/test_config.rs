use approx::assert_relative_eq;
use tessera_core::consts::VIEWPORT_MIN_SIZE;
use tessera_core::scan::{AttenuationFilter, BorderLines, ScanData};
use tessera_core::segmentation::OverlayStyle;
use tessera_core::viewport::{DefaultOptions, ViewportKind};
use tessera_core::EngineConfig;

// ---------------------------------------------------------------------------
// Scan metadata
// ---------------------------------------------------------------------------

#[test]
fn test_scan_data_from_metadata_json() {
    let json = r#"{
        "borderLines": [10, null, 5, null],
        "polygons": [[[0, 0], [4, 0], [4, 4]]],
        "th1": 500,
        "th2": 1500.5,
        "breastFilter": { "alpha": 0.3, "beta": 2, "k": 1.5 },
        "rotation": 90,
        "invert": true,
        "showFGTRegion": true
    }"#;
    let scan: ScanData = serde_json::from_str(json).unwrap();

    assert_eq!(
        scan.border_lines,
        BorderLines {
            top: Some(10.0),
            bottom: None,
            left: Some(5.0),
            right: None,
        }
    );
    assert_eq!(scan.polygons, vec![vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0]]]);
    assert_relative_eq!(scan.primary_threshold, 500.0);
    assert_relative_eq!(scan.secondary_threshold, 1500.5);
    assert!(scan.attenuation.is_enabled());
    assert_relative_eq!(scan.attenuation.baseline, 0.3);
    assert_relative_eq!(scan.attenuation.exponent, 2.0);
    assert_relative_eq!(scan.attenuation.scale, 1.5);
    assert!(!scan.is_horizontal_axis());
    assert!(scan.invert);
    assert!(scan.show_secondary_border);
    assert!(scan.show_secondary_region);
    assert_relative_eq!(scan.primary_area, 0.0);
}

#[test]
fn test_scan_data_minimal_json_uses_defaults() {
    let scan: ScanData = serde_json::from_str(r#"{ "th1": 1, "th2": 2 }"#).unwrap();
    assert_eq!(scan, ScanData::new(1.0, 2.0));
    assert_eq!(OverlayStyle::from(&scan), OverlayStyle::default());
}

#[test]
fn test_scan_data_requires_thresholds() {
    assert!(serde_json::from_str::<ScanData>(r#"{ "th1": 1 }"#).is_err());
}

#[test]
fn test_short_border_list_leaves_rest_unset() {
    let lines: BorderLines = serde_json::from_str("[3]").unwrap();
    assert_eq!(lines.top, Some(3.0));
    assert_eq!(lines.bottom, None);
    assert_eq!(lines.right, None);
}

#[test]
fn test_named_border_table() {
    let lines: BorderLines = serde_json::from_str(r#"{ "bottom": 7 }"#).unwrap();
    assert_eq!(lines.bottom, Some(7.0));
    assert_eq!(lines.top, None);
}

#[test]
fn test_partial_filter_fills_defaults() {
    let filter: AttenuationFilter = serde_json::from_str(r#"{ "alpha": 0.2 }"#).unwrap();
    assert_relative_eq!(filter.baseline, 0.2);
    assert_relative_eq!(filter.exponent, 1.0);
    assert_relative_eq!(filter.scale, 1.0);
}

#[test]
fn test_scan_data_toml_file_round_trip() {
    let mut scan = ScanData::new(400.0, 900.0);
    scan.border_lines.left = Some(12.0);
    scan.polygons.push(vec![[1.0, 1.0], [8.0, 1.0], [4.5, 6.0]]);
    scan.attenuation = AttenuationFilter {
        baseline: 0.25,
        exponent: 1.5,
        scale: 1.0,
    };
    scan.rotation = 180.0;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.toml");
    std::fs::write(&path, toml::to_string_pretty(&scan).unwrap()).unwrap();

    let loaded: ScanData = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded, scan);
}

// ---------------------------------------------------------------------------
// Engine and viewport options
// ---------------------------------------------------------------------------

#[test]
fn test_engine_config_defaults() {
    let config: EngineConfig = toml::from_str("").unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.min_viewport_size, VIEWPORT_MIN_SIZE);
    assert!(config.id.is_none());
    assert!(!config.software_fallback);
}

#[test]
fn test_engine_config_toml_round_trip() {
    let config = EngineConfig {
        id: Some("main".into()),
        software_fallback: true,
        device_pixel_ratio: Some(1.5),
        min_viewport_size: 4,
    };
    let text = toml::to_string_pretty(&config).unwrap();
    let loaded: EngineConfig = toml::from_str(&text).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_overlay_style_partial_json() {
    let style: OverlayStyle = serde_json::from_str(r#"{ "showSecondaryRegion": true }"#).unwrap();
    assert!(style.show_secondary_border);
    assert!(style.show_secondary_region);
}

#[test]
fn test_viewport_kind_names() {
    let kind: ViewportKind = serde_json::from_str(r#""volume3d""#).unwrap();
    assert_eq!(kind, ViewportKind::Volume3d);
    assert_eq!(ViewportKind::Orthographic.to_string(), "orthographic");
    assert!(kind.is_volume());
    assert!(!ViewportKind::Stack.is_volume());
}

#[test]
fn test_default_options_from_empty_json() {
    let options: DefaultOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options, DefaultOptions::default());
}
