//! Integration tests for ubtile-core
//!
//! These tests drive the analyzer through its public API the way the
//! planner crate does.

use ubtile_core::{
    require_same_kind, AnalyzerConfig, ElementKind, ElementSizeTable, PlatformInfo,
    ShapeAnalyzer, TensorDesc, TilingError,
};

#[test]
fn test_raw_tag_to_profile() {
    // float16 as reported by the host graph engine
    let kind = ElementKind::from_raw_tag(1).unwrap();
    let tensor = TensorDesc::new(&[2, 1024], kind);

    let (profile, workload) = ShapeAnalyzer::default()
        .analyze(&PlatformInfo::new(40, 196_608), &tensor)
        .unwrap();

    assert_eq!(profile.elem_bytes, 2);
    assert_eq!(workload.total_elements, 2048);
}

#[test]
fn test_every_kind_yields_valid_profile() {
    let analyzer = ShapeAnalyzer::default();
    let platform = PlatformInfo::new(8, 65_536);

    for kind in ElementKind::ALL {
        let tensor = TensorDesc::new(&[3, 5], kind);
        let (profile, workload) = analyzer.analyze(&platform, &tensor).unwrap();
        assert!(profile.validate().is_ok(), "{} produced an invalid profile", kind);
        assert_eq!(workload.total_elements, 15);
    }
}

#[test]
fn test_promoted_compute_width() {
    let sizes = ElementSizeTable::new()
        .with_size(ElementKind::BFloat16, 4)
        .unwrap();
    let analyzer = ShapeAnalyzer::new(
        AnalyzerConfig::new()
            .with_sizes(sizes)
            .with_reserved_bytes(32),
    );

    let tensor = TensorDesc::new(&[128], ElementKind::BFloat16);
    let (profile, _) = analyzer
        .analyze(&PlatformInfo::new(24, 1056), &tensor)
        .unwrap();

    assert_eq!(profile.elem_bytes, 4);
    assert_eq!(profile.scratch_bytes, 1024);
}

#[test]
fn test_dtype_precondition_before_analysis() {
    let inputs = [ElementKind::Int32, ElementKind::Int64];
    let err = require_same_kind(&inputs).unwrap_err();
    assert!(matches!(err, TilingError::DtypeMismatch { index: 1, .. }));
}

#[cfg(feature = "serde")]
#[test]
fn test_descriptor_serde() {
    let tensor = TensorDesc::new(&[4, 4], ElementKind::Complex64);
    let json = serde_json::to_string(&tensor).unwrap();
    assert!(json.contains("complex64"));

    let back: TensorDesc = serde_json::from_str(&json).unwrap();
    assert_eq!(back, tensor);
}
