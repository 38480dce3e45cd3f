//! Property-based tests for shape analysis
//!
//! This module uses proptest to check the analyzer against randomly
//! generated shapes and platform descriptions.

#[cfg(test)]
mod tests {
    use crate::{ElementKind, PlatformInfo, ShapeAnalyzer, TensorDesc, TilingError, Workload};
    use proptest::prelude::*;

    // Shapes of rank 0-6 with small dimensions, zeros included
    fn shape_strategy() -> impl Strategy<Value = Vec<i64>> {
        prop::collection::vec(0i64..64, 0..=6)
    }

    fn kind_strategy() -> impl Strategy<Value = ElementKind> {
        (0usize..ElementKind::COUNT).prop_map(|i| ElementKind::ALL[i])
    }

    proptest! {
        #[test]
        fn prop_flatten_matches_product(shape in shape_strategy()) {
            let workload = Workload::from_shape(&shape).unwrap();
            let expected: i64 = shape.iter().product();
            prop_assert_eq!(workload.total_elements, expected);
        }

        #[test]
        fn prop_negative_dim_rejected(
            mut shape in prop::collection::vec(1i64..64, 1..=6),
            pos in 0usize..6,
            neg in -64i64..0,
        ) {
            let idx = pos % shape.len();
            shape[idx] = neg;
            prop_assert!(Workload::from_shape(&shape).is_err());
        }

        #[test]
        fn prop_profile_uses_natural_size(
            cores in 1i64..=256,
            scratch in 1i64..=(1 << 20),
            kind in kind_strategy(),
        ) {
            let analyzer = ShapeAnalyzer::default();
            let tensor = TensorDesc::new(&[16, 16], kind);
            let (profile, _) = analyzer
                .analyze(&PlatformInfo::new(cores, scratch), &tensor)
                .unwrap();

            prop_assert_eq!(profile.elem_bytes, kind.natural_size());
            prop_assert_eq!(profile.worker_count as i64, cores);
            prop_assert_eq!(profile.scratch_bytes as i64, scratch);
        }

        #[test]
        fn prop_non_positive_platform_rejected(
            cores in -16i64..=0,
            scratch in -16i64..=0,
        ) {
            let analyzer = ShapeAnalyzer::default();
            let tensor = TensorDesc::new(&[4], ElementKind::Float32);

            let bad_cores = analyzer.analyze(&PlatformInfo::new(cores, 4096), &tensor);
            let is_platform_query = matches!(bad_cores, Err(TilingError::PlatformQuery { .. }));
            prop_assert!(is_platform_query);

            let bad_scratch = analyzer.analyze(&PlatformInfo::new(8, scratch), &tensor);
            let is_platform_query = matches!(bad_scratch, Err(TilingError::PlatformQuery { .. }));
            prop_assert!(is_platform_query);
        }
    }
}
