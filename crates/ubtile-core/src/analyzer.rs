//! Shape/resource analysis
//!
//! Normalizes the raw platform and tensor descriptions into the
//! [`ResourceProfile`] + [`Workload`] pair consumed by the planner.

use crate::error::{TilingError, TilingResult};
use crate::types::{
    ElementKind, ElementSizeTable, PlatformInfo, ResourceProfile, TensorDesc, Workload,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalyzerConfig {
    /// Bytes of scratch memory held back for bookkeeping (default: 0)
    pub reserved_bytes: u64,
    /// Working byte width per element kind
    pub sizes: ElementSizeTable,
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reserved scratch bytes
    pub fn with_reserved_bytes(mut self, bytes: u64) -> Self {
        self.reserved_bytes = bytes;
        self
    }

    /// Replace the element size table
    pub fn with_sizes(mut self, sizes: ElementSizeTable) -> Self {
        self.sizes = sizes;
        self
    }
}

/// Turns raw descriptors into planner inputs
///
/// # Example
///
/// ```
/// use ubtile_core::{ElementKind, PlatformInfo, ShapeAnalyzer, TensorDesc};
///
/// let analyzer = ShapeAnalyzer::default();
/// let platform = PlatformInfo::new(48, 196_608);
/// let tensor = TensorDesc::new(&[32, 1024], ElementKind::Float16);
///
/// let (profile, workload) = analyzer.analyze(&platform, &tensor).unwrap();
/// assert_eq!(profile.worker_count, 48);
/// assert_eq!(profile.elem_bytes, 2);
/// assert_eq!(workload.total_elements, 32 * 1024);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShapeAnalyzer {
    config: AnalyzerConfig,
}

impl ShapeAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Normalize the platform limits for one element kind
    ///
    /// # Errors
    ///
    /// Returns [`TilingError::PlatformQuery`] if the core count or the scratch
    /// size left after the reservation is not positive.
    pub fn profile(
        &self,
        platform: &PlatformInfo,
        kind: ElementKind,
    ) -> TilingResult<ResourceProfile> {
        if platform.core_count <= 0 || platform.core_count > i64::from(u32::MAX) {
            return Err(TilingError::PlatformQuery {
                what: "core count",
                value: platform.core_count,
            });
        }

        let reserved = i64::try_from(self.config.reserved_bytes).unwrap_or(i64::MAX);
        let scratch = platform.scratch_bytes.saturating_sub(reserved);
        if scratch <= 0 {
            return Err(TilingError::PlatformQuery {
                what: "scratch size",
                value: scratch,
            });
        }

        ResourceProfile::new(
            platform.core_count as u32,
            scratch as u64,
            self.config.sizes.size_of(kind),
        )
    }

    /// Normalize platform and tensor descriptions
    pub fn analyze(
        &self,
        platform: &PlatformInfo,
        tensor: &TensorDesc,
    ) -> TilingResult<(ResourceProfile, Workload)> {
        let profile = self.profile(platform, tensor.kind)?;
        let workload = Workload::from_shape(&tensor.shape)?;

        tracing::debug!(
            workers = profile.worker_count,
            scratch_bytes = profile.scratch_bytes,
            elem_bytes = profile.elem_bytes,
            total_elements = workload.total_elements,
            kind = %tensor.kind,
            "analyzed tiling inputs"
        );

        Ok((profile, workload))
    }
}

/// Check that every input of an elementwise operator shares one element kind.
///
/// The planner itself never compares dtypes; callers run this before
/// planning operators with more than one input.
///
/// # Errors
///
/// Returns [`TilingError::DtypeMismatch`] naming the first disagreeing input.
pub fn require_same_kind(kinds: &[ElementKind]) -> TilingResult<Option<ElementKind>> {
    let Some((&expected, rest)) = kinds.split_first() else {
        return Ok(None);
    };

    for (offset, &actual) in rest.iter().enumerate() {
        if actual != expected {
            return Err(TilingError::DtypeMismatch {
                index: offset + 1,
                expected,
                actual,
            });
        }
    }

    Ok(Some(expected))
}
