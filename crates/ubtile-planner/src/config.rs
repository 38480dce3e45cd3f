//! Planner configuration and operator-family presets
//!
//! The constants that shape a plan (live buffer count, tile alignment,
//! minimum tile size, when to re-split for utilization) differ between
//! operator families. They live here as plain configuration instead of
//! being hard-coded into the planner.

use crate::record::RecordLayout;
use ubtile_core::{ResourceProfile, TilingError, TilingResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// When the planner may shrink tiles to occupy more workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RefinementPolicy {
    /// Never re-split; keep the capacity-bound tile
    Disabled,
    /// Re-split whenever each worker gets at most one tile and workers sit idle
    #[default]
    WhenUnderutilized,
    /// As `WhenUnderutilized`, but only for workloads of at most `max_elements`
    SmallShape { max_elements: i64 },
}

impl RefinementPolicy {
    /// Whether a first-pass split qualifies for refinement
    pub fn admits(
        &self,
        total_elements: i64,
        used_workers: i64,
        outer_loops: i64,
        worker_count: i64,
    ) -> bool {
        let underutilized = used_workers < worker_count && outer_loops <= 1;
        match self {
            RefinementPolicy::Disabled => false,
            RefinementPolicy::WhenUnderutilized => underutilized,
            RefinementPolicy::SmallShape { max_elements } => {
                underutilized && total_elements <= *max_elements
            }
        }
    }
}

/// Size of the scratch/overflow workspace requested alongside a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WorkspacePolicy {
    /// Constant byte count (simple elementwise operators)
    Fixed(u64),
    /// One scratch buffer per worker (multi-dimensional broadcast operators)
    PerWorkerScratch,
}

impl Default for WorkspacePolicy {
    fn default() -> Self {
        WorkspacePolicy::Fixed(DEFAULT_WORKSPACE_BYTES)
    }
}

impl WorkspacePolicy {
    /// Workspace bytes for a given profile
    pub fn bytes(&self, profile: &ResourceProfile) -> u64 {
        match self {
            WorkspacePolicy::Fixed(bytes) => *bytes,
            WorkspacePolicy::PerWorkerScratch => {
                u64::from(profile.worker_count).saturating_mul(profile.scratch_bytes)
            }
        }
    }
}

/// Workspace for simple elementwise operators
pub const DEFAULT_WORKSPACE_BYTES: u64 = 32;

/// Tile boundary alignment of the vector unit
pub const DEFAULT_ALIGNMENT_BYTES: u32 = 32;

/// Smallest tile worth a loop iteration
pub const DEFAULT_MIN_TILE_BYTES: u64 = 2048;

/// Tile planner configuration
///
/// # Example
///
/// ```
/// use ubtile_planner::{PlannerConfig, RefinementPolicy};
///
/// let config = PlannerConfig::elementwise()
///     .with_buffer_multiplicity(3)
///     .with_refinement(RefinementPolicy::SmallShape { max_elements: 4096 });
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.buffer_multiplicity, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlannerConfig {
    /// Tile-sized buffers live at once per worker (2 for double buffering)
    pub buffer_multiplicity: u32,

    /// Byte boundary refined tiles are rounded up to (default: 32)
    pub alignment_bytes: u32,

    /// Minimum refined tile size in bytes (default: 2048)
    pub min_tile_bytes: u64,

    /// Utilization refinement policy
    pub refinement: RefinementPolicy,

    /// Workspace sizing
    pub workspace: WorkspacePolicy,

    /// Field order of the serialized plan record
    pub layout: RecordLayout,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self::elementwise()
    }
}

impl PlannerConfig {
    /// Unary/binary elementwise operators: double buffering, fixed 32-byte workspace
    pub fn elementwise() -> Self {
        Self {
            buffer_multiplicity: 2,
            alignment_bytes: DEFAULT_ALIGNMENT_BYTES,
            min_tile_bytes: DEFAULT_MIN_TILE_BYTES,
            refinement: RefinementPolicy::WhenUnderutilized,
            workspace: WorkspacePolicy::Fixed(DEFAULT_WORKSPACE_BYTES),
            layout: RecordLayout::elementwise(),
        }
    }

    /// Broadcasting binary operators: two inputs and one output live per
    /// iteration, workspace scaled by worker count
    pub fn broadcast() -> Self {
        Self {
            buffer_multiplicity: 3,
            alignment_bytes: DEFAULT_ALIGNMENT_BYTES,
            min_tile_bytes: DEFAULT_MIN_TILE_BYTES,
            refinement: RefinementPolicy::WhenUnderutilized,
            workspace: WorkspacePolicy::PerWorkerScratch,
            layout: RecordLayout::broadcast(),
        }
    }

    pub fn with_buffer_multiplicity(mut self, multiplicity: u32) -> Self {
        self.buffer_multiplicity = multiplicity;
        self
    }

    pub fn with_alignment_bytes(mut self, bytes: u32) -> Self {
        self.alignment_bytes = bytes;
        self
    }

    pub fn with_min_tile_bytes(mut self, bytes: u64) -> Self {
        self.min_tile_bytes = bytes;
        self
    }

    pub fn with_refinement(mut self, refinement: RefinementPolicy) -> Self {
        self.refinement = refinement;
        self
    }

    pub fn with_workspace(mut self, workspace: WorkspacePolicy) -> Self {
        self.workspace = workspace;
        self
    }

    pub fn with_layout(mut self, layout: RecordLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Check configuration invariants
    ///
    /// # Errors
    ///
    /// Returns [`TilingError::InvalidConfig`] for a zero buffer multiplicity,
    /// a zero alignment or a negative small-shape threshold.
    pub fn validate(&self) -> TilingResult<()> {
        if self.buffer_multiplicity == 0 {
            return Err(TilingError::InvalidConfig(
                "buffer multiplicity must be at least 1".to_string(),
            ));
        }
        if self.alignment_bytes == 0 {
            return Err(TilingError::InvalidConfig(
                "alignment must be positive".to_string(),
            ));
        }
        if let RefinementPolicy::SmallShape { max_elements } = self.refinement {
            if max_elements < 0 {
                return Err(TilingError::InvalidConfig(format!(
                    "small-shape threshold cannot be negative, got {}",
                    max_elements
                )));
            }
        }
        Ok(())
    }

    /// Largest tile (in elements) that keeps every live buffer inside scratch memory
    pub fn max_tile_elems(&self, profile: &ResourceProfile) -> i64 {
        let per_elem = u64::from(self.buffer_multiplicity) * u64::from(profile.elem_bytes);
        if per_elem == 0 {
            return 0;
        }
        i64::try_from(profile.scratch_bytes / per_elem).unwrap_or(i64::MAX)
    }

    /// Alignment of refined tiles in elements, at least one
    pub fn align_elems(&self, elem_bytes: u32) -> i64 {
        i64::from((self.alignment_bytes / elem_bytes.max(1)).max(1))
    }

    /// Minimum refined tile in elements
    pub fn min_tile_elems(&self, elem_bytes: u32) -> i64 {
        i64::try_from(self.min_tile_bytes / u64::from(elem_bytes.max(1))).unwrap_or(i64::MAX)
    }
}
