//! Tile planning
//!
//! Partitions a flattened workload across a fixed pool of workers, each of
//! which streams its share through scratch memory one tile at a time.
//!
//! # Algorithm
//!
//! 1. Size the tile by capacity: `scratch_bytes / (buffer_multiplicity * elem_bytes)`,
//!    capped by the workload size
//! 2. Derive block factors ([`derive_blocks`]): chunk count, per-worker loop
//!    count, used workers and the tails at both levels
//! 3. If the split leaves workers idle while every worker runs a single tile,
//!    re-split once with a smaller aligned tile (see [`RefinementPolicy`])
//!
//! Every step is a constant number of integer divisions; nothing loops over
//! the data or iterates to a fixed point.
//!
//! [`RefinementPolicy`]: crate::config::RefinementPolicy

use crate::config::PlannerConfig;
use ubtile_core::{ResourceProfile, TilingError, TilingResult, Workload};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ceiling division for non-negative dividends and positive divisors
#[inline]
pub fn ceil_div(a: i64, b: i64) -> i64 {
    debug_assert!(a >= 0 && b > 0);
    a / b + i64::from(a % b != 0)
}

/// Round `value` up to the next multiple of `align`
#[inline]
pub fn round_up(value: i64, align: i64) -> i64 {
    ceil_div(value, align).saturating_mul(align)
}

/// Partition of one workload across workers and loop iterations.
///
/// The last worker runs `tail_outer_loops` iterations and its final iteration
/// covers `tile_tail_elems` elements; every other iteration covers
/// `tile_elems`. An empty workload produces a plan whose fields are all zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TilingPlan {
    /// Elements covered by the plan
    pub total_elements: i64,
    /// Elements per inner loop iteration (UB factor)
    pub tile_elems: i64,
    /// Workers that receive work
    pub used_workers: i64,
    /// Iterations of every worker but the last (block factor)
    pub outer_loops: i64,
    /// Iterations of the last worker
    pub tail_outer_loops: i64,
    /// Elements in the last iteration of the last worker
    pub tile_tail_elems: i64,
}

impl TilingPlan {
    /// Plan for a workload without elements
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.used_workers == 0
    }

    /// Elements handled by each non-last worker
    pub fn worker_elems(&self) -> i64 {
        self.outer_loops.saturating_mul(self.tile_elems)
    }

    /// Elements handled by the last worker
    pub fn tail_worker_elems(&self) -> i64 {
        if self.is_empty() {
            return 0;
        }
        self.tail_outer_loops
            .saturating_sub(1)
            .saturating_mul(self.tile_elems)
            .saturating_add(self.tile_tail_elems)
    }

    /// Total elements the plan visits, `None` if that overflows i128
    pub fn covered_elements(&self) -> Option<i128> {
        let tile = i128::from(self.tile_elems);
        let full = (i128::from(self.used_workers) - 1)
            .checked_mul(i128::from(self.outer_loops))?
            .checked_mul(tile)?;
        let tail = (i128::from(self.tail_outer_loops) - 1).checked_mul(tile)?;
        full.checked_add(tail)?
            .checked_add(i128::from(self.tile_tail_elems))
    }

    /// Whether every element is visited exactly once
    pub fn check_coverage(&self) -> bool {
        self.covered_elements() == Some(i128::from(self.total_elements))
    }

    /// Check the structural invariants that need no resource profile
    ///
    /// Either every field is zero, or the plan has at least one worker, a
    /// non-empty tail tile and tail worker within their full counterparts,
    /// per-worker element counts that fit `i64`, and exact coverage.
    ///
    /// # Errors
    ///
    /// Returns [`TilingError::Record`] describing the first violated invariant.
    pub fn validate(&self) -> TilingResult<()> {
        let violation = |what: &str| -> TilingResult<()> {
            Err(TilingError::Record(format!("{}: {:?}", what, self)))
        };

        let fields = [
            self.total_elements,
            self.tile_elems,
            self.used_workers,
            self.outer_loops,
            self.tail_outer_loops,
            self.tile_tail_elems,
        ];
        if fields.iter().any(|&f| f < 0) {
            return violation("plan fields cannot be negative");
        }
        if fields.iter().all(|&f| f == 0) {
            return Ok(());
        }

        if self.total_elements == 0 {
            return violation("empty workload must produce an all-zero plan");
        }
        if self.used_workers < 1 {
            return violation("used worker count out of range");
        }
        if self.tile_tail_elems < 1 || self.tile_tail_elems > self.tile_elems {
            return violation("tile tail out of range");
        }
        if self.tail_outer_loops < 1 || self.tail_outer_loops > self.outer_loops {
            return violation("tail loop count out of range");
        }
        if self.outer_loops.checked_mul(self.tile_elems).is_none() {
            return violation("per-worker element count overflows i64");
        }
        if !self.check_coverage() {
            return violation("plan does not cover its workload exactly");
        }
        Ok(())
    }

    /// Check every plan invariant against the profile it was planned for
    ///
    /// # Errors
    ///
    /// Returns [`TilingError::Record`] describing the first violated invariant.
    pub fn verify(
        &self,
        profile: &ResourceProfile,
        buffer_multiplicity: u32,
    ) -> TilingResult<()> {
        self.validate()?;
        if self.is_empty() {
            return Ok(());
        }

        let live_bytes = i128::from(self.tile_elems)
            * i128::from(profile.elem_bytes)
            * i128::from(buffer_multiplicity);
        if live_bytes > i128::from(profile.scratch_bytes) {
            return Err(TilingError::Record(format!(
                "live tiles overflow scratch memory: {:?}",
                self
            )));
        }
        if self.used_workers > i64::from(profile.worker_count) {
            return Err(TilingError::Record(format!(
                "used worker count out of range: {:?}",
                self
            )));
        }
        Ok(())
    }
}

/// Derive block factors for a fixed tile size.
///
/// A remainder of zero means the last chunk is full: `tile_tail_elems`
/// equals `tile_elems`, never zero.
///
/// # Errors
///
/// Returns [`TilingError::InvalidConfig`] if `tile_elems` or `worker_count`
/// is not positive, or `total_elements` is negative.
///
/// # Examples
///
/// ```
/// use ubtile_planner::derive_blocks;
///
/// // 1000 elements in tiles of 64 over 8 workers
/// let plan = derive_blocks(64, 1000, 8).unwrap();
/// assert_eq!(plan.used_workers, 8);
/// assert_eq!(plan.outer_loops, 2);
/// assert_eq!(plan.tail_outer_loops, 2);
/// assert_eq!(plan.tile_tail_elems, 40);
/// assert!(plan.check_coverage());
/// ```
pub fn derive_blocks(
    tile_elems: i64,
    total_elements: i64,
    worker_count: i64,
) -> TilingResult<TilingPlan> {
    if tile_elems <= 0 || worker_count <= 0 || total_elements < 0 {
        return Err(TilingError::InvalidConfig(format!(
            "cannot derive blocks for tile {} over {} elements and {} workers",
            tile_elems, total_elements, worker_count
        )));
    }
    if total_elements == 0 {
        return Ok(TilingPlan::empty());
    }

    let outer_total = ceil_div(total_elements, tile_elems);
    let tile_tail_elems = match total_elements % tile_elems {
        0 => tile_elems,
        rem => rem,
    };

    let per_worker_chunks = ceil_div(outer_total, worker_count);
    let used_workers = ceil_div(outer_total, per_worker_chunks);
    let outer_loops = ceil_div(outer_total, used_workers);
    let tail_outer_loops = outer_total - (used_workers - 1) * outer_loops;

    Ok(TilingPlan {
        total_elements,
        tile_elems,
        used_workers,
        outer_loops,
        tail_outer_loops,
        tile_tail_elems,
    })
}

/// Single-pass tile planner
///
/// # Example
///
/// ```
/// use ubtile_core::{ResourceProfile, Workload};
/// use ubtile_planner::{PlannerConfig, TilePlanner};
///
/// let planner = TilePlanner::new(PlannerConfig::elementwise()).unwrap();
/// let profile = ResourceProfile::new(64, 253_952, 4).unwrap();
/// let workload = Workload::new(256).unwrap();
///
/// let plan = planner.plan(&profile, &workload).unwrap();
/// assert_eq!(plan.used_workers, 1);
/// assert_eq!(plan.tile_elems, 512);
/// assert_eq!(plan.tile_tail_elems, 256);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TilePlanner {
    config: PlannerConfig,
}

impl TilePlanner {
    /// Create a planner, validating the configuration
    pub fn new(config: PlannerConfig) -> TilingResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Planner with the broadcast preset
    pub fn broadcast() -> Self {
        Self {
            config: PlannerConfig::broadcast(),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan one operator invocation
    ///
    /// # Errors
    ///
    /// - [`TilingError::InvalidConfig`] if the profile violates its invariants
    /// - [`TilingError::InvalidShape`] for a negative element count
    /// - [`TilingError::InfeasibleTiling`] if scratch memory cannot hold one
    ///   element per live buffer
    pub fn plan(
        &self,
        profile: &ResourceProfile,
        workload: &Workload,
    ) -> TilingResult<TilingPlan> {
        profile.validate()?;
        let total = workload.total_elements;
        if total < 0 {
            return Err(TilingError::InvalidShape {
                shape: vec![total],
                reason: "element count cannot be negative".to_string(),
            });
        }

        let max_tile = self.config.max_tile_elems(profile);
        if max_tile == 0 {
            return Err(self.infeasible(profile));
        }
        if total == 0 {
            tracing::debug!("empty workload, no work dispatched");
            return Ok(TilingPlan::empty());
        }

        let workers = i64::from(profile.worker_count);
        let mut plan = derive_blocks(total.min(max_tile), total, workers)?;

        if self
            .config
            .refinement
            .admits(total, plan.used_workers, plan.outer_loops, workers)
        {
            let tile = self.refined_tile(total, workers, profile.elem_bytes, max_tile);
            if tile <= 0 {
                return Err(self.infeasible(profile));
            }
            tracing::trace!(
                from = plan.tile_elems,
                to = tile,
                used_workers = plan.used_workers,
                "refining tile for worker utilization"
            );
            plan = derive_blocks(tile, total, workers)?;
        }

        tracing::debug!(
            total_elements = plan.total_elements,
            tile_elems = plan.tile_elems,
            used_workers = plan.used_workers,
            outer_loops = plan.outer_loops,
            tail_outer_loops = plan.tail_outer_loops,
            tile_tail_elems = plan.tile_tail_elems,
            "tiling plan computed"
        );

        Ok(plan)
    }

    /// Smaller tile that spreads a small workload over more workers.
    ///
    /// Only reached with at least two workers, since a single worker is never
    /// underutilized.
    fn refined_tile(&self, total: i64, workers: i64, elem_bytes: u32, max_tile: i64) -> i64 {
        let share = if total % workers == 0 {
            total / workers
        } else {
            total / (workers - 1)
        };

        let aligned = round_up(share.max(1), self.config.align_elems(elem_bytes));
        aligned
            .max(self.config.min_tile_elems(elem_bytes))
            .min(max_tile)
    }

    fn infeasible(&self, profile: &ResourceProfile) -> TilingError {
        TilingError::InfeasibleTiling {
            scratch_bytes: profile.scratch_bytes,
            elem_bytes: profile.elem_bytes,
            buffer_multiplicity: self.config.buffer_multiplicity,
        }
    }
}

/// Plan with the given configuration
///
/// Convenience wrapper around [`TilePlanner::plan`].
pub fn plan(
    profile: &ResourceProfile,
    workload: &Workload,
    config: &PlannerConfig,
) -> TilingResult<TilingPlan> {
    TilePlanner::new(config.clone())?.plan(profile, workload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RefinementPolicy;

    const SCRATCH: u64 = 253_952;

    fn plan_for(total: i64, elem_bytes: u32, workers: u32) -> TilingPlan {
        let profile = ResourceProfile::new(workers, SCRATCH, elem_bytes).unwrap();
        TilePlanner::default()
            .plan(&profile, &Workload::new(total).unwrap())
            .unwrap()
    }

    #[test]
    fn test_ceil_div() {
        assert_eq!(ceil_div(0, 4), 0);
        assert_eq!(ceil_div(1, 4), 1);
        assert_eq!(ceil_div(8, 4), 2);
        assert_eq!(ceil_div(9, 4), 3);
        assert_eq!(ceil_div(i64::MAX, 1), i64::MAX);
        assert_eq!(ceil_div(i64::MAX, 2), i64::MAX / 2 + 1);
    }

    #[test]
    fn test_round_up() {
        assert_eq!(round_up(4, 8), 8);
        assert_eq!(round_up(8, 8), 8);
        assert_eq!(round_up(9, 8), 16);
        assert_eq!(round_up(7, 1), 7);
    }

    #[test]
    fn test_derive_blocks_exact() {
        let plan = derive_blocks(100, 800, 8).unwrap();

        assert_eq!(plan.used_workers, 8);
        assert_eq!(plan.outer_loops, 1);
        assert_eq!(plan.tail_outer_loops, 1);
        // zero remainder means a full tail
        assert_eq!(plan.tile_tail_elems, 100);
        assert!(plan.check_coverage());
    }

    #[test]
    fn test_derive_blocks_fewer_workers_needed() {
        // 10 chunks over 8 workers: 2 per worker, so 5 workers suffice
        let plan = derive_blocks(10, 100, 8).unwrap();

        assert_eq!(plan.outer_loops, 2);
        assert_eq!(plan.used_workers, 5);
        assert_eq!(plan.tail_outer_loops, 2);
        assert!(plan.check_coverage());
    }

    #[test]
    fn test_derive_blocks_short_last_worker() {
        // 11 chunks over 4 workers: 3, 3, 3, 2
        let plan = derive_blocks(10, 105, 4).unwrap();

        assert_eq!(plan.used_workers, 4);
        assert_eq!(plan.outer_loops, 3);
        assert_eq!(plan.tail_outer_loops, 2);
        assert_eq!(plan.tile_tail_elems, 5);
        assert_eq!(plan.tail_worker_elems(), 15);
        assert!(plan.check_coverage());
    }

    #[test]
    fn test_derive_blocks_rejects_bad_input() {
        assert!(derive_blocks(0, 10, 4).is_err());
        assert!(derive_blocks(10, 10, 0).is_err());
        assert!(derive_blocks(10, -1, 4).is_err());
        assert_eq!(derive_blocks(10, 0, 4).unwrap(), TilingPlan::empty());
    }

    #[test]
    fn test_scenario_fp32() {
        let plan = plan_for(256, 4, 64);

        assert_eq!(plan.used_workers, 1);
        assert_eq!(plan.outer_loops, 1);
        assert_eq!(plan.tail_outer_loops, 1);
        assert_eq!(plan.tile_elems, 512);
        assert_eq!(plan.tile_tail_elems, 256);
    }

    #[test]
    fn test_scenario_fp16() {
        let plan = plan_for(256, 2, 64);

        assert_eq!(plan.tile_elems, 1024);
        assert_eq!(plan.tile_tail_elems, 256);
        assert_eq!(plan.used_workers, 1);
    }

    #[test]
    fn test_scenario_int8() {
        let plan = plan_for(256, 1, 64);

        assert_eq!(plan.tile_elems, 2048);
        assert_eq!(plan.tile_tail_elems, 256);
        assert_eq!(plan.used_workers, 1);
    }

    #[test]
    fn test_scenario_fp64() {
        let plan = plan_for(256, 8, 64);

        assert_eq!(plan.tile_elems, 256);
        assert_eq!(plan.tile_tail_elems, 256);
        assert_eq!(plan.used_workers, 1);
    }

    #[test]
    fn test_empty_workload() {
        let plan = plan_for(0, 4, 64);

        assert!(plan.is_empty());
        assert_eq!(plan, TilingPlan::empty());
        assert!(plan.check_coverage());
        assert_eq!(plan.worker_elems(), 0);
        assert_eq!(plan.tail_worker_elems(), 0);
    }

    #[test]
    fn test_refinement_spreads_work() {
        // 64 workers, 40960 fp32 elements: one capacity tile would use a single
        // worker, refinement splits into 640-element tiles over 64 workers
        let plan = plan_for(40_960, 4, 64);

        assert_eq!(plan.tile_elems, 640);
        assert_eq!(plan.used_workers, 64);
        assert_eq!(plan.outer_loops, 1);
        assert!(plan.check_coverage());
    }

    #[test]
    fn test_refinement_indivisible() {
        // 40100 % 64 != 0, so the share is 40100 / 63 = 636, aligned to 640
        let plan = plan_for(40_100, 4, 64);

        assert_eq!(plan.tile_elems, 640);
        assert_eq!(plan.used_workers, 63);
        assert_eq!(plan.tail_outer_loops, 1);
        assert_eq!(plan.tile_tail_elems, 40_100 - 62 * 640);
        assert!(plan.check_coverage());
    }

    #[test]
    fn test_refinement_disabled() {
        let config = PlannerConfig::elementwise().with_refinement(RefinementPolicy::Disabled);
        let profile = ResourceProfile::new(64, SCRATCH, 4).unwrap();
        let plan = plan(&profile, &Workload::new(256).unwrap(), &config).unwrap();

        assert_eq!(plan.tile_elems, 256);
        assert_eq!(plan.used_workers, 1);
    }

    #[test]
    fn test_small_shape_threshold() {
        let config = PlannerConfig::elementwise()
            .with_refinement(RefinementPolicy::SmallShape { max_elements: 1024 });
        let profile = ResourceProfile::new(64, SCRATCH, 4).unwrap();

        let small = plan(&profile, &Workload::new(256).unwrap(), &config).unwrap();
        assert_eq!(small.tile_elems, 512);

        let large = plan(&profile, &Workload::new(20_000).unwrap(), &config).unwrap();
        assert_eq!(large.tile_elems, 20_000);
        assert_eq!(large.used_workers, 1);
    }

    #[test]
    fn test_refinement_respects_capacity() {
        // 2 KiB scratch holds two 256-element fp32 tiles; the 512-element
        // floor is capped to that
        let profile = ResourceProfile::new(8, 2048, 4).unwrap();
        let plan = TilePlanner::default()
            .plan(&profile, &Workload::new(1000).unwrap())
            .unwrap();

        assert_eq!(plan.tile_elems, 256);
        assert_eq!(plan.used_workers, 4);
        assert!(plan.check_coverage());
        assert!(plan.verify(&profile, 2).is_ok());
    }

    #[test]
    fn test_large_workload_multiple_loops() {
        // 158 chunks, 4 per worker, so 40 of 48 workers are used
        let plan = plan_for(10_000_000, 2, 48);

        assert_eq!(plan.tile_elems, 63_488);
        assert_eq!(plan.used_workers, 40);
        assert_eq!(plan.outer_loops, 4);
        assert_eq!(plan.tail_outer_loops, 2);
        assert!(plan.check_coverage());
    }

    #[test]
    fn test_single_worker() {
        let plan = plan_for(100_000, 4, 1);

        assert_eq!(plan.used_workers, 1);
        assert_eq!(plan.tile_elems, 31_744);
        assert_eq!(plan.outer_loops, 4);
        assert_eq!(plan.tail_outer_loops, 4);
        assert_eq!(plan.tile_tail_elems, 100_000 - 3 * 31_744);
    }

    #[test]
    fn test_infeasible_scratch() {
        let profile = ResourceProfile::new(8, 8, 8).unwrap();
        let err = TilePlanner::default()
            .plan(&profile, &Workload::new(10).unwrap())
            .unwrap_err();

        assert_eq!(
            err,
            TilingError::InfeasibleTiling {
                scratch_bytes: 8,
                elem_bytes: 8,
                buffer_multiplicity: 2,
            }
        );
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let profile = ResourceProfile {
            worker_count: 0,
            scratch_bytes: SCRATCH,
            elem_bytes: 4,
        };
        let result = TilePlanner::default().plan(&profile, &Workload { total_elements: 10 });
        assert!(matches!(result, Err(TilingError::InvalidConfig(_))));
    }

    #[test]
    fn test_negative_workload_rejected() {
        let profile = ResourceProfile::new(8, SCRATCH, 4).unwrap();
        let result = TilePlanner::default().plan(&profile, &Workload { total_elements: -3 });
        assert!(matches!(result, Err(TilingError::InvalidShape { .. })));
    }

    #[test]
    fn test_validate_rejects_malformed_plans() {
        assert!(TilingPlan::empty().validate().is_ok());
        assert!(plan_for(40_100, 4, 64).validate().is_ok());

        // passes the coverage identity with a negative worker count
        let negative = TilingPlan {
            total_elements: 10,
            tile_elems: 1,
            used_workers: -1,
            outer_loops: 1,
            tail_outer_loops: 1,
            tile_tail_elems: 12,
        };
        assert!(negative.check_coverage());
        assert!(negative.validate().is_err());

        // zero workers with non-zero loop fields
        let idle = TilingPlan {
            total_elements: 0,
            tile_elems: 5,
            used_workers: 0,
            outer_loops: 1,
            tail_outer_loops: 1,
            tile_tail_elems: 5,
        };
        assert!(idle.check_coverage());
        assert!(idle.validate().is_err());

        let overflowing = TilingPlan {
            total_elements: 1,
            tile_elems: i64::MAX,
            used_workers: 1,
            outer_loops: 2,
            tail_outer_loops: 1,
            tile_tail_elems: 1,
        };
        assert!(overflowing.check_coverage());
        assert!(overflowing.validate().is_err());
        assert_eq!(overflowing.worker_elems(), i64::MAX);
    }

    #[test]
    fn test_more_scratch_can_shrink_refined_tile() {
        // 4808 bytes: 601-element tiles already occupy all 8 workers.
        // 10400 bytes: 1300-element tiles leave workers idle, so the split
        // is refined to 4800 / 8 = 600.
        let planner = TilePlanner::default();
        let workload = Workload::new(4800).unwrap();

        let small = ResourceProfile::new(8, 4808, 4).unwrap();
        let large = ResourceProfile::new(8, 10_400, 4).unwrap();
        let a = planner.plan(&small, &workload).unwrap();
        let b = planner.plan(&large, &workload).unwrap();

        assert_eq!(a.tile_elems, 601);
        assert_eq!(a.used_workers, 8);
        assert_eq!(b.tile_elems, 600);
        assert_eq!(b.used_workers, 8);
        assert!(a.check_coverage() && b.check_coverage());
    }

    #[test]
    fn test_verify_detects_broken_plan() {
        let profile = ResourceProfile::new(64, SCRATCH, 4).unwrap();
        let mut plan = plan_for(256, 4, 64);
        assert!(plan.verify(&profile, 2).is_ok());

        plan.tile_tail_elems += 1;
        assert!(plan.verify(&profile, 2).is_err());
    }
}
