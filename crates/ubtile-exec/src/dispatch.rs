//! Plan dispatch
//!
//! Executes an elementwise kernel over a flat buffer following a
//! [`TilingPlan`]: one [`PingPongPipeline`] per used worker, each over its
//! own disjoint slice of the output. Workers never synchronize with each
//! other.

use crate::assignment::{assignments, WorkerAssignment};
use crate::config::ExecConfig;
use crate::pipeline::{PingPongPipeline, PipelineStats};
use anyhow::{bail, Context, Result};
use std::ops::Range;
use ubtile_planner::TilingPlan;

#[cfg(feature = "parallel")]
use scirs2_core::parallel_ops::*;

/// Summary of one dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub used_workers: usize,
    pub tiles: usize,
    pub elements: usize,
    /// Whether workers ran in parallel
    pub parallel: bool,
}

/// Plan consumer
///
/// # Example
///
/// ```
/// use ubtile_core::{ResourceProfile, Workload};
/// use ubtile_exec::{Dispatcher, ExecConfig};
/// use ubtile_planner::TilePlanner;
///
/// let profile = ResourceProfile::new(8, 4096, 4).unwrap();
/// let plan = TilePlanner::default()
///     .plan(&profile, &Workload::new(5000).unwrap())
///     .unwrap();
///
/// let input = vec![1.5f32; 5000];
/// let mut output = vec![0.0f32; 5000];
/// let report = Dispatcher::new(ExecConfig::sequential())
///     .dispatch(&plan, &input, &mut output, |src: &[f32], dst: &mut [f32]| {
///         dst.copy_from_slice(src);
///     })
///     .unwrap();
///
/// assert_eq!(report.elements, 5000);
/// assert!(output.iter().all(|&v| v == 1.5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    config: ExecConfig,
}

impl Dispatcher {
    pub fn new(config: ExecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Run `kernel` over every tile of `plan`.
    ///
    /// `input` and `output` must both hold exactly `plan.total_elements`
    /// elements. Each output element is written by exactly one tile.
    ///
    /// # Errors
    ///
    /// Fails on a malformed plan (see [`TilingPlan::validate`]), a buffer
    /// length mismatch or a failed worker pipeline. Nothing is written to
    /// `output` unless the plan is valid and the lengths match.
    pub fn dispatch<T, K>(
        &self,
        plan: &TilingPlan,
        input: &[T],
        output: &mut [T],
        kernel: K,
    ) -> Result<DispatchReport>
    where
        T: Copy + Send + Sync,
        K: Fn(&[T], &mut [T]) + Sync,
    {
        let work = assignments(plan)?;
        let total = usize::try_from(plan.total_elements)
            .with_context(|| format!("invalid element count {}", plan.total_elements))?;
        if input.len() != total || output.len() != total {
            bail!(
                "plan covers {} elements but input has {} and output has {}",
                total,
                input.len(),
                output.len()
            );
        }

        let parallel = self.config.should_use_parallel(work.len());

        let mut jobs = Vec::with_capacity(work.len());
        let mut rest = output;
        for assignment in &work {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(assignment.len());
            jobs.push((*assignment, &input[assignment.range()], head));
            rest = tail;
        }

        let run = |(assignment, src, dst): (WorkerAssignment, &[T], &mut [T])| {
            run_worker(&assignment, src, dst, &kernel)
        };

        #[cfg(feature = "parallel")]
        let stats = if parallel {
            jobs.into_par_iter()
                .map(run)
                .collect::<Result<Vec<_>>>()?
        } else {
            jobs.into_iter().map(run).collect::<Result<Vec<_>>>()?
        };

        #[cfg(not(feature = "parallel"))]
        let stats = jobs.into_iter().map(run).collect::<Result<Vec<_>>>()?;

        let totals = stats
            .into_iter()
            .fold(PipelineStats::default(), |acc, s| acc + s);

        tracing::debug!(
            used_workers = work.len(),
            tiles = totals.tiles,
            elements = totals.elements,
            parallel,
            "plan dispatched"
        );

        Ok(DispatchReport {
            used_workers: work.len(),
            tiles: totals.tiles,
            elements: totals.elements,
            parallel,
        })
    }
}

fn run_worker<T, K>(
    assignment: &WorkerAssignment,
    input: &[T],
    output: &mut [T],
    kernel: &K,
) -> Result<PipelineStats>
where
    T: Copy + Send + Sync,
    K: Fn(&[T], &mut [T]) + Sync,
{
    let tiles: Vec<Range<usize>> = assignment.tiles().collect();
    PingPongPipeline::new(assignment.tile_elems)
        .run(input, output, &tiles, kernel)
        .with_context(|| format!("worker {} failed", assignment.worker_id))
}

/// Dispatch with the default configuration
///
/// Convenience wrapper around [`Dispatcher::dispatch`].
pub fn dispatch<T, K>(
    plan: &TilingPlan,
    input: &[T],
    output: &mut [T],
    kernel: K,
) -> Result<DispatchReport>
where
    T: Copy + Send + Sync,
    K: Fn(&[T], &mut [T]) + Sync,
{
    Dispatcher::default().dispatch(plan, input, output, kernel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ubtile_planner::derive_blocks;

    fn negate(src: &[i64], dst: &mut [i64]) {
        for (d, s) in dst.iter_mut().zip(src) {
            *d = -s;
        }
    }

    #[test]
    fn test_dispatch_sequential() {
        let plan = derive_blocks(10, 105, 4).unwrap();
        let input: Vec<i64> = (0..105).collect();
        let mut output = vec![0; 105];

        let report = Dispatcher::new(ExecConfig::sequential())
            .dispatch(&plan, &input, &mut output, negate)
            .unwrap();

        assert_eq!(report.used_workers, 4);
        assert_eq!(report.tiles, 11);
        assert_eq!(report.elements, 105);
        assert!(!report.parallel);
        assert!(output.iter().zip(&input).all(|(o, i)| *o == -*i));
    }

    #[test]
    fn test_dispatch_default() {
        let plan = derive_blocks(64, 1000, 8).unwrap();
        let input: Vec<i64> = (0..1000).collect();
        let mut output = vec![0; 1000];

        let report = dispatch(&plan, &input, &mut output, negate).unwrap();

        assert_eq!(report.parallel, cfg!(feature = "parallel"));
        assert_eq!(report.elements, 1000);
        assert!(output.iter().zip(&input).all(|(o, i)| *o == -*i));
    }

    #[test]
    fn test_empty_plan() {
        let report = dispatch::<i64, _>(&TilingPlan::empty(), &[], &mut [], negate).unwrap();
        assert_eq!(report, DispatchReport::default());
    }

    #[test]
    fn test_length_mismatch() {
        let plan = derive_blocks(10, 100, 4).unwrap();
        let input = vec![0i64; 100];
        let mut short = vec![0i64; 99];
        assert!(dispatch(&plan, &input, &mut short, negate).is_err());
    }

    #[test]
    fn test_malformed_plan_rejected_before_kernel() {
        // total matches the buffers and the coverage identity holds
        let plan = TilingPlan {
            total_elements: 10,
            tile_elems: 1,
            used_workers: -1,
            outer_loops: 1,
            tail_outer_loops: 1,
            tile_tail_elems: 12,
        };
        let input = vec![1i64; 10];
        let mut output = vec![0i64; 10];

        let result = Dispatcher::new(ExecConfig::sequential()).dispatch(
            &plan,
            &input,
            &mut output,
            |_: &[i64], _: &mut [i64]| panic!("kernel must not run for a malformed plan"),
        );
        assert!(result.is_err());
        assert!(output.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_broken_plan_rejected() {
        let mut plan = derive_blocks(10, 100, 4).unwrap();
        plan.tile_tail_elems -= 1;

        let input = vec![0i64; 100];
        let mut output = vec![0i64; 100];
        assert!(dispatch(&plan, &input, &mut output, negate).is_err());
    }
}
