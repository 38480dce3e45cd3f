//! Per-worker assignments derived from a tiling plan
//!
//! Worker `w` starts at `w * outer_loops * tile_elems` and runs `outer_loops`
//! iterations of `tile_elems` elements, except the last worker, which runs
//! `tail_outer_loops` iterations and ends with a `tile_tail_elems` tile.

use anyhow::{Context, Result};
use std::ops::Range;
use ubtile_planner::TilingPlan;

/// Work of one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerAssignment {
    pub worker_id: usize,
    /// First element of the worker's contiguous range
    pub base_offset: usize,
    /// Inner loop iterations
    pub loops: usize,
    /// Elements per full tile
    pub tile_elems: usize,
    /// Elements of the final iteration
    pub last_tile_elems: usize,
}

impl WorkerAssignment {
    /// Elements this worker processes
    pub fn len(&self) -> usize {
        if self.loops == 0 {
            return 0;
        }
        (self.loops - 1) * self.tile_elems + self.last_tile_elems
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element range of the whole assignment
    pub fn range(&self) -> Range<usize> {
        self.base_offset..self.base_offset + self.len()
    }

    /// Tile ranges relative to `base_offset`, in loop order
    pub fn tiles(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.loops).map(move |i| {
            let start = i * self.tile_elems;
            let len = if i + 1 == self.loops {
                self.last_tile_elems
            } else {
                self.tile_elems
            };
            start..start + len
        })
    }
}

/// Expand a plan into one assignment per used worker.
///
/// An empty plan yields no assignments.
///
/// # Errors
///
/// Fails if the plan breaks a structural invariant (see
/// [`TilingPlan::validate`]) or its counts do not fit `usize`.
///
/// # Examples
///
/// ```
/// use ubtile_exec::assignments;
/// use ubtile_planner::derive_blocks;
///
/// let plan = derive_blocks(10, 105, 4).unwrap();
/// let work = assignments(&plan)?;
///
/// assert_eq!(work.len(), 4);
/// assert_eq!(work[3].base_offset, 90);
/// assert_eq!(work[3].loops, 2);
/// assert_eq!(work[3].last_tile_elems, 5);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn assignments(plan: &TilingPlan) -> Result<Vec<WorkerAssignment>> {
    plan.validate().context("malformed tiling plan")?;
    if plan.is_empty() {
        return Ok(Vec::new());
    }

    let count = |value: i64| {
        usize::try_from(value).with_context(|| format!("count {} does not fit usize", value))
    };
    let used = count(plan.used_workers)?;
    let tile = count(plan.tile_elems)?;
    let stride = count(plan.worker_elems())?;
    let outer = count(plan.outer_loops)?;
    let tail_outer = count(plan.tail_outer_loops)?;
    let tile_tail = count(plan.tile_tail_elems)?;

    Ok((0..used)
        .map(|worker_id| {
            let last = worker_id + 1 == used;
            WorkerAssignment {
                worker_id,
                base_offset: worker_id * stride,
                loops: if last { tail_outer } else { outer },
                tile_elems: tile,
                last_tile_elems: if last { tile_tail } else { tile },
            }
        })
        .collect())
}
