//! Plan record serialization
//!
//! A plan is handed to the consumer as a flat sequence of `i64` words whose
//! order is fixed per operator family. [`RecordLayout`] names that order and
//! [`PlanRecord`] bundles the plan with its dispatch key and workspace size.
//!
//! # Examples
//!
//! ```
//! use ubtile_core::ElementKind;
//! use ubtile_planner::{derive_blocks, PlanRecord, RecordLayout, TilingVariant};
//!
//! let plan = derive_blocks(512, 1300, 8).unwrap();
//! let record = PlanRecord::new(plan, TilingVariant::Dense(ElementKind::Float32), 3, 32);
//!
//! let layout = RecordLayout::elementwise();
//! let words = record.encode(&layout);
//! assert_eq!(words.len(), 8);
//! assert_eq!(RecordLayout::decode(&layout, &words).unwrap(), plan);
//! ```

use crate::key::TilingVariant;
use crate::tiling::TilingPlan;
use std::collections::HashSet;
use ubtile_core::{TilingError, TilingResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One integer slot of a serialized plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlanField {
    TotalElements,
    UsedWorkers,
    OuterLoops,
    TailOuterLoops,
    TileElems,
    TileTailElems,
    /// `outer_loops * tile_elems`
    WorkerElems,
    /// Elements of the last worker
    TailWorkerElems,
}

impl PlanField {
    /// Fields needed to rebuild a plan from its words
    pub const REQUIRED: [PlanField; 5] = [
        PlanField::UsedWorkers,
        PlanField::OuterLoops,
        PlanField::TailOuterLoops,
        PlanField::TileElems,
        PlanField::TileTailElems,
    ];

    /// Value of this field in a plan
    pub fn read(&self, plan: &TilingPlan) -> i64 {
        match self {
            PlanField::TotalElements => plan.total_elements,
            PlanField::UsedWorkers => plan.used_workers,
            PlanField::OuterLoops => plan.outer_loops,
            PlanField::TailOuterLoops => plan.tail_outer_loops,
            PlanField::TileElems => plan.tile_elems,
            PlanField::TileTailElems => plan.tile_tail_elems,
            PlanField::WorkerElems => plan.worker_elems(),
            PlanField::TailWorkerElems => plan.tail_worker_elems(),
        }
    }
}

/// Field order of a serialized plan
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecordLayout {
    fields: Vec<PlanField>,
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self::elementwise()
    }
}

impl RecordLayout {
    /// Create a layout
    ///
    /// # Errors
    ///
    /// Returns [`TilingError::Record`] if a field repeats or a field of
    /// [`PlanField::REQUIRED`] is missing.
    pub fn new(fields: Vec<PlanField>) -> TilingResult<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(*field) {
                return Err(TilingError::Record(format!("duplicate field {:?}", field)));
            }
        }
        if let Some(missing) = PlanField::REQUIRED.iter().find(|f| !seen.contains(f)) {
            return Err(TilingError::Record(format!(
                "layout is missing required field {:?}",
                missing
            )));
        }
        Ok(Self { fields })
    }

    /// Eight-word layout of simple elementwise operators
    pub fn elementwise() -> Self {
        Self {
            fields: vec![
                PlanField::TotalElements,
                PlanField::UsedWorkers,
                PlanField::WorkerElems,
                PlanField::TailWorkerElems,
                PlanField::TileElems,
                PlanField::OuterLoops,
                PlanField::TailOuterLoops,
                PlanField::TileTailElems,
            ],
        }
    }

    /// Seven-word layout of broadcast operators
    pub fn broadcast() -> Self {
        Self {
            fields: vec![
                PlanField::UsedWorkers,
                PlanField::OuterLoops,
                PlanField::TailOuterLoops,
                PlanField::TileElems,
                PlanField::TileTailElems,
                PlanField::WorkerElems,
                PlanField::TailWorkerElems,
            ],
        }
    }

    pub fn fields(&self) -> &[PlanField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serialize a plan in this layout's field order
    pub fn encode(&self, plan: &TilingPlan) -> Vec<i64> {
        self.fields.iter().map(|field| field.read(plan)).collect()
    }

    /// Rebuild a plan from its words.
    ///
    /// Derived fields present in the layout are cross-checked against the
    /// rebuilt plan. When the layout has no `TotalElements` slot, the total is
    /// recomputed from the coverage identity.
    ///
    /// # Errors
    ///
    /// Returns [`TilingError::Record`] on a word-count mismatch, if the rebuilt
    /// plan breaks a structural invariant (see [`TilingPlan::validate`]) or if a
    /// derived field disagrees with it.
    pub fn decode(&self, words: &[i64]) -> TilingResult<TilingPlan> {
        if words.len() != self.fields.len() {
            return Err(TilingError::Record(format!(
                "expected {} words, got {}",
                self.fields.len(),
                words.len()
            )));
        }

        let get = |wanted: PlanField| {
            self.fields
                .iter()
                .position(|&f| f == wanted)
                .map(|i| words[i])
        };
        let require = |wanted: PlanField| {
            get(wanted).ok_or_else(|| {
                TilingError::Record(format!("layout is missing required field {:?}", wanted))
            })
        };

        let mut plan = TilingPlan {
            total_elements: 0,
            tile_elems: require(PlanField::TileElems)?,
            used_workers: require(PlanField::UsedWorkers)?,
            outer_loops: require(PlanField::OuterLoops)?,
            tail_outer_loops: require(PlanField::TailOuterLoops)?,
            tile_tail_elems: require(PlanField::TileTailElems)?,
        };

        let covered = plan
            .covered_elements()
            .and_then(|c| i64::try_from(c).ok())
            .ok_or_else(|| {
                TilingError::Record("covered element count overflows i64".to_string())
            })?;
        plan.total_elements = get(PlanField::TotalElements).unwrap_or(covered);
        plan.validate()?;

        for (field, &word) in self.fields.iter().zip(words) {
            if field.read(&plan) != word {
                return Err(TilingError::Record(format!(
                    "field {:?} holds {}, plan implies {}",
                    field,
                    word,
                    field.read(&plan)
                )));
            }
        }

        Ok(plan)
    }
}

/// Everything the consumer receives for one launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlanRecord {
    pub plan: TilingPlan,
    pub variant: TilingVariant,
    pub tiling_key: u64,
    pub workspace_bytes: u64,
}

impl PlanRecord {
    pub fn new(
        plan: TilingPlan,
        variant: TilingVariant,
        tiling_key: u64,
        workspace_bytes: u64,
    ) -> Self {
        Self {
            plan,
            variant,
            tiling_key,
            workspace_bytes,
        }
    }

    /// Plan words in layout order
    pub fn encode(&self, layout: &RecordLayout) -> Vec<i64> {
        layout.encode(&self.plan)
    }

    /// Plan words as little-endian bytes
    pub fn to_le_bytes(&self, layout: &RecordLayout) -> Vec<u8> {
        self.encode(layout)
            .iter()
            .flat_map(|word| word.to_le_bytes())
            .collect()
    }
}

/// Decode little-endian plan bytes written by [`PlanRecord::to_le_bytes`]
///
/// # Errors
///
/// Returns [`TilingError::Record`] if the byte count is not a multiple of 8
/// or the words do not form a valid plan for `layout`.
pub fn decode_le_bytes(layout: &RecordLayout, bytes: &[u8]) -> TilingResult<TilingPlan> {
    if bytes.len() % 8 != 0 {
        return Err(TilingError::Record(format!(
            "byte length {} is not a multiple of 8",
            bytes.len()
        )));
    }

    let words: Vec<i64> = bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            i64::from_le_bytes(word)
        })
        .collect();

    layout.decode(&words)
}
