//! # ubtile-planner
//!
//! Single-pass tile planning for elementwise and broadcast operators on
//! multi-core accelerators with small per-core scratch memory.
//!
//! Given a [`ResourceProfile`](ubtile_core::ResourceProfile) and a flattened
//! [`Workload`](ubtile_core::Workload), the planner decides how many workers
//! run, how many tiles each of them streams through scratch memory and how
//! large the tiles are, including the partial tails at both levels.
//!
//! ## Features
//!
//! - **Tile Planning**: capacity-sized tiles, block factors and a one-shot
//!   utilization refinement for small workloads
//! - **Configurable Policies**: buffer multiplicity, alignment, minimum tile
//!   size, refinement and workspace policy per operator family
//! - **Dispatch Keys**: explicit [`TilingVariant`]s mapped to integer keys by a
//!   pluggable [`TilingKeyStrategy`]
//! - **Plan Records**: fixed-order integer serialization with per-family layouts
//!
//! ## Quick Start
//!
//! ```
//! use ubtile_core::{ElementKind, PlatformInfo, TensorDesc};
//! use ubtile_planner::{RecordLayout, ShapeCategory, TilingContext};
//!
//! let ctx = TilingContext::elementwise();
//! let platform = PlatformInfo::new(64, 253_952);
//! let tensor = TensorDesc::new(&[1024, 1024], ElementKind::Float16);
//!
//! let record = ctx.tile_operator(&platform, &tensor, ShapeCategory::Dense).unwrap();
//! assert!(record.plan.check_coverage());
//!
//! let words = record.encode(&RecordLayout::elementwise());
//! assert_eq!(words[0], 1024 * 1024);
//! ```
//!
//! ## Invariants
//!
//! Every plan produced by [`TilePlanner::plan`]:
//! - covers the workload exactly once (checked in 128-bit arithmetic)
//! - keeps `tile_elems * elem_bytes * buffer_multiplicity` within scratch memory
//! - uses between 1 and `worker_count` workers, or none for an empty workload
//! - has a non-empty tail tile and a non-empty tail worker

#![deny(warnings)]

pub mod api;
pub mod config;
pub mod key;
pub mod record;
pub mod tiling;


// Re-exports
pub use api::*;
pub use config::*;
pub use key::*;
pub use record::*;
pub use tiling::*;
