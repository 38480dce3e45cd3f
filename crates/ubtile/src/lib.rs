//! # ubtile - Tiling for Multi-Core Accelerators
//!
//! **Single-pass tile planning** for elementwise and broadcast operators on
//! accelerators whose cores each own a small scratch memory.
//!
//! This is the **meta crate** that re-exports all ubtile components for convenient access.
//!
//! ## Quick Start
//!
//! ```
//! use ubtile::prelude::*;
//!
//! let ctx = TilingContext::elementwise();
//! let platform = PlatformInfo::new(64, 253_952);
//! let tensor = TensorDesc::new(&[4, 4, 4, 4], ElementKind::Float32);
//!
//! let record = ctx.tile_operator(&platform, &tensor, ShapeCategory::Dense)?;
//! assert_eq!(record.plan.tile_elems, 512);
//! assert_eq!(record.plan.tile_tail_elems, 256);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Components
//!
//! ### Core Types ([`core`])
//!
//! Element kinds, size tables, platform and tensor descriptors, the shape
//! analyzer and the error type.
//!
//! ```
//! use ubtile::core::{ElementKind, ShapeAnalyzer, PlatformInfo};
//!
//! let kind = ElementKind::from_raw_tag(27).unwrap();
//! let profile = ShapeAnalyzer::default()
//!     .profile(&PlatformInfo::new(48, 196_608), kind)
//!     .unwrap();
//! assert_eq!(profile.elem_bytes, 2);
//! ```
//!
//! ### Tile Planning ([`planner`])
//!
//! Capacity-bound tiles, block factors, utilization refinement, dispatch keys
//! and plan records.
//!
//! ```
//! use ubtile::core::{ResourceProfile, Workload};
//! use ubtile::planner::{RecordLayout, TilePlanner};
//!
//! let profile = ResourceProfile::new(64, 253_952, 4).unwrap();
//! let plan = TilePlanner::default()
//!     .plan(&profile, &Workload::new(40_960).unwrap())
//!     .unwrap();
//! assert_eq!(plan.used_workers, 64);
//! assert_eq!(RecordLayout::broadcast().encode(&plan).len(), 7);
//! ```
//!
//! ### Plan Consumer ([`exec`])
//!
//! Per-worker assignments, the ping-pong tile pipeline and parallel dispatch.
//!
//! ```
//! use ubtile::exec::dispatch;
//! use ubtile::planner::derive_blocks;
//!
//! let plan = derive_blocks(16, 100, 4).unwrap();
//! let input = vec![3u8; 100];
//! let mut output = vec![0u8; 100];
//! dispatch(&plan, &input, &mut output, |src: &[u8], dst: &mut [u8]| {
//!     dst.copy_from_slice(src);
//! })
//! .unwrap();
//! assert_eq!(output, input);
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): run consumer workers on the scirs2-core thread pool
//! - `serde`: serialize configuration, profiles, plans and records
//! - `tracing`: install a `tracing-subscriber` via [`tracing_support::init_tracing`]
//! - `full`: enable all features

#![deny(warnings)]

// Re-export all components
pub use ubtile_core as core;
pub use ubtile_exec as exec;
pub use ubtile_planner as planner;

pub mod tracing_support;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! # Example
    //!
    //! ```
    //! use ubtile::prelude::*;
    //!
    //! let plan = plan(
    //!     &ResourceProfile::new(8, 65_536, 2).unwrap(),
    //!     &Workload::new(0).unwrap(),
    //!     &PlannerConfig::default(),
    //! )
    //! .unwrap();
    //! assert!(plan.is_empty());
    //! ```

    // Core types
    pub use crate::core::{
        ElementKind, PlatformInfo, ResourceProfile, ShapeAnalyzer, TensorDesc, TilingError,
        TilingResult, Workload,
    };

    // Planner
    pub use crate::planner::{
        derive_blocks, plan, KeyTable, PlanRecord, PlannerConfig, RecordLayout, RefinementPolicy,
        ShapeCategory, TilePlanner, TilingContext, TilingKeyStrategy, TilingPlan, TilingVariant,
        WorkspacePolicy,
    };

    // Execution
    pub use crate::exec::{assignments, dispatch, Dispatcher, ExecConfig, PingPongPipeline};
}
