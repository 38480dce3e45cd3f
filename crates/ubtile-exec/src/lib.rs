//! # ubtile-exec
//!
//! Reference consumer for ubtile tiling plans.
//!
//! This crate provides:
//! - [`assignments`] - per-worker offsets, loop counts and tail tiles of a plan
//! - [`PingPongPipeline`] - double-buffered copy-in / compute loop of one worker
//! - [`Dispatcher`] - data-parallel fan-out of all workers over a flat buffer
//!
//! With the `parallel` feature (default) workers run on the scirs2-core
//! thread pool; otherwise they run one after another on the calling thread.
//!
//! # Example
//!
//! ```
//! use ubtile_core::{ResourceProfile, Workload};
//! use ubtile_exec::dispatch;
//! use ubtile_planner::TilePlanner;
//!
//! let profile = ResourceProfile::new(16, 8192, 4).unwrap();
//! let plan = TilePlanner::default()
//!     .plan(&profile, &Workload::new(100_000).unwrap())
//!     .unwrap();
//!
//! let input: Vec<f32> = (0..100_000).map(|i| i as f32).collect();
//! let mut output = vec![0.0f32; 100_000];
//!
//! dispatch(&plan, &input, &mut output, |src: &[f32], dst: &mut [f32]| {
//!     for (d, s) in dst.iter_mut().zip(src) {
//!         *d = s.abs();
//!     }
//! })
//! .unwrap();
//!
//! assert_eq!(output[99_999], 99_999.0);
//! ```

#![deny(warnings)]

pub mod assignment;
pub mod config;
pub mod dispatch;
pub mod pipeline;

// Re-exports
pub use assignment::*;
pub use config::*;
pub use dispatch::*;
pub use pipeline::*;
