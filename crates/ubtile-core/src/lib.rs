//! # ubtile-core
//!
//! Core types and shape analysis for the ubtile tiling stack.
//!
//! This crate provides the inputs of the tile planner:
//!
//! - **Element kinds** ([`ElementKind`]) covering the 15 datatypes accepted by
//!   elementwise and broadcast operators, with raw host-tag decoding
//! - **Element size table** ([`ElementSizeTable`]) injected at startup instead
//!   of a global dtype → size map
//! - **Resource profile** ([`ResourceProfile`]): worker count, per-worker scratch
//!   bytes and element width
//! - **Workload** ([`Workload`]): the flattened element count of one invocation
//! - **Shape analyzer** ([`ShapeAnalyzer`]) normalizing raw platform/tensor
//!   descriptors into the two values above
//! - **Error taxonomy** ([`TilingError`]) shared by every ubtile crate
//!
//! ## Quick Start
//!
//! ```
//! use ubtile_core::{ElementKind, PlatformInfo, ShapeAnalyzer, TensorDesc};
//!
//! let analyzer = ShapeAnalyzer::default();
//! let platform = PlatformInfo::new(64, 253_952);
//! let tensor = TensorDesc::new(&[4, 4, 4, 4], ElementKind::Float32);
//!
//! let (profile, workload) = analyzer.analyze(&platform, &tensor).unwrap();
//! assert_eq!(profile.elem_bytes, 4);
//! assert_eq!(workload.total_elements, 256);
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`TilingResult`]. Platform failures
//! (non-positive core count or scratch size) are reported as
//! [`TilingError::PlatformQuery`] and must abort the operator: no kernel
//! launch is attempted.
//!
//! ```
//! use ubtile_core::{ElementKind, PlatformInfo, ShapeAnalyzer, TensorDesc, TilingError};
//!
//! let tensor = TensorDesc::new(&[16], ElementKind::Int8);
//! let err = ShapeAnalyzer::default()
//!     .analyze(&PlatformInfo::new(-1, 4096), &tensor)
//!     .unwrap_err();
//! assert!(matches!(err, TilingError::PlatformQuery { .. }));
//! ```
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization support

#![deny(warnings)]

pub mod analyzer;
pub mod error;
pub mod types;

#[cfg(test)]
mod property_tests;

pub use analyzer::{require_same_kind, AnalyzerConfig, ShapeAnalyzer};
pub use error::{TilingError, TilingResult};
pub use types::{
    is_valid_elem_bytes, ElementKind, ElementSizeTable, PlatformInfo, ResourceProfile, Shape,
    TensorDesc, Workload,
};
