//! Error types for tiling analysis and planning
//!
//! Every failure the analyzer or planner can report is a precondition
//! violation detected once and surfaced to the caller. None of them are
//! retryable, and none of them leave global state behind.
//!
//! # Examples
//!
//! ```
//! use ubtile_core::error::{TilingError, TilingResult};
//!
//! fn require_cores(core_count: i64) -> TilingResult<u32> {
//!     if core_count <= 0 {
//!         return Err(TilingError::PlatformQuery {
//!             what: "core count",
//!             value: core_count,
//!         });
//!     }
//!     Ok(core_count as u32)
//! }
//!
//! assert!(require_cores(0).is_err());
//! assert_eq!(require_cores(48).unwrap(), 48);
//! ```

use crate::types::ElementKind;
use thiserror::Error;

/// Top-level error type for tiling analysis and planning
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TilingError {
    /// The platform reported an unusable hardware limit (core count or scratch size <= 0)
    #[error("platform query returned unusable {what}: {value}")]
    PlatformQuery { what: &'static str, value: i64 },

    /// Tensors participating in one elementwise operation disagree on element type
    #[error("dtype mismatch: input {index} is {actual}, expected {expected}")]
    DtypeMismatch {
        index: usize,
        expected: ElementKind,
        actual: ElementKind,
    },

    /// Scratch budget cannot hold even one element per live buffer
    #[error(
        "infeasible tiling: {scratch_bytes} scratch bytes cannot hold {buffer_multiplicity} \
         buffers of {elem_bytes}-byte elements"
    )]
    InfeasibleTiling {
        scratch_bytes: u64,
        elem_bytes: u32,
        buffer_multiplicity: u32,
    },

    /// A profile, table or planner configuration violates its invariants
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Tensor shape cannot be flattened into a non-negative element count
    #[error("invalid shape {shape:?}: {reason}")]
    InvalidShape { shape: Vec<i64>, reason: String },

    /// Raw datatype tag or name does not map to a supported element kind
    #[error("unsupported dtype: {0}")]
    UnsupportedDtype(String),

    /// Plan record could not be encoded or decoded with the given layout
    #[error("plan record error: {0}")]
    Record(String),
}

impl TilingError {
    /// Whether the failure describes the platform rather than the input tensor
    pub fn is_platform_error(&self) -> bool {
        matches!(
            self,
            TilingError::PlatformQuery { .. } | TilingError::InfeasibleTiling { .. }
        )
    }
}

/// Result type for tiling operations
pub type TilingResult<T> = Result<T, TilingError>;
