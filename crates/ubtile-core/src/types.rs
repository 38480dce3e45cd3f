//! Core type definitions for tiling analysis.
//!
//! This module defines the values exchanged between the analyzer, the
//! planner and the plan consumer:
//!
//! - Element datatypes ([`ElementKind`]) and the injected byte-width table ([`ElementSizeTable`])
//! - Raw platform and tensor descriptors ([`PlatformInfo`], [`TensorDesc`])
//! - Normalized planner inputs ([`ResourceProfile`], [`Workload`])
//!
//! # Examples
//!
//! ```
//! use ubtile_core::{ElementKind, ResourceProfile, Workload};
//!
//! let profile = ResourceProfile::new(64, 253_952, ElementKind::Float32.natural_size()).unwrap();
//! let workload = Workload::from_shape(&[4, 4, 4, 4]).unwrap();
//!
//! assert_eq!(profile.elem_bytes, 4);
//! assert_eq!(workload.total_elements, 256);
//! ```

use crate::error::{TilingError, TilingResult};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shape type using SmallVec to avoid heap allocation for common cases.
///
/// Dimensions are signed because host frameworks report them that way;
/// negative values are rejected when the shape is flattened.
pub type Shape = SmallVec<[i64; 6]>;

/// Element datatype of an operator's working tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ElementKind {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float16,
    BFloat16,
    Float32,
    Float64,
    Bool,
    /// Pair of f16 components
    Complex32,
    /// Pair of f32 components
    Complex64,
}

impl ElementKind {
    /// Number of supported element kinds
    pub const COUNT: usize = 15;

    /// All element kinds in table order
    pub const ALL: [ElementKind; Self::COUNT] = [
        ElementKind::Int8,
        ElementKind::UInt8,
        ElementKind::Int16,
        ElementKind::UInt16,
        ElementKind::Int32,
        ElementKind::UInt32,
        ElementKind::Int64,
        ElementKind::UInt64,
        ElementKind::Float16,
        ElementKind::BFloat16,
        ElementKind::Float32,
        ElementKind::Float64,
        ElementKind::Bool,
        ElementKind::Complex32,
        ElementKind::Complex64,
    ];

    /// Position of this kind in [`ElementKind::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Storage size of one element in bytes
    pub fn natural_size(self) -> u32 {
        match self {
            ElementKind::Int8 | ElementKind::UInt8 | ElementKind::Bool => 1,
            ElementKind::Int16
            | ElementKind::UInt16
            | ElementKind::Float16
            | ElementKind::BFloat16 => 2,
            ElementKind::Int32
            | ElementKind::UInt32
            | ElementKind::Float32
            | ElementKind::Complex32 => 4,
            ElementKind::Int64
            | ElementKind::UInt64
            | ElementKind::Float64
            | ElementKind::Complex64 => 8,
        }
    }

    /// Decode the host graph-engine datatype numbering.
    ///
    /// # Errors
    ///
    /// Returns [`TilingError::UnsupportedDtype`] for tags outside the supported set
    /// (strings, quantized and sub-byte types included).
    pub fn from_raw_tag(tag: u32) -> TilingResult<Self> {
        let kind = match tag {
            0 => ElementKind::Float32,
            1 => ElementKind::Float16,
            2 => ElementKind::Int8,
            3 => ElementKind::Int32,
            4 => ElementKind::UInt8,
            6 => ElementKind::Int16,
            7 => ElementKind::UInt16,
            8 => ElementKind::UInt32,
            9 => ElementKind::Int64,
            10 => ElementKind::UInt64,
            11 => ElementKind::Float64,
            12 => ElementKind::Bool,
            16 => ElementKind::Complex64,
            27 => ElementKind::BFloat16,
            33 => ElementKind::Complex32,
            other => {
                return Err(TilingError::UnsupportedDtype(format!("raw tag {}", other)));
            }
        };
        Ok(kind)
    }

    /// Inverse of [`ElementKind::from_raw_tag`]
    pub fn raw_tag(self) -> u32 {
        match self {
            ElementKind::Float32 => 0,
            ElementKind::Float16 => 1,
            ElementKind::Int8 => 2,
            ElementKind::Int32 => 3,
            ElementKind::UInt8 => 4,
            ElementKind::Int16 => 6,
            ElementKind::UInt16 => 7,
            ElementKind::UInt32 => 8,
            ElementKind::Int64 => 9,
            ElementKind::UInt64 => 10,
            ElementKind::Float64 => 11,
            ElementKind::Bool => 12,
            ElementKind::Complex64 => 16,
            ElementKind::BFloat16 => 27,
            ElementKind::Complex32 => 33,
        }
    }

    /// Canonical lower-case name
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Int8 => "int8",
            ElementKind::UInt8 => "uint8",
            ElementKind::Int16 => "int16",
            ElementKind::UInt16 => "uint16",
            ElementKind::Int32 => "int32",
            ElementKind::UInt32 => "uint32",
            ElementKind::Int64 => "int64",
            ElementKind::UInt64 => "uint64",
            ElementKind::Float16 => "float16",
            ElementKind::BFloat16 => "bfloat16",
            ElementKind::Float32 => "float32",
            ElementKind::Float64 => "float64",
            ElementKind::Bool => "bool",
            ElementKind::Complex32 => "complex32",
            ElementKind::Complex64 => "complex64",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(
            self,
            ElementKind::Float16 | ElementKind::BFloat16 | ElementKind::Float32 | ElementKind::Float64
        )
    }

    pub fn is_complex(self) -> bool {
        matches!(self, ElementKind::Complex32 | ElementKind::Complex64)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementKind {
    type Err = TilingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_lowercase().as_str() {
            "int8" | "i8" => ElementKind::Int8,
            "uint8" | "u8" => ElementKind::UInt8,
            "int16" | "i16" => ElementKind::Int16,
            "uint16" | "u16" => ElementKind::UInt16,
            "int32" | "i32" => ElementKind::Int32,
            "uint32" | "u32" => ElementKind::UInt32,
            "int64" | "i64" => ElementKind::Int64,
            "uint64" | "u64" => ElementKind::UInt64,
            "float16" | "fp16" | "half" | "f16" => ElementKind::Float16,
            "bfloat16" | "bf16" => ElementKind::BFloat16,
            "float32" | "fp32" | "float" | "f32" => ElementKind::Float32,
            "float64" | "fp64" | "double" | "f64" => ElementKind::Float64,
            "bool" => ElementKind::Bool,
            "complex32" => ElementKind::Complex32,
            "complex64" => ElementKind::Complex64,
            _ => return Err(TilingError::UnsupportedDtype(s.to_string())),
        };
        Ok(kind)
    }
}

/// Returns true for the element widths the planner accepts
pub fn is_valid_elem_bytes(bytes: u32) -> bool {
    matches!(bytes, 1 | 2 | 4 | 8)
}

/// Explicit dtype → byte-width table injected into the analyzer.
///
/// Defaults to [`ElementKind::natural_size`] for every kind. Overrides let a
/// platform compute in a wider type than it stores (for instance promoting
/// `float16` inputs to `float32` scratch buffers).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElementSizeTable {
    sizes: [u32; ElementKind::COUNT],
}

impl Default for ElementSizeTable {
    fn default() -> Self {
        let mut sizes = [0; ElementKind::COUNT];
        for kind in ElementKind::ALL {
            sizes[kind.index()] = kind.natural_size();
        }
        Self { sizes }
    }
}

impl ElementSizeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the working width of one element kind
    ///
    /// # Errors
    ///
    /// Returns [`TilingError::InvalidConfig`] unless `bytes` is 1, 2, 4 or 8.
    pub fn with_size(mut self, kind: ElementKind, bytes: u32) -> TilingResult<Self> {
        if !is_valid_elem_bytes(bytes) {
            return Err(TilingError::InvalidConfig(format!(
                "element width for {} must be 1, 2, 4 or 8 bytes, got {}",
                kind, bytes
            )));
        }
        self.sizes[kind.index()] = bytes;
        Ok(self)
    }

    /// Working width of `kind` in bytes
    pub fn size_of(&self, kind: ElementKind) -> u32 {
        self.sizes[kind.index()]
    }
}

/// Hardware limits as reported by the platform query collaborator.
///
/// Values are signed because a failed query surfaces as zero or a negative
/// sentinel; the analyzer turns those into [`TilingError::PlatformQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlatformInfo {
    /// Number of vector cores available to the operator
    pub core_count: i64,
    /// Per-core scratch (unified buffer) size in bytes
    pub scratch_bytes: i64,
}

impl PlatformInfo {
    pub fn new(core_count: i64, scratch_bytes: i64) -> Self {
        Self {
            core_count,
            scratch_bytes,
        }
    }
}

/// Tensor description handed to the analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TensorDesc {
    pub shape: Shape,
    pub kind: ElementKind,
}

impl TensorDesc {
    pub fn new(shape: &[i64], kind: ElementKind) -> Self {
        Self {
            shape: SmallVec::from_slice(shape),
            kind,
        }
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

/// Normalized hardware resources for one tiling invocation.
///
/// Invariant: `worker_count > 0`, `scratch_bytes > 0`, `elem_bytes ∈ {1, 2, 4, 8}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResourceProfile {
    /// Parallel execution units available
    pub worker_count: u32,
    /// Scratch bytes per worker, bookkeeping overhead already reserved
    pub scratch_bytes: u64,
    /// Bytes per element of the working datatype
    pub elem_bytes: u32,
}

impl ResourceProfile {
    /// Create a validated profile
    ///
    /// # Errors
    ///
    /// Returns [`TilingError::InvalidConfig`] if any invariant is violated.
    pub fn new(worker_count: u32, scratch_bytes: u64, elem_bytes: u32) -> TilingResult<Self> {
        let profile = Self {
            worker_count,
            scratch_bytes,
            elem_bytes,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Check the profile invariants
    pub fn validate(&self) -> TilingResult<()> {
        if self.worker_count == 0 {
            return Err(TilingError::InvalidConfig(
                "worker count must be positive".to_string(),
            ));
        }
        if self.scratch_bytes == 0 {
            return Err(TilingError::InvalidConfig(
                "scratch size must be positive".to_string(),
            ));
        }
        if !is_valid_elem_bytes(self.elem_bytes) {
            return Err(TilingError::InvalidConfig(format!(
                "element width must be 1, 2, 4 or 8 bytes, got {}",
                self.elem_bytes
            )));
        }
        Ok(())
    }
}

/// Flattened amount of work for one operator invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Workload {
    pub total_elements: i64,
}

impl Workload {
    /// Create a workload from an element count
    ///
    /// # Errors
    ///
    /// Returns [`TilingError::InvalidShape`] for negative counts.
    pub fn new(total_elements: i64) -> TilingResult<Self> {
        if total_elements < 0 {
            return Err(TilingError::InvalidShape {
                shape: vec![total_elements],
                reason: "element count cannot be negative".to_string(),
            });
        }
        Ok(Self { total_elements })
    }

    /// Flatten a tensor shape.
    ///
    /// An empty shape is a scalar holding one element; any zero dimension
    /// yields an empty workload.
    ///
    /// # Errors
    ///
    /// Returns [`TilingError::InvalidShape`] on negative dimensions or if the
    /// product overflows `i64`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ubtile_core::Workload;
    ///
    /// assert_eq!(Workload::from_shape(&[2, 3, 4]).unwrap().total_elements, 24);
    /// assert_eq!(Workload::from_shape(&[]).unwrap().total_elements, 1);
    /// assert_eq!(Workload::from_shape(&[8, 0]).unwrap().total_elements, 0);
    /// assert!(Workload::from_shape(&[-1, 4]).is_err());
    /// ```
    pub fn from_shape(shape: &[i64]) -> TilingResult<Self> {
        let invalid = |reason: &str| TilingError::InvalidShape {
            shape: shape.to_vec(),
            reason: reason.to_string(),
        };

        if shape.iter().any(|&d| d < 0) {
            return Err(invalid("dimensions cannot be negative"));
        }

        let total = shape
            .iter()
            .try_fold(1i64, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| invalid("element count overflows i64"))?;

        Ok(Self {
            total_elements: total,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.total_elements == 0
    }
}
