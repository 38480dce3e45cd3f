//! Tiling variants and dispatch keys
//!
//! The consumer selects a compiled compute-kernel variant from the element
//! kind and the shape category of the operator. [`TilingVariant`] names that
//! choice explicitly; a [`TilingKeyStrategy`] turns it into the small integer
//! the launch mechanism expects.

use std::fmt;
use ubtile_core::ElementKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shape category of an operator invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeCategory {
    /// Same-shape inputs, processed as one flat range
    #[default]
    Dense,
    /// Only one dimension after collapsing
    SingleDim,
    /// Broadcast that needs an explicit multi-dimensional loop
    BroadcastWithLoop,
    /// Broadcast expressible without a loop (scalar or trailing-dim broadcast)
    BroadcastNoLoop,
}

/// Compute-kernel variant chosen for a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TilingVariant {
    Dense(ElementKind),
    SingleDim(ElementKind),
    BroadcastWithLoop(ElementKind),
    BroadcastNoLoop(ElementKind),
}

impl TilingVariant {
    pub fn new(category: ShapeCategory, kind: ElementKind) -> Self {
        match category {
            ShapeCategory::Dense => TilingVariant::Dense(kind),
            ShapeCategory::SingleDim => TilingVariant::SingleDim(kind),
            ShapeCategory::BroadcastWithLoop => TilingVariant::BroadcastWithLoop(kind),
            ShapeCategory::BroadcastNoLoop => TilingVariant::BroadcastNoLoop(kind),
        }
    }

    pub fn kind(&self) -> ElementKind {
        match *self {
            TilingVariant::Dense(kind)
            | TilingVariant::SingleDim(kind)
            | TilingVariant::BroadcastWithLoop(kind)
            | TilingVariant::BroadcastNoLoop(kind) => kind,
        }
    }

    pub fn category(&self) -> ShapeCategory {
        match self {
            TilingVariant::Dense(_) => ShapeCategory::Dense,
            TilingVariant::SingleDim(_) => ShapeCategory::SingleDim,
            TilingVariant::BroadcastWithLoop(_) => ShapeCategory::BroadcastWithLoop,
            TilingVariant::BroadcastNoLoop(_) => ShapeCategory::BroadcastNoLoop,
        }
    }
}

impl fmt::Display for TilingVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}<{}>", self.category(), self.kind())
    }
}

/// Pluggable tiling-key derivation
pub trait TilingKeyStrategy: fmt::Debug + Send + Sync {
    /// Kernel variant for an element kind and shape category
    fn variant(&self, kind: ElementKind, category: ShapeCategory) -> TilingVariant {
        TilingVariant::new(category, kind)
    }

    /// Dispatch key of a variant
    fn key(&self, variant: TilingVariant) -> u64;
}

/// Key offsets per shape category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CategoryOffsets {
    pub dense: u64,
    pub single_dim: u64,
    pub broadcast_no_loop: u64,
    pub broadcast_with_loop: u64,
}

impl Default for CategoryOffsets {
    fn default() -> Self {
        Self {
            dense: 0,
            single_dim: 10,
            broadcast_no_loop: 100,
            broadcast_with_loop: 200,
        }
    }
}

impl CategoryOffsets {
    pub fn offset(&self, category: ShapeCategory) -> u64 {
        match category {
            ShapeCategory::Dense => self.dense,
            ShapeCategory::SingleDim => self.single_dim,
            ShapeCategory::BroadcastNoLoop => self.broadcast_no_loop,
            ShapeCategory::BroadcastWithLoop => self.broadcast_with_loop,
        }
    }
}

/// Table-driven key strategy: `key = base_tag(kind) + offset(category)`.
///
/// Base tags default to the element width (1 → 1, 2 → 2, 4 → 3, 8 → 4), with
/// `bfloat16` split off as 5 since it needs its own conversion path.
///
/// # Example
///
/// ```
/// use ubtile_core::ElementKind;
/// use ubtile_planner::{KeyTable, ShapeCategory, TilingKeyStrategy};
///
/// let keys = KeyTable::default();
/// let variant = keys.variant(ElementKind::Float16, ShapeCategory::BroadcastWithLoop);
/// assert_eq!(keys.key(variant), 202);
///
/// let custom = KeyTable::default().with_base(ElementKind::Float16, 7);
/// assert_eq!(custom.key(variant), 207);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyTable {
    base: [u64; ElementKind::COUNT],
    offsets: CategoryOffsets,
}

impl Default for KeyTable {
    fn default() -> Self {
        let mut base = [0; ElementKind::COUNT];
        for kind in ElementKind::ALL {
            base[kind.index()] = match kind.natural_size() {
                1 => 1,
                2 => 2,
                4 => 3,
                _ => 4,
            };
        }
        base[ElementKind::BFloat16.index()] = 5;

        Self {
            base,
            offsets: CategoryOffsets::default(),
        }
    }
}

impl KeyTable {
    pub fn with_base(mut self, kind: ElementKind, tag: u64) -> Self {
        self.base[kind.index()] = tag;
        self
    }

    pub fn with_offsets(mut self, offsets: CategoryOffsets) -> Self {
        self.offsets = offsets;
        self
    }

    /// Base tag for an element kind
    pub fn base_tag(&self, kind: ElementKind) -> u64 {
        self.base[kind.index()]
    }
}

impl TilingKeyStrategy for KeyTable {
    fn key(&self, variant: TilingVariant) -> u64 {
        self.base_tag(variant.kind()) + self.offsets.offset(variant.category())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_tags() {
        let keys = KeyTable::default();

        assert_eq!(keys.base_tag(ElementKind::Int8), 1);
        assert_eq!(keys.base_tag(ElementKind::Bool), 1);
        assert_eq!(keys.base_tag(ElementKind::Float16), 2);
        assert_eq!(keys.base_tag(ElementKind::BFloat16), 5);
        assert_eq!(keys.base_tag(ElementKind::Float32), 3);
        assert_eq!(keys.base_tag(ElementKind::Complex64), 4);
    }

    #[test]
    fn test_dense_key_is_base_tag() {
        let keys = KeyTable::default();
        for kind in ElementKind::ALL {
            let variant = keys.variant(kind, ShapeCategory::Dense);
            assert_eq!(keys.key(variant), keys.base_tag(kind));
        }
    }

    #[test]
    fn test_category_offsets() {
        let keys = KeyTable::default();

        let single = keys.variant(ElementKind::Float32, ShapeCategory::SingleDim);
        let no_loop = keys.variant(ElementKind::Float32, ShapeCategory::BroadcastNoLoop);
        let with_loop = keys.variant(ElementKind::Float32, ShapeCategory::BroadcastWithLoop);

        assert_eq!(keys.key(single), 13);
        assert_eq!(keys.key(no_loop), 103);
        assert_eq!(keys.key(with_loop), 203);
    }

    #[test]
    fn test_custom_offsets() {
        let keys = KeyTable::default().with_offsets(CategoryOffsets {
            dense: 1000,
            single_dim: 2000,
            broadcast_no_loop: 3000,
            broadcast_with_loop: 4000,
        });
        let variant = TilingVariant::Dense(ElementKind::Int64);
        assert_eq!(keys.key(variant), 1004);
    }

    #[test]
    fn test_variant_accessors() {
        let variant = TilingVariant::new(ShapeCategory::BroadcastNoLoop, ElementKind::UInt8);

        assert_eq!(variant, TilingVariant::BroadcastNoLoop(ElementKind::UInt8));
        assert_eq!(variant.kind(), ElementKind::UInt8);
        assert_eq!(variant.category(), ShapeCategory::BroadcastNoLoop);
        assert_eq!(variant.to_string(), "BroadcastNoLoop<uint8>");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_key_table_serde_roundtrip() {
        let table = KeyTable::default()
            .with_base(ElementKind::Float16, 42)
            .with_offsets(CategoryOffsets {
                dense: 1,
                single_dim: 2,
                broadcast_no_loop: 3,
                broadcast_with_loop: 4,
            });

        let json = serde_json::to_string(&table).unwrap();
        let back: KeyTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.key(TilingVariant::BroadcastNoLoop(ElementKind::Float16)), 45);
    }
}
