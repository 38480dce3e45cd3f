//! Public tiling API
//!
//! Runs the full pipeline for one operator invocation:
//! analyzer → planner → dispatch key and workspace size.

use crate::config::PlannerConfig;
use crate::key::{KeyTable, ShapeCategory, TilingKeyStrategy};
use crate::record::PlanRecord;
use crate::tiling::TilePlanner;
use std::sync::Arc;
use ubtile_core::{
    require_same_kind, AnalyzerConfig, PlatformInfo, ShapeAnalyzer, TensorDesc, TilingError,
    TilingResult,
};

/// Analyzer, planner and key strategy configured for one operator family.
///
/// Built once at startup and shared; every call is a pure function of its
/// arguments.
///
/// # Example
///
/// ```
/// use ubtile_core::{ElementKind, PlatformInfo, TensorDesc};
/// use ubtile_planner::{ShapeCategory, TilingContext};
///
/// let ctx = TilingContext::elementwise();
/// let platform = PlatformInfo::new(64, 253_952);
/// let tensor = TensorDesc::new(&[4, 4, 4, 4], ElementKind::Float32);
///
/// let record = ctx.tile_operator(&platform, &tensor, ShapeCategory::Dense).unwrap();
/// assert_eq!(record.plan.tile_elems, 512);
/// assert_eq!(record.tiling_key, 3);
/// assert_eq!(record.workspace_bytes, 32);
/// ```
#[derive(Debug, Clone)]
pub struct TilingContext {
    analyzer: ShapeAnalyzer,
    planner: TilePlanner,
    keys: Arc<dyn TilingKeyStrategy>,
}

impl TilingContext {
    /// Create a context
    ///
    /// # Errors
    ///
    /// Returns [`TilingError::InvalidConfig`] if the planner configuration is invalid.
    pub fn new(
        analyzer: AnalyzerConfig,
        planner: PlannerConfig,
        keys: Arc<dyn TilingKeyStrategy>,
    ) -> TilingResult<Self> {
        Ok(Self {
            analyzer: ShapeAnalyzer::new(analyzer),
            planner: TilePlanner::new(planner)?,
            keys,
        })
    }

    /// Context for simple elementwise operators with default tables
    pub fn elementwise() -> Self {
        Self {
            analyzer: ShapeAnalyzer::default(),
            planner: TilePlanner::default(),
            keys: Arc::new(KeyTable::default()),
        }
    }

    /// Context for broadcast operators with default tables
    pub fn broadcast() -> Self {
        Self {
            analyzer: ShapeAnalyzer::default(),
            planner: TilePlanner::broadcast(),
            keys: Arc::new(KeyTable::default()),
        }
    }

    pub fn analyzer(&self) -> &ShapeAnalyzer {
        &self.analyzer
    }

    pub fn planner(&self) -> &TilePlanner {
        &self.planner
    }

    pub fn keys(&self) -> &dyn TilingKeyStrategy {
        self.keys.as_ref()
    }

    /// Plan one operator invocation over `tensor`
    pub fn tile_operator(
        &self,
        platform: &PlatformInfo,
        tensor: &TensorDesc,
        category: ShapeCategory,
    ) -> TilingResult<PlanRecord> {
        let (profile, workload) = self.analyzer.analyze(platform, tensor)?;
        let plan = self.planner.plan(&profile, &workload)?;

        let variant = self.keys.variant(tensor.kind, category);
        let tiling_key = self.keys.key(variant);
        let workspace_bytes = self.planner.config().workspace.bytes(&profile);

        tracing::debug!(
            %variant,
            tiling_key,
            workspace_bytes,
            "plan record ready"
        );

        Ok(PlanRecord::new(plan, variant, tiling_key, workspace_bytes))
    }

    /// Plan a multi-input elementwise operator.
    ///
    /// All inputs must share one element kind; the plan covers the first
    /// input's shape. Shape agreement between inputs is the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns [`TilingError::DtypeMismatch`] if the inputs disagree on element
    /// kind, or [`TilingError::InvalidShape`] when no inputs are given.
    pub fn tile_elementwise(
        &self,
        platform: &PlatformInfo,
        inputs: &[TensorDesc],
        category: ShapeCategory,
    ) -> TilingResult<PlanRecord> {
        let kinds: Vec<_> = inputs.iter().map(|t| t.kind).collect();
        require_same_kind(&kinds)?;

        let first = inputs.first().ok_or_else(|| TilingError::InvalidShape {
            shape: Vec::new(),
            reason: "operator has no inputs".to_string(),
        })?;
        self.tile_operator(platform, first, category)
    }

    /// Plan words in this family's record layout
    pub fn encode(&self, record: &PlanRecord) -> Vec<i64> {
        record.encode(&self.planner.config().layout)
    }
}

impl Default for TilingContext {
    fn default() -> Self {
        Self::elementwise()
    }
}
