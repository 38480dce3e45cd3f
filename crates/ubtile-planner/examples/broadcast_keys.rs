//! Broadcast operators and dispatch keys
//!
//! Shows the broadcast preset, its per-worker workspace and how a custom
//! key table changes the dispatch key for the same variant.

use std::sync::Arc;
use ubtile_core::{AnalyzerConfig, ElementKind, PlatformInfo, TensorDesc};
use ubtile_planner::{
    CategoryOffsets, KeyTable, PlannerConfig, RecordLayout, ShapeCategory, TilingContext,
    TilingKeyStrategy,
};

fn main() {
    let platform = PlatformInfo::new(48, 196_608);
    let tensor = TensorDesc::new(&[16, 64, 128], ElementKind::BFloat16);

    // Default broadcast context
    let ctx = TilingContext::broadcast();
    let record = ctx
        .tile_operator(&platform, &tensor, ShapeCategory::BroadcastWithLoop)
        .expect("Planning succeeded");

    println!("Broadcast plan");
    println!("==============");
    println!("  Variant: {}", record.variant);
    println!("  Tiling key: {}", record.tiling_key);
    println!("  Workspace bytes: {}", record.workspace_bytes);
    println!("  Record words: {:?}", record.encode(&RecordLayout::broadcast()));
    println!();

    // Every category for one element kind
    let keys = ctx.keys();
    for category in [
        ShapeCategory::Dense,
        ShapeCategory::SingleDim,
        ShapeCategory::BroadcastNoLoop,
        ShapeCategory::BroadcastWithLoop,
    ] {
        let variant = keys.variant(ElementKind::Float32, category);
        println!("  {:<28} -> {}", variant.to_string(), keys.key(variant));
    }
    println!();

    // Custom key table for a kernel binary with a different numbering
    let custom = KeyTable::default()
        .with_base(ElementKind::BFloat16, 9)
        .with_offsets(CategoryOffsets {
            dense: 0,
            single_dim: 1000,
            broadcast_no_loop: 2000,
            broadcast_with_loop: 3000,
        });
    let ctx = TilingContext::new(
        AnalyzerConfig::default(),
        PlannerConfig::broadcast(),
        Arc::new(custom),
    )
    .expect("Valid configuration");
    let record = ctx
        .tile_operator(&platform, &tensor, ShapeCategory::BroadcastWithLoop)
        .expect("Planning succeeded");

    println!("Custom key table: {} -> {}", record.variant, record.tiling_key);
}
