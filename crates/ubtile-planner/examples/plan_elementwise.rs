//! Planning an elementwise operator
//!
//! Tiles the same 256-element tensor for several element kinds and prints
//! the resulting plan records.

use ubtile_core::{ElementKind, PlatformInfo, TensorDesc};
use ubtile_planner::{RecordLayout, ShapeCategory, TilingContext};

fn main() {
    // 64 vector cores with 248 KiB of scratch each
    let platform = PlatformInfo::new(64, 253_952);
    let ctx = TilingContext::elementwise();
    let layout = RecordLayout::elementwise();

    println!("Elementwise Tiling Plans");
    println!("========================");
    println!("Platform: {} cores, {} bytes scratch", platform.core_count, platform.scratch_bytes);
    println!();

    for kind in [
        ElementKind::Float32,
        ElementKind::Float16,
        ElementKind::Int8,
        ElementKind::Int64,
    ] {
        let tensor = TensorDesc::new(&[4, 4, 4, 4], kind);
        let record = ctx
            .tile_operator(&platform, &tensor, ShapeCategory::Dense)
            .expect("Planning succeeded");

        println!("{} ({} bytes):", kind, kind.natural_size());
        println!("  Variant: {}", record.variant);
        println!("  Tiling key: {}", record.tiling_key);
        println!("  Used workers: {}", record.plan.used_workers);
        println!("  Tile elems: {}", record.plan.tile_elems);
        println!("  Tile tail elems: {}", record.plan.tile_tail_elems);
        println!("  Record words: {:?}", record.encode(&layout));
        println!();
    }

    // A large workload streams several tiles per worker
    let tensor = TensorDesc::new(&[10, 1000, 1000], ElementKind::Float16);
    let record = ctx
        .tile_operator(&PlatformInfo::new(48, 253_952), &tensor, ShapeCategory::Dense)
        .expect("Planning succeeded");

    println!("Large fp16 workload over 48 cores:");
    println!("  Used workers: {}", record.plan.used_workers);
    println!("  Outer loops: {}", record.plan.outer_loops);
    println!("  Tail outer loops: {}", record.plan.tail_outer_loops);
    println!("  Coverage ok: {}", record.plan.check_coverage());
}
