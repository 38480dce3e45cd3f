//! End-to-end example: tiling and running an elementwise kernel
//!
//! Plans a 1M-element fp32 workload for a 48-core accelerator profile and
//! runs a scale-and-shift kernel through the reference consumer.

use ubtile_core::{ElementKind, PlatformInfo, ShapeAnalyzer, TensorDesc};
use ubtile_exec::{assignments, Dispatcher, ExecConfig};
use ubtile_planner::TilePlanner;

fn main() {
    let platform = PlatformInfo::new(48, 196_608);
    let tensor = TensorDesc::new(&[1024, 1024], ElementKind::Float32);

    let (profile, workload) = ShapeAnalyzer::default()
        .analyze(&platform, &tensor)
        .expect("Valid platform");
    let plan = TilePlanner::default()
        .plan(&profile, &workload)
        .expect("Planning succeeded");

    println!("Tiling Plan");
    println!("===========");
    println!("  Total elements: {}", plan.total_elements);
    println!("  Tile elems: {}", plan.tile_elems);
    println!("  Used workers: {}", plan.used_workers);
    println!("  Outer loops: {} (last worker: {})", plan.outer_loops, plan.tail_outer_loops);
    println!("  Tile tail elems: {}", plan.tile_tail_elems);
    println!();

    let work = assignments(&plan).expect("Valid plan");
    if let Some(last) = work.last() {
        println!(
            "Last worker {}: offset {}, {} loops, last tile {} elements",
            last.worker_id, last.base_offset, last.loops, last.last_tile_elems
        );
    }

    let input: Vec<f32> = (0..plan.total_elements).map(|i| i as f32).collect();
    let mut output = vec![0.0f32; input.len()];

    let report = Dispatcher::new(ExecConfig::default())
        .dispatch(&plan, &input, &mut output, |src: &[f32], dst: &mut [f32]| {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s * 2.0 + 1.0;
            }
        })
        .expect("Dispatch succeeded");

    println!();
    println!("Dispatch Report:");
    println!("  Workers: {}", report.used_workers);
    println!("  Tiles: {}", report.tiles);
    println!("  Elements: {}", report.elements);
    println!("  Parallel: {}", report.parallel);
    println!("  output[12345] = {}", output[12345]);
}
