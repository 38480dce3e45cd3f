//! Shape analysis example
//!
//! Decodes raw host datatype tags and normalizes a platform description into
//! the resource profile and workload the planner consumes.

use ubtile_core::{
    AnalyzerConfig, ElementKind, ElementSizeTable, PlatformInfo, ShapeAnalyzer, TensorDesc,
};

fn main() {
    let platform = PlatformInfo::new(48, 196_608);
    let shape = [8, 128, 256];

    println!("Platform: {} cores, {} bytes scratch", platform.core_count, platform.scratch_bytes);
    println!("Shape: {:?}", shape);
    println!();

    let analyzer = ShapeAnalyzer::default();
    for tag in [0u32, 1, 2, 3, 9, 12, 16, 27, 33] {
        let kind = ElementKind::from_raw_tag(tag).expect("Known datatype tag");
        let (profile, workload) = analyzer
            .analyze(&platform, &TensorDesc::new(&shape, kind))
            .expect("Valid platform");

        println!(
            "  tag {:>2} -> {:<10} elem_bytes={} workers={} elements={}",
            tag,
            kind.to_string(),
            profile.elem_bytes,
            profile.worker_count,
            workload.total_elements
        );
    }
    println!();

    // Compute fp16 in fp32 and keep 16 KiB of scratch for bookkeeping
    let sizes = ElementSizeTable::default()
        .with_size(ElementKind::Float16, 4)
        .expect("Supported width");
    let analyzer = ShapeAnalyzer::new(
        AnalyzerConfig::default()
            .with_sizes(sizes)
            .with_reserved_bytes(16 * 1024),
    );
    let profile = analyzer
        .profile(&platform, ElementKind::Float16)
        .expect("Valid platform");

    println!("Promoted fp16 profile: {:?}", profile);

    // Unknown tags are rejected
    match ElementKind::from_raw_tag(99) {
        Ok(kind) => println!("Unexpected kind {}", kind),
        Err(err) => println!("Tag 99: {}", err),
    }
}
