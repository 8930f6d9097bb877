use std::path::Path;
use std::time::SystemTime;

use qalsh_core::point_set::write_point_set;
use qalsh_core::{build_index, estimate_chamfer, DatasetMetadata, ElementKind};
use rand::{thread_rng, Rng};

const DIM: usize = 8;
const SIZES: u32 = 6;

fn make_dataset(dir: &Path, n: usize) {
    let mut r = thread_rng();
    let a: Vec<Vec<f64>> = (0..n).map(|_| (0..DIM).map(|_| r.gen_range(0.0..1000.0)).collect()).collect();
    let b: Vec<Vec<f64>> = (0..n).map(|_| (0..DIM).map(|_| r.gen_range(0.0..1000.0)).collect()).collect();
    write_point_set(dir.join("a.bin"), ElementKind::F64, &a).unwrap();
    write_point_set(dir.join("b.bin"), ElementKind::F64, &b).unwrap();
    DatasetMetadata {
        element_kind: ElementKind::F64,
        base_num_points: n,
        query_num_points: n,
        num_dimensions: DIM,
        chamfer_distance: None,
    }
    .save(dir.join("metadata.txt"))
    .unwrap();
}

fn build_bench(dir: &Path) {
    let start = SystemTime::now();
    build_index(dir, 2.0, 1).unwrap();
    let finish = start.elapsed().unwrap().as_nanos();
    println!("build-index took {finish} nanoseconds");
}

fn estimate_bench(dir: &Path) {
    let start = SystemTime::now();
    let estimate = estimate_chamfer(dir, None, 1).unwrap();
    let finish = start.elapsed().unwrap().as_nanos();
    println!(
        "estimate-chamfer took {finish} nanoseconds, total = {}",
        estimate.total
    );
}

fn main() {
    for i in 0..SIZES {
        let n = 2usize.pow(i) * 64;
        let dir = tempfile::tempdir().unwrap();
        make_dataset(dir.path(), n);
        println!("dataset size {n} points, dim {DIM}:");
        build_bench(dir.path());
        estimate_bench(dir.path());
    }
}
