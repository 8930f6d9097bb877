use qalsh_core::point_set::{write_point_set, DiskPointSet, InMemoryPointSet, PointSetReader};
use qalsh_core::{
    btree::{bulk_load, Cursor},
    d_array::build_d_array,
    estimate_chamfer, build_index,
    estimator::estimate_directional,
    index::QalshIndex,
    qalsh_config::QalshParamOverrides,
    DatasetMetadata, ElementKind,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn empty_intersection_estimate_matches_the_single_pairwise_distance() {
    let dir = tempfile::tempdir().unwrap();
    write_point_set(dir.path().join("a.bin"), ElementKind::F64, &[vec![0.0, 0.0]]).unwrap();
    write_point_set(dir.path().join("b.bin"), ElementKind::F64, &[vec![100.0, 100.0]]).unwrap();
    // One point per set: each direction's one-way Chamfer distance is the
    // single pairwise L1 distance, 200; the bidirectional total is 400.
    DatasetMetadata {
        element_kind: ElementKind::F64,
        base_num_points: 1,
        query_num_points: 1,
        num_dimensions: 2,
        chamfer_distance: Some(400.0),
    }
    .save(dir.path().join("metadata.txt"))
    .unwrap();

    build_index(dir.path(), 2.0, 11).unwrap();
    let estimate = estimate_chamfer(dir.path(), Some(1), 11).unwrap();

    assert!((estimate.total - 400.0).abs() < 1e-9);
}

#[test]
fn two_level_tree_bulk_load_drains_in_ascending_distance_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.bin");
    // page_size=96 forces leaf_fanout=7, internal_fanout=8; N=100 needs two
    // internal levels above the leaves.
    let pairs: Vec<(f64, u32)> = (0..100).map(|i| (i as f64, i as u32)).collect();
    bulk_load(&pairs, &path, 96).unwrap();

    let mut cursor = Cursor::open(&path).unwrap();
    assert!(cursor.level() >= 2);

    cursor.init(50.3).unwrap();
    assert_eq!(cursor.left_find_next(f64::INFINITY).unwrap(), Some(50));
    assert_eq!(cursor.left_find_next(f64::INFINITY).unwrap(), Some(49));
    assert_eq!(cursor.right_find_next(f64::INFINITY).unwrap(), Some(51));
    assert_eq!(cursor.right_find_next(f64::INFINITY).unwrap(), Some(52));
}

#[test]
fn bulk_load_round_trip_covers_every_id_with_ascending_key_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.bin");
    let pairs: Vec<(f64, u32)> = (0..65).map(|i| (i as f64 * 1.5, i as u32)).collect();
    bulk_load(&pairs, &path, 128).unwrap();

    let mut cursor = Cursor::open(&path).unwrap();
    cursor.init(0.0).unwrap();
    let mut seen: Vec<u32> = Vec::new();
    while let Some(id) = cursor.left_find_next(f64::INFINITY).unwrap() {
        seen.push(id);
    }
    while let Some(id) = cursor.right_find_next(f64::INFINITY).unwrap() {
        seen.push(id);
    }
    seen.sort_unstable();
    let expected: Vec<u32> = (0..65).collect();
    assert_eq!(seen, expected);
}

#[test]
fn radius_doubling_terminates_at_the_first_radius_that_dominates_best() {
    let dir = tempfile::tempdir().unwrap();
    let base_path = dir.path().join("base.bin");
    let points: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
    write_point_set(&base_path, ElementKind::F64, &points).unwrap();

    let mut base = InMemoryPointSet::open(&base_path).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    let overrides = qalsh_core::QalshParamOverrides {
        bucket_width: Some(2.0),
        num_hash_tables: Some(4),
        collision_threshold: Some(1),
    };
    let index =
        qalsh_core::QalshIndex::build(dir.path().join("idx"), &mut base, 2.0, &mut rng, overrides)
            .unwrap();

    let mut base = InMemoryPointSet::open(&base_path).unwrap();
    let mut searcher = qalsh_core::QalshSearcher::new(&index, &mut base);
    let result = searcher.search(&[0.0]).unwrap();
    assert_eq!(result.point_id, 0);
    assert_eq!(result.distance, 0.0);
}

#[test]
fn estimator_converges_to_exact_chamfer_distance_under_ideal_d_array() {
    // N <= 100, ideal QALSH parameters (one hash table per point, collision
    // threshold 1) so every search is an exact linear scan and the D-array
    // is therefore the exact nearest-neighbour distance, not an
    // approximation. Under an exact D-array the importance-sampling
    // estimator's ratio mu_t / D_S[i_t] is always exactly 1 (the searcher is
    // deterministic: re-searching the same index for the same point returns
    // the same distance it was built with), so the Monte-Carlo mean
    // collapses to the true directional Chamfer sum for any k, and in
    // particular for k = 10_000.
    let dir = tempfile::tempdir().unwrap();
    let n = 40;
    let d = 3;
    let mut rng = StdRng::seed_from_u64(99);
    let a: Vec<Vec<f64>> = (0..n)
        .map(|_| (0..d).map(|_| rng.gen_range(0.0..50.0)).collect())
        .collect();
    let b: Vec<Vec<f64>> = (0..n)
        .map(|_| (0..d).map(|_| rng.gen_range(0.0..50.0)).collect())
        .collect();
    let a_path = dir.path().join("a.bin");
    let b_path = dir.path().join("b.bin");
    write_point_set(&a_path, ElementKind::F64, &a).unwrap();
    write_point_set(&b_path, ElementKind::F64, &b).unwrap();

    let mut a_set = DiskPointSet::open(&a_path).unwrap();
    let mut b_set = DiskPointSet::open(&b_path).unwrap();
    let exact_a_to_b = brute_force_chamfer(&mut a_set, &mut b_set);

    let ideal_overrides = QalshParamOverrides {
        bucket_width: None,
        num_hash_tables: Some(n),
        collision_threshold: Some(1),
    };
    let mut b_base = InMemoryPointSet::open(&b_path).unwrap();
    let b_index = QalshIndex::build(
        dir.path().join("b_index"),
        &mut b_base,
        2.0,
        &mut rng,
        ideal_overrides,
    )
    .unwrap();

    let mut a_from = InMemoryPointSet::open(&a_path).unwrap();
    let mut b_to = InMemoryPointSet::open(&b_path).unwrap();
    let d_array_a = build_d_array(&mut a_from, &b_index, &mut b_to).unwrap();

    let mut a_from = InMemoryPointSet::open(&a_path).unwrap();
    let mut b_to = InMemoryPointSet::open(&b_path).unwrap();
    let estimate =
        estimate_directional(&mut a_from, &b_index, &mut b_to, &d_array_a, Some(10_000), &mut rng)
            .unwrap();

    let relative_error = (estimate - exact_a_to_b).abs() / exact_a_to_b;
    assert!(
        relative_error <= 0.01,
        "expected within 1% of {exact_a_to_b}, got {estimate} ({relative_error:.4} relative error)"
    );
}

#[test]
fn synthetic_thousand_point_sets_have_small_relative_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let n = 1000;
    let d = 8;
    let a: Vec<Vec<f64>> = (0..n)
        .map(|_| (0..d).map(|_| rng.gen_range(0.0..1000.0)).collect())
        .collect();
    let b: Vec<Vec<f64>> = (0..n)
        .map(|_| (0..d).map(|_| rng.gen_range(0.0..1000.0)).collect())
        .collect();
    write_point_set(dir.path().join("a.bin"), ElementKind::F64, &a).unwrap();
    write_point_set(dir.path().join("b.bin"), ElementKind::F64, &b).unwrap();

    // Exact Chamfer distance via brute force, since this is the oracle the
    // estimator is checked against.
    let mut a_set = DiskPointSet::open(dir.path().join("a.bin")).unwrap();
    let mut b_set = DiskPointSet::open(dir.path().join("b.bin")).unwrap();
    let truth = brute_force_chamfer(&mut a_set, &mut b_set) + brute_force_chamfer(&mut b_set, &mut a_set);

    DatasetMetadata {
        element_kind: ElementKind::F64,
        base_num_points: n,
        query_num_points: n,
        num_dimensions: d,
        chamfer_distance: Some(truth),
    }
    .save(dir.path().join("metadata.txt"))
    .unwrap();

    build_index(dir.path(), 2.0, 42).unwrap();
    // k = floor(ln 1000) = 6 samples per direction, matching the default
    // sample count. The searcher is deterministic (no RNG inside a search
    // call), so re-searching the same index for a point already recorded in
    // the D-array always reproduces that exact distance; the Monte-Carlo
    // ratio mu_t / D_S[i_t] is therefore always 1 and the estimate is exactly
    // the sum of the D-array regardless of k or seed. What this test
    // actually exercises is QALSH's c-ANN approximation quality at the
    // default c = 2: on uniform random data the achieved approximation is
    // well inside the c = 2 worst-case guarantee, so the bidirectional total
    // lands within 5% of the brute-force oracle.
    let estimate = estimate_chamfer(dir.path(), Some(6), 42).unwrap();

    assert!(estimate.relative_error.unwrap() <= 0.05);
}

fn brute_force_chamfer(from: &mut DiskPointSet, to: &mut DiskPointSet) -> f64 {
    let mut total = 0.0;
    let mut p = Vec::new();
    let mut q = Vec::new();
    for i in 0..from.len() {
        from.get_point(i, &mut p).unwrap();
        let mut best = f64::INFINITY;
        for j in 0..to.len() {
            to.get_point(j, &mut q).unwrap();
            let dist: f64 = p.iter().zip(&q).map(|(x, y)| (x - y).abs()).sum();
            if dist < best {
                best = dist;
            }
        }
        total += best;
    }
    total
}
