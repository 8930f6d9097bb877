//! Ties the lower-level modules together into the two verbs a caller
//! actually wants: build the indices for a dataset directory, and estimate
//! the Chamfer distance between its two point sets.
//!
//! A dataset directory holds `a.bin`, `b.bin` (point sets), `metadata.txt`,
//! and, once built, `a_index/`, `b_index/` (one QALSH index per set) and
//! `d_array_a.bin`, `d_array_b.bin`.

use std::path::{Path, PathBuf};

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::d_array::{build_d_array, load_d_array, save_d_array};
use crate::error::Result;
use crate::estimator::estimate_directional;
use crate::index::QalshIndex;
use crate::metadata::DatasetMetadata;
use crate::point_set::{DiskPointSet, InMemoryPointSet};
use crate::qalsh_config::QalshParamOverrides;

fn a_path(dir: &Path) -> PathBuf {
    dir.join("a.bin")
}
fn b_path(dir: &Path) -> PathBuf {
    dir.join("b.bin")
}
fn metadata_path(dir: &Path) -> PathBuf {
    dir.join("metadata.txt")
}
fn a_index_dir(dir: &Path) -> PathBuf {
    dir.join("a_index")
}
fn b_index_dir(dir: &Path) -> PathBuf {
    dir.join("b_index")
}
fn d_array_a_path(dir: &Path) -> PathBuf {
    dir.join("d_array_a.bin")
}
fn d_array_b_path(dir: &Path) -> PathBuf {
    dir.join("d_array_b.bin")
}

/// Build `a_index/` and `b_index/` for the point sets in `dir`.
pub fn build_index(dir: impl AsRef<Path>, approximation_ratio: f64, seed: u64) -> Result<()> {
    let dir = dir.as_ref();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut a = InMemoryPointSet::open(a_path(dir))?;
    info!("building index over a.bin ({} points)", a.len());
    QalshIndex::build(
        a_index_dir(dir),
        &mut a,
        approximation_ratio,
        &mut rng,
        QalshParamOverrides::default(),
    )?;

    let mut b = InMemoryPointSet::open(b_path(dir))?;
    info!("building index over b.bin ({} points)", b.len());
    QalshIndex::build(
        b_index_dir(dir),
        &mut b,
        approximation_ratio,
        &mut rng,
        QalshParamOverrides::default(),
    )?;

    Ok(())
}

/// Outcome of `estimate_chamfer`: the total estimate and, when the dataset
/// metadata carries a ground-truth value, the relative error against it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChamferEstimate {
    pub total: f64,
    pub relative_error: Option<f64>,
}

/// Estimate the Chamfer distance between `a.bin` and `b.bin` in `dir`,
/// (re)building their D-arrays along the way.
pub fn estimate_chamfer(dir: impl AsRef<Path>, samples: Option<usize>, seed: u64) -> Result<ChamferEstimate> {
    let dir = dir.as_ref();
    let metadata = DatasetMetadata::load(metadata_path(dir))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let a_index = QalshIndex::open(a_index_dir(dir), metadata.base_num_points, metadata.num_dimensions)?;
    let b_index = QalshIndex::open(b_index_dir(dir), metadata.query_num_points, metadata.num_dimensions)?;

    let mut a_from = DiskPointSet::open(a_path(dir))?;
    let mut b_to = DiskPointSet::open(b_path(dir))?;
    info!("building D-array for a.bin against b_index");
    let d_array_a = build_d_array(&mut a_from, &b_index, &mut b_to)?;
    save_d_array(d_array_a_path(dir), &d_array_a)?;

    let mut b_from = DiskPointSet::open(b_path(dir))?;
    let mut a_to = DiskPointSet::open(a_path(dir))?;
    info!("building D-array for b.bin against a_index");
    let d_array_b = build_d_array(&mut b_from, &a_index, &mut a_to)?;
    save_d_array(d_array_b_path(dir), &d_array_b)?;

    let mut a_from = DiskPointSet::open(a_path(dir))?;
    let mut b_to = DiskPointSet::open(b_path(dir))?;
    let a_to_b = estimate_directional(&mut a_from, &b_index, &mut b_to, &d_array_a, samples, &mut rng)?;

    let mut b_from = DiskPointSet::open(b_path(dir))?;
    let mut a_to = DiskPointSet::open(a_path(dir))?;
    let b_to_a = estimate_directional(&mut b_from, &a_index, &mut a_to, &d_array_b, samples, &mut rng)?;

    let total = a_to_b + b_to_a;
    let relative_error = metadata.chamfer_distance.map(|truth| {
        if truth == 0.0 {
            (total - truth).abs()
        } else {
            (total - truth).abs() / truth
        }
    });

    Ok(ChamferEstimate { total, relative_error })
}

/// Reload a previously built D-array from disk rather than rebuilding it.
pub fn load_cached_d_array_a(dir: impl AsRef<Path>) -> Result<Vec<f64>> {
    load_d_array(d_array_a_path(dir.as_ref()))
}

/// Reload a previously built D-array from disk rather than rebuilding it.
pub fn load_cached_d_array_b(dir: impl AsRef<Path>) -> Result<Vec<f64>> {
    load_d_array(d_array_b_path(dir.as_ref()))
}
