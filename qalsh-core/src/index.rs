//! The on-disk QALSH index for one point set: a dot-vectors file, one
//! bulk-loaded B+ tree per hash table, and a configuration file, all under
//! one directory.

use std::path::{Path, PathBuf};

use itertools::Itertools;
use rand::Rng;

use crate::btree::{bulk_load, Cursor};
use crate::dotvectors::{generate_dot_vectors, load_dot_vectors, save_dot_vectors};
use crate::error::Result;
use crate::paged_file::DEFAULT_PAGE_SIZE;
use crate::point_set::PointSetReader;
use crate::qalsh_config::{QalshConfig, QalshParamOverrides};
use crate::scalar::dot_product;

fn tree_path(dir: &Path, j: usize) -> PathBuf {
    dir.join(format!("base_idx_{j}.bin"))
}

fn dot_vectors_path(dir: &Path) -> PathBuf {
    dir.join("dot_vectors.bin")
}

fn config_path(dir: &Path) -> PathBuf {
    dir.join("config.json")
}

/// A built QALSH index: dot vectors plus one cursor-addressable B+ tree
/// per hash table.
pub struct QalshIndex {
    dir: PathBuf,
    pub config: QalshConfig,
    pub dot_vectors: Vec<Vec<f64>>,
    pub n: usize,
}

impl QalshIndex {
    /// Bulk-load a fresh index over `points` into `<dir>/qalsh_index/`.
    pub fn build(
        dir: impl AsRef<Path>,
        points: &mut dyn PointSetReader,
        approximation_ratio: f64,
        rng: &mut impl Rng,
        overrides: QalshParamOverrides,
    ) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let n = points.len();
        let d = points.dim();

        let config = QalshConfig::derive(n, approximation_ratio, None, None, overrides)?;
        let dot_vectors = generate_dot_vectors(config.num_hash_tables as usize, d, rng);

        std::fs::create_dir_all(&dir).map_err(|e| crate::error::QalshError::io(dir.display().to_string(), e))?;

        let mut point = Vec::with_capacity(d);
        let mut all_points = Vec::with_capacity(n);
        for i in 0..n {
            points.get_point(i, &mut point)?;
            all_points.push(point.clone());
        }

        for (j, dot_vector) in dot_vectors.iter().enumerate() {
            let pairs: Vec<(f64, u32)> = all_points
                .iter()
                .enumerate()
                .map(|(id, p)| (dot_product(dot_vector, p), id as u32))
                .sorted_by(|a, b| a.0.partial_cmp(&b.0).unwrap())
                .collect();
            bulk_load(&pairs, tree_path(&dir, j), DEFAULT_PAGE_SIZE)?;
        }

        save_dot_vectors(dot_vectors_path(&dir), &dot_vectors)?;
        config.save(config_path(&dir))?;

        Ok(Self {
            dir,
            config,
            dot_vectors,
            n,
        })
    }

    /// Open a previously built index. `n` and `d` must match what the
    /// index was built over (the caller knows this from the dataset
    /// metadata).
    pub fn open(dir: impl AsRef<Path>, n: usize, d: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let config = QalshConfig::load(config_path(&dir), n)?;
        let dot_vectors = load_dot_vectors(
            dot_vectors_path(&dir),
            config.num_hash_tables as usize,
            d,
        )?;
        Ok(Self {
            dir,
            config,
            dot_vectors,
            n,
        })
    }

    pub fn num_hash_tables(&self) -> usize {
        self.dot_vectors.len()
    }

    /// Open one cursor per hash table, freshly, for a new query.
    pub fn open_cursors(&self) -> Result<Vec<Cursor>> {
        (0..self.num_hash_tables())
            .map(|j| Cursor::open(tree_path(&self.dir, j)))
            .collect()
    }
}
