//! The QALSH c-ANN searcher: virtual-rehash radius doubling over one
//! cursor per hash table.

use std::collections::{HashMap, HashSet};

use crate::error::{QalshError, Result};
use crate::index::QalshIndex;
use crate::point_set::PointSetReader;
use crate::scalar::{dot_product, l1_distance};

/// A `(point_id, distance)` candidate, as produced by the searcher's
/// bounded best-so-far structure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnResult {
    pub point_id: u32,
    pub distance: f64,
}

/// Runs c-ANN queries against one opened index.
pub struct QalshSearcher<'a> {
    index: &'a QalshIndex,
    base: &'a mut dyn PointSetReader,
}

impl<'a> QalshSearcher<'a> {
    pub fn new(index: &'a QalshIndex, base: &'a mut dyn PointSetReader) -> Self {
        Self { index, base }
    }

    /// Find a c-approximate nearest neighbour of `q` in the base set this
    /// index was built over.
    pub fn search(&mut self, q: &[f64]) -> Result<AnnResult> {
        let m = self.index.num_hash_tables();
        if self.base.is_empty() || m == 0 {
            return Err(QalshError::empty_result(
                "c-ANN search",
                "base set is empty or the index has no hash tables",
            ));
        }

        let mut cursors = self.index.open_cursors()?;
        for (cursor, dot_vector) in cursors.iter_mut().zip(&self.index.dot_vectors) {
            cursor.init(dot_product(dot_vector, q))?;
        }

        let l = self.index.config.collision_threshold;
        let threshold = self.index.config.frequent_threshold(self.base.len());
        let w = self.index.config.bucket_width;
        let c = self.index.config.approximation_ratio;

        let mut collision_counts: HashMap<u32, u32> = HashMap::new();
        let mut frequent: HashSet<u32> = HashSet::new();
        let mut best: Option<AnnResult> = None;
        let mut point_buf = Vec::new();
        let mut r = 1.0f64;

        loop {
            let half_w = w * r / 2.0;
            for cursor in cursors.iter_mut() {
                while let Some(id) = cursor.left_find_next(half_w)? {
                    Self::record_collision(
                        id,
                        l,
                        &mut collision_counts,
                        &mut frequent,
                        self.base,
                        &mut point_buf,
                        q,
                        &mut best,
                    )?;
                }
                while let Some(id) = cursor.right_find_next(half_w)? {
                    Self::record_collision(
                        id,
                        l,
                        &mut collision_counts,
                        &mut frequent,
                        self.base,
                        &mut point_buf,
                        q,
                        &mut best,
                    )?;
                }
            }

            let enough_frequent = frequent.len() >= threshold;
            let radius_dominates = best.map_or(false, |b| b.distance <= c * r);
            if enough_frequent || radius_dominates {
                return best.ok_or_else(|| {
                    QalshError::empty_result("c-ANN search", "no candidate found before termination")
                });
            }

            if cursors.iter().all(|cursor| cursor.is_exhausted()) {
                return best.ok_or_else(|| {
                    QalshError::empty_result("c-ANN search", "every hash table exhausted with no candidate")
                });
            }

            r *= 2.0;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn record_collision(
        id: u32,
        l: u32,
        collision_counts: &mut HashMap<u32, u32>,
        frequent: &mut HashSet<u32>,
        base: &mut dyn PointSetReader,
        point_buf: &mut Vec<f64>,
        q: &[f64],
        best: &mut Option<AnnResult>,
    ) -> Result<()> {
        let count = collision_counts.entry(id).or_insert(0);
        *count += 1;
        if *count == l && frequent.insert(id) {
            base.get_point(id as usize, point_buf)?;
            let distance = l1_distance(q, point_buf);
            if best.map_or(true, |b| distance < b.distance) {
                *best = Some(AnnResult { point_id: id, distance });
            }
        }
        Ok(())
    }
}
