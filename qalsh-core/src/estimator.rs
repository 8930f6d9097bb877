//! The importance-sampling Monte-Carlo Chamfer-distance estimator.
//!
//! Proposal weights are the D-array; samples are drawn via cumulative-weight
//! inverse-CDF sampling and each draw's true distance is recomputed through
//! the c-ANN searcher, matching the unbiased estimator
//! `(Σ/k) · Σ_t μ_t / D_S[i_t]`.

use rand::Rng;

use crate::error::{QalshError, Result};
use crate::index::QalshIndex;
use crate::point_set::PointSetReader;
use crate::searcher::QalshSearcher;

/// Default sample count when the caller does not request one: `⌊ln|S|⌋`,
/// floored up to 1 so the estimator never silently asks for zero samples.
pub fn default_sample_count(set_size: usize) -> usize {
    ((set_size.max(1) as f64).ln().floor() as usize).max(1)
}

/// Draw `k` indices into `d_array` with `P(i) = d_array[i] / sum(d_array)`
/// via cumulative-weight inverse-CDF sampling.
fn sample_indices(d_array: &[f64], total: f64, k: usize, rng: &mut impl Rng) -> Vec<usize> {
    let mut prefix = Vec::with_capacity(d_array.len());
    let mut running = 0.0;
    for &w in d_array {
        running += w;
        prefix.push(running);
    }

    (0..k)
        .map(|_| {
            let u = rng.gen_range(0.0..total);
            prefix.partition_point(|&cum| cum < u).min(d_array.len() - 1)
        })
        .collect()
}

/// One directional importance-sampling estimate: `from` indexed against
/// `to_index`/`to_base`, weighted by `d_array` (the D-array for `from`).
#[allow(clippy::too_many_arguments)]
pub fn estimate_directional(
    from: &mut dyn PointSetReader,
    to_index: &QalshIndex,
    to_base: &mut dyn PointSetReader,
    d_array: &[f64],
    k: Option<usize>,
    rng: &mut impl Rng,
) -> Result<f64> {
    let k = k.unwrap_or_else(|| default_sample_count(d_array.len()));
    if k == 0 {
        return Err(QalshError::invalid_config("sample count k must be > 0"));
    }
    if d_array.len() != from.len() {
        return Err(QalshError::format(
            "<d-array>",
            "D-array length",
            format!("expected {} entries, found {}", from.len(), d_array.len()),
        ));
    }

    let total: f64 = d_array.iter().sum();
    if total == 0.0 {
        return Ok(0.0);
    }

    let indices = sample_indices(d_array, total, k, rng);
    let mut point = Vec::new();
    let mut sum_ratio = 0.0;
    for i in indices {
        from.get_point(i, &mut point)?;
        let mut searcher = QalshSearcher::new(to_index, to_base);
        let mu_t = searcher.search(&point)?.distance;
        sum_ratio += mu_t / d_array[i];
    }

    Ok((total / k as f64) * sum_ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::QalshIndex;
    use crate::point_set::{write_point_set, InMemoryPointSet};
    use crate::qalsh_config::QalshParamOverrides;
    use crate::scalar::ElementKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn default_sample_count_never_rounds_to_zero() {
        assert_eq!(default_sample_count(1), 1);
        assert_eq!(default_sample_count(2), 1);
        assert_eq!(default_sample_count(1000), 6);
    }

    #[test]
    fn all_zero_d_array_reports_zero_without_sampling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.bin");
        write_point_set(&path, ElementKind::F64, &[vec![0.0, 0.0]]).unwrap();
        let mut from = InMemoryPointSet::open(&path).unwrap();
        let mut to_base = InMemoryPointSet::open(&path).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let index = QalshIndex::build(
            dir.path().join("idx"),
            &mut to_base,
            2.0,
            &mut rng,
            QalshParamOverrides {
                bucket_width: None,
                num_hash_tables: Some(4),
                collision_threshold: Some(1),
            },
        )
        .unwrap();
        let mut to_base = InMemoryPointSet::open(&path).unwrap();

        let estimate = estimate_directional(
            &mut from,
            &index,
            &mut to_base,
            &[0.0],
            Some(5),
            &mut rng,
        )
        .unwrap();
        assert_eq!(estimate, 0.0);
    }

    #[test]
    fn zero_sample_count_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.bin");
        write_point_set(&path, ElementKind::F64, &[vec![0.0, 0.0]]).unwrap();
        let mut from = InMemoryPointSet::open(&path).unwrap();
        let mut to_base = InMemoryPointSet::open(&path).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let index = QalshIndex::build(
            dir.path().join("idx"),
            &mut to_base,
            2.0,
            &mut rng,
            QalshParamOverrides {
                bucket_width: None,
                num_hash_tables: Some(4),
                collision_threshold: Some(1),
            },
        )
        .unwrap();
        let mut to_base = InMemoryPointSet::open(&path).unwrap();

        let err = estimate_directional(
            &mut from,
            &index,
            &mut to_base,
            &[1.0],
            Some(0),
            &mut rng,
        )
        .unwrap_err();
        assert_eq!(err.code(), crate::error::QalshErrorCode::InvalidConfig);
    }
}
