//! A brute-force nearest-neighbour oracle, used only by tests as a
//! ground-truth check against the QALSH searcher's approximate answers.

#![cfg(test)]

use crate::error::{QalshError, Result};
use crate::point_set::PointSetReader;
use crate::scalar::l1_distance;
use crate::searcher::AnnResult;

/// Exact nearest neighbour of `q` in `set` under L1.
pub fn linear_scan_nearest(set: &mut dyn PointSetReader, q: &[f64]) -> Result<AnnResult> {
    if set.is_empty() {
        return Err(QalshError::empty_result("linear scan", "set is empty"));
    }
    let mut point = Vec::new();
    let mut best: Option<AnnResult> = None;
    for i in 0..set.len() {
        set.get_point(i, &mut point)?;
        let distance = l1_distance(q, &point);
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(AnnResult {
                point_id: i as u32,
                distance,
            });
        }
    }
    Ok(best.unwrap())
}

/// Exact Chamfer distance between `from` and `to` under L1.
pub fn linear_scan_chamfer(
    from: &mut dyn PointSetReader,
    to: &mut dyn PointSetReader,
) -> Result<f64> {
    let mut total = 0.0;
    for i in 0..from.len() {
        let mut point = Vec::new();
        from.get_point(i, &mut point)?;
        total += linear_scan_nearest(to, &point)?.distance;
    }
    Ok(total)
}
