//! Builds and persists the D-array: for a `(from, to)` pair, the c-ANN
//! distance from every point of `from` to the index over `to`.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{QalshError, Result};
use crate::index::QalshIndex;
use crate::point_set::PointSetReader;
use crate::searcher::QalshSearcher;

/// Run the c-ANN searcher for every point of `from` against `to_index`,
/// producing a length-`from.len()` vector of nearest distances.
pub fn build_d_array(
    from: &mut dyn PointSetReader,
    to_index: &QalshIndex,
    to_base: &mut dyn PointSetReader,
) -> Result<Vec<f64>> {
    let mut d_array = Vec::with_capacity(from.len());
    let mut point = Vec::new();
    for i in 0..from.len() {
        from.get_point(i, &mut point)?;
        let mut searcher = QalshSearcher::new(to_index, to_base);
        let result = searcher.search(&point)?;
        d_array.push(result.distance);
    }
    Ok(d_array)
}

/// Persist a D-array as `N` little-endian doubles. Idempotent: re-running
/// overwrites the file.
pub fn save_d_array(path: impl AsRef<Path>, d_array: &[f64]) -> Result<()> {
    let path_str = path.as_ref().display().to_string();
    let mut bytes = Vec::with_capacity(d_array.len() * 8);
    for &value in d_array {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).map_err(|e| QalshError::io(path_str.clone(), e))?;
    }
    let mut file = File::create(path.as_ref()).map_err(|e| QalshError::io(path_str.clone(), e))?;
    file.write_all(&bytes).map_err(|e| QalshError::io(path_str, e))
}

pub fn load_d_array(path: impl AsRef<Path>) -> Result<Vec<f64>> {
    let path_str = path.as_ref().display().to_string();
    let mut file = File::open(path.as_ref()).map_err(|e| QalshError::io(path_str.clone(), e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| QalshError::io(path_str.clone(), e))?;
    if bytes.len() % 8 != 0 {
        return Err(QalshError::format(
            path_str,
            "D-array file",
            format!("length {} is not a multiple of 8", bytes.len()),
        ));
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|chunk| f64::from_le_bytes(chunk.try_into().unwrap()))
        .collect())
}
