//! Dot vectors: one Cauchy-distributed direction per hash function, and the
//! `dot_vectors.bin` file they are persisted in.

use std::f64::consts::PI;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use rand::Rng;

use crate::error::{QalshError, Result};

/// Sample a single draw from the standard Cauchy distribution via the
/// inverse-CDF transform of a uniform draw in (0, 1).
pub fn sample_cauchy(rng: &mut impl Rng) -> f64 {
    let u: f64 = rng.gen_range(f64::EPSILON..1.0);
    (PI * (u - 0.5)).tan()
}

/// Draw `m` dot vectors of dimension `d`, row-major (vector j, then j+1).
pub fn generate_dot_vectors(m: usize, d: usize, rng: &mut impl Rng) -> Vec<Vec<f64>> {
    (0..m)
        .map(|_| (0..d).map(|_| sample_cauchy(rng)).collect())
        .collect()
}

pub fn save_dot_vectors(path: impl AsRef<Path>, vectors: &[Vec<f64>]) -> Result<()> {
    let path_str = path.as_ref().display().to_string();
    let mut bytes = Vec::new();
    for vector in vectors {
        for &value in vector {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).map_err(|e| QalshError::io(path_str.clone(), e))?;
    }
    let mut file = File::create(path.as_ref()).map_err(|e| QalshError::io(path_str.clone(), e))?;
    file.write_all(&bytes).map_err(|e| QalshError::io(path_str, e))
}

pub fn load_dot_vectors(path: impl AsRef<Path>, m: usize, d: usize) -> Result<Vec<Vec<f64>>> {
    let path_str = path.as_ref().display().to_string();
    let mut file = File::open(path.as_ref()).map_err(|e| QalshError::io(path_str.clone(), e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| QalshError::io(path_str.clone(), e))?;

    let expected = m * d * 8;
    if bytes.len() != expected {
        return Err(QalshError::format(
            path_str,
            "dot-vectors file",
            format!("expected {expected} bytes, found {}", bytes.len()),
        ));
    }

    let mut vectors = Vec::with_capacity(m);
    for j in 0..m {
        let mut vector = Vec::with_capacity(d);
        for k in 0..d {
            let start = (j * d + k) * 8;
            let chunk = bytes[start..start + 8].try_into().unwrap();
            vector.push(f64::from_le_bytes(chunk));
        }
        vectors.push(vector);
    }
    Ok(vectors)
}
