//! QALSH parameter derivation and the configuration persisted alongside an
//! index.
//!
//! `Regularize` (here, [`QalshConfig::regularize`]) computes the bucket
//! width, number of hash tables, and collision threshold from the
//! approximation ratio and the size of the set being indexed. The
//! collision-frequency threshold `β·N` (with the default `β = 100/N`) is
//! kept alongside the persisted fields so the searcher's frequent-set test
//! can use it without needing to re-derive it.

use serde::{Deserialize, Serialize};
use std::f64::consts::E;
use std::path::Path;

use crate::error::{QalshError, Result};
use crate::paged_file::DEFAULT_PAGE_SIZE;

/// Caller-supplied overrides for a sweep; a `Some` value replaces the
/// derived quantity.
#[derive(Clone, Copy, Debug, Default)]
pub struct QalshParamOverrides {
    pub bucket_width: Option<f64>,
    pub num_hash_tables: Option<u32>,
    pub collision_threshold: Option<u32>,
}

/// The QALSH configuration persisted as `config.json`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QalshConfig {
    pub approximation_ratio: f64,
    pub bucket_width: f64,
    pub error_probability: f64,
    pub num_hash_tables: u32,
    pub collision_threshold: u32,
    pub page_size: u32,
    /// `β`, the frequent-set fraction. Not part of the external JSON
    /// contract: it is re-derived from `n` (`100 / n` by default) whenever
    /// a config is constructed or reloaded, since the searcher always has
    /// `n` on hand (it is the size of the base set the index covers).
    #[serde(skip, default = "default_beta")]
    pub beta: f64,
}

fn default_beta() -> f64 {
    0.0
}

impl QalshConfig {
    /// Build a config with derived `(w, m, l)` for `n` points, approximation
    /// ratio `c`, and optional `beta`/`delta`/overrides.
    pub fn derive(
        n: usize,
        approximation_ratio: f64,
        beta: Option<f64>,
        error_probability: Option<f64>,
        overrides: QalshParamOverrides,
    ) -> Result<Self> {
        if approximation_ratio <= 1.0 {
            return Err(QalshError::invalid_config(format!(
                "approximation_ratio must be > 1, got {approximation_ratio}"
            )));
        }
        let delta = error_probability.unwrap_or(1.0 / E);
        if !(delta > 0.0 && delta < 1.0) {
            return Err(QalshError::invalid_config(format!(
                "error_probability must be in (0, 1), got {delta}"
            )));
        }
        if n == 0 {
            return Err(QalshError::invalid_config("cannot derive parameters for an empty point set"));
        }
        let beta = beta.unwrap_or(100.0 / n as f64);

        let w = overrides.bucket_width.unwrap_or_else(|| 2.0 * approximation_ratio.sqrt());

        let p1 = (2.0 / std::f64::consts::PI) * (w / 2.0).atan();
        let p2 = (2.0 / std::f64::consts::PI) * (w / (2.0 * approximation_ratio)).atan();

        // `ln(2/beta)` is only defined for beta < 2, i.e. n > 50 under the
        // default beta = 100/n; clamp the argument above 1 so tiny point
        // sets still derive a (small but valid) configuration instead of
        // NaN propagating through to an unconditional "num_hash_tables is
        // 0" error.
        let term1 = (2.0 / beta).max(1.0 + f64::EPSILON).ln().sqrt();
        let term2 = (1.0 / delta).ln().sqrt();

        let m = overrides.num_hash_tables.unwrap_or_else(|| {
            let numerator = (term1 + term2).powi(2);
            let denominator = 2.0 * (p1 - p2).powi(2);
            (numerator / denominator).ceil() as u32
        });

        if m == 0 {
            return Err(QalshError::invalid_config("derived num_hash_tables is 0"));
        }

        let l = overrides.collision_threshold.unwrap_or_else(|| {
            let eta = term1 / term2;
            let alpha = (eta * p1 + p2) / (1.0 + eta);
            (alpha * m as f64).ceil() as u32
        });

        if l == 0 {
            return Err(QalshError::invalid_config("derived collision_threshold is 0"));
        }

        Ok(Self {
            approximation_ratio,
            bucket_width: w,
            error_probability: delta,
            num_hash_tables: m,
            collision_threshold: l,
            page_size: DEFAULT_PAGE_SIZE as u32,
            beta,
        })
    }

    /// Recompute `(w, m, l)` from this config's own `approximation_ratio`
    /// and `error_probability`, for `n` points, with no overrides. Used to
    /// re-derive a configuration after it has been reloaded from disk
    /// (`beta` is not serialized, so callers always pass `n`).
    pub fn regularize(&mut self, n: usize) -> Result<()> {
        let fresh = Self::derive(
            n,
            self.approximation_ratio,
            None,
            Some(self.error_probability),
            QalshParamOverrides::default(),
        )?;
        *self = fresh;
        Ok(())
    }

    /// Number of frequent candidates the searcher requires before
    /// terminating on the "enough frequent candidates" condition.
    pub fn frequent_threshold(&self, n: usize) -> usize {
        ((self.beta * n as f64).ceil() as usize).clamp(1, n.max(1))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_str = path.as_ref().display().to_string();
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| QalshError::format(path_str.clone(), "config.json", e.to_string()))?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| QalshError::io(path_str.clone(), e))?;
        }
        std::fs::write(path.as_ref(), text).map_err(|e| QalshError::io(path_str, e))
    }

    /// Load a config from `path` and recompute `beta` for `n` points.
    pub fn load(path: impl AsRef<Path>, n: usize) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| QalshError::io(path_str.clone(), e))?;
        let mut config: Self = serde_json::from_str(&text)
            .map_err(|e| QalshError::format(path_str, "config.json", e.to_string()))?;
        config.beta = 100.0 / n.max(1) as f64;
        Ok(config)
    }
}
