//! Dataset metadata: a small text key-value file recording the element
//! kind, set sizes, dimensionality, and an optional ground-truth Chamfer
//! distance.

use std::fs;
use std::path::Path;

use crate::error::{QalshError, Result};
use crate::scalar::ElementKind;

#[derive(Clone, Debug, PartialEq)]
pub struct DatasetMetadata {
    pub element_kind: ElementKind,
    pub base_num_points: usize,
    pub query_num_points: usize,
    pub num_dimensions: usize,
    pub chamfer_distance: Option<f64>,
}

impl DatasetMetadata {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let text = fs::read_to_string(path.as_ref()).map_err(|e| QalshError::io(path_str.clone(), e))?;

        let mut data_type = None;
        let mut base_num_points = None;
        let mut query_num_points = None;
        let mut num_dimensions = None;
        let mut chamfer_distance = None;

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                QalshError::format(
                    path_str.clone(),
                    "metadata line",
                    format!("line {}: expected `key = value`", line_no + 1),
                )
            })?;
            let key = key.trim();
            let value = value.trim();
            match key {
                "data_type" => data_type = Some(ElementKind::parse_name(value)?),
                "base_num_points" => {
                    base_num_points = Some(parse_usize(&path_str, key, value)?)
                }
                "query_num_points" => {
                    query_num_points = Some(parse_usize(&path_str, key, value)?)
                }
                "num_dimensions" => num_dimensions = Some(parse_usize(&path_str, key, value)?),
                "chamfer_distance" => {
                    chamfer_distance = Some(value.parse::<f64>().map_err(|_| {
                        QalshError::format(
                            path_str.clone(),
                            "chamfer_distance",
                            format!("not a float: `{value}`"),
                        )
                    })?)
                }
                other => {
                    return Err(QalshError::format(
                        path_str.clone(),
                        "metadata key",
                        format!("unknown key `{other}`"),
                    ))
                }
            }
        }

        Ok(Self {
            element_kind: data_type
                .ok_or_else(|| QalshError::format(path_str.clone(), "metadata", "missing data_type"))?,
            base_num_points: base_num_points.ok_or_else(|| {
                QalshError::format(path_str.clone(), "metadata", "missing base_num_points")
            })?,
            query_num_points: query_num_points.ok_or_else(|| {
                QalshError::format(path_str.clone(), "metadata", "missing query_num_points")
            })?,
            num_dimensions: num_dimensions.ok_or_else(|| {
                QalshError::format(path_str.clone(), "metadata", "missing num_dimensions")
            })?,
            chamfer_distance,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_str = path.as_ref().display().to_string();
        let mut text = String::new();
        text.push_str(&format!("data_type = {}\n", self.element_kind.name()));
        text.push_str(&format!("base_num_points = {}\n", self.base_num_points));
        text.push_str(&format!("query_num_points = {}\n", self.query_num_points));
        text.push_str(&format!("num_dimensions = {}\n", self.num_dimensions));
        if let Some(chamfer) = self.chamfer_distance {
            text.push_str(&format!("chamfer_distance = {chamfer}\n"));
        }
        fs::write(path.as_ref(), text).map_err(|e| QalshError::io(path_str, e))
    }
}

fn parse_usize(path: &str, key: &str, value: &str) -> Result<usize> {
    value.parse::<usize>().map_err(|_| {
        QalshError::format(path.to_string(), "metadata value", format!("{key} = `{value}` is not a non-negative integer"))
    })
}
