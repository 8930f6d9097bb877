//! Element kinds for point-set payloads and the typed conversions between
//! their on-disk byte form and `f64` used everywhere distances are computed.

use crate::error::{QalshError, Result};

/// The six element kinds a point set's payload may be stored as, tagged
/// exactly as the point-set file format in the external interface.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ElementKind {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl ElementKind {
    pub const fn tag(self) -> u8 {
        match self {
            Self::I8 => 0,
            Self::I16 => 1,
            Self::I32 => 2,
            Self::I64 => 3,
            Self::F32 => 4,
            Self::F64 => 5,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Self::I8),
            1 => Ok(Self::I16),
            2 => Ok(Self::I32),
            3 => Ok(Self::I64),
            4 => Ok(Self::F32),
            5 => Ok(Self::F64),
            other => Err(QalshError::format(
                "<point set>",
                "element-kind tag",
                format!("unknown tag {other}"),
            )),
        }
    }

    /// Size in bytes of one scalar of this kind.
    pub const fn size(self) -> usize {
        match self {
            Self::I8 => 1,
            Self::I16 => 2,
            Self::I32 => 4,
            Self::I64 => 8,
            Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    pub fn parse_name(name: &str) -> Result<Self> {
        match name {
            "i8" => Ok(Self::I8),
            "i16" => Ok(Self::I16),
            "i32" => Ok(Self::I32),
            "i64" => Ok(Self::I64),
            "f32" => Ok(Self::F32),
            "f64" => Ok(Self::F64),
            other => Err(QalshError::format(
                "<dataset metadata>",
                "data_type",
                format!("unknown element kind `{other}`"),
            )),
        }
    }

    /// Decode `d` consecutive scalars of this kind from `bytes` into `f64`,
    /// dispatching on the tag once rather than per element.
    pub fn decode_into(self, bytes: &[u8], d: usize, out: &mut Vec<f64>) {
        out.clear();
        out.reserve(d);
        match self {
            Self::I8 => {
                for i in 0..d {
                    out.push(bytes[i] as i8 as f64);
                }
            }
            Self::I16 => {
                for i in 0..d {
                    let chunk = [bytes[i * 2], bytes[i * 2 + 1]];
                    out.push(i16::from_le_bytes(chunk) as f64);
                }
            }
            Self::I32 => {
                for i in 0..d {
                    let chunk = bytes[i * 4..i * 4 + 4].try_into().unwrap();
                    out.push(i32::from_le_bytes(chunk) as f64);
                }
            }
            Self::I64 => {
                for i in 0..d {
                    let chunk = bytes[i * 8..i * 8 + 8].try_into().unwrap();
                    out.push(i64::from_le_bytes(chunk) as f64);
                }
            }
            Self::F32 => {
                for i in 0..d {
                    let chunk = bytes[i * 4..i * 4 + 4].try_into().unwrap();
                    out.push(f32::from_le_bytes(chunk) as f64);
                }
            }
            Self::F64 => {
                for i in 0..d {
                    let chunk = bytes[i * 8..i * 8 + 8].try_into().unwrap();
                    out.push(f64::from_le_bytes(chunk));
                }
            }
        }
    }

    /// Encode `values` (already cast down from `f64`) into their on-disk
    /// little-endian byte form, appended to `out`.
    pub fn encode_into(self, values: &[f64], out: &mut Vec<u8>) {
        match self {
            Self::I8 => {
                for &v in values {
                    out.push(v as i8 as u8);
                }
            }
            Self::I16 => {
                for &v in values {
                    out.extend_from_slice(&(v as i16).to_le_bytes());
                }
            }
            Self::I32 => {
                for &v in values {
                    out.extend_from_slice(&(v as i32).to_le_bytes());
                }
            }
            Self::I64 => {
                for &v in values {
                    out.extend_from_slice(&(v as i64).to_le_bytes());
                }
            }
            Self::F32 => {
                for &v in values {
                    out.extend_from_slice(&(v as f32).to_le_bytes());
                }
            }
            Self::F64 => {
                for &v in values {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
        }
    }
}

/// L1 distance between two equal-length point slices.
pub fn l1_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

/// Dot product between two equal-length slices, used to project a point
/// onto a dot vector.
pub fn dot_product(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trips() {
        for kind in [
            ElementKind::I8,
            ElementKind::I16,
            ElementKind::I32,
            ElementKind::I64,
            ElementKind::F32,
            ElementKind::F64,
        ] {
            assert_eq!(ElementKind::from_tag(kind.tag()).unwrap(), kind);
        }
    }

    #[test]
    fn decode_matches_encode() {
        let values = vec![-3.0, 0.0, 127.0];
        let mut bytes = Vec::new();
        ElementKind::I8.encode_into(&values, &mut bytes);
        let mut out = Vec::new();
        ElementKind::I8.decode_into(&bytes, values.len(), &mut out);
        assert_eq!(out, values);
    }

    #[test]
    fn l1_distance_is_sum_of_abs_diffs() {
        assert_eq!(l1_distance(&[0.0, 0.0], &[3.0, -4.0]), 7.0);
    }
}
