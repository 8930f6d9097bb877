//! Random-access typed vector retrieval over the point-set file format.
//!
//! Two variants implement [`PointSetReader`]: [`InMemoryPointSet`] loads the
//! whole payload once and decodes up front, [`DiskPointSet`] seeks and
//! decodes on every access. Both dispatch on the element-kind tag once at
//! construction rather than per point.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{QalshError, Result};
use crate::scalar::ElementKind;

const HEADER_SIZE: usize = 1 + 4 + 4;

/// Common contract for in-memory and disk-backed point sets.
pub trait PointSetReader {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn dim(&self) -> usize;
    fn element_kind(&self) -> ElementKind;

    /// Fetch point `i`, writing its `dim()` coordinates into `out`.
    fn get_point(&mut self, i: usize, out: &mut Vec<f64>) -> Result<()>;
}

fn check_index(i: usize, n: usize) -> Result<()> {
    if i >= n {
        Err(QalshError::out_of_range("point id", i as i64, n as i64))
    } else {
        Ok(())
    }
}

fn read_header(file: &mut File, path: &str) -> Result<(ElementKind, usize, usize)> {
    let mut header = [0u8; HEADER_SIZE];
    file.seek(SeekFrom::Start(0))
        .map_err(|e| QalshError::io(path, e))?;
    file.read_exact(&mut header)
        .map_err(|e| QalshError::io(path, e))?;

    let kind = ElementKind::from_tag(header[0]).map_err(|_| {
        QalshError::format(path, "element-kind tag", format!("tag {}", header[0]))
    })?;
    let n = u32::from_le_bytes(header[1..5].try_into().unwrap()) as usize;
    let d = u32::from_le_bytes(header[5..9].try_into().unwrap()) as usize;
    Ok((kind, n, d))
}

/// Write a point set to `path` in the file format of the external
/// interface: tag, N, d, then N*d raw little-endian scalars.
pub fn write_point_set(
    path: impl AsRef<Path>,
    kind: ElementKind,
    points: &[Vec<f64>],
) -> Result<()> {
    let path_ref = path.as_ref();
    let path_str = path_ref.display().to_string();
    let n = points.len();
    let d = points.first().map(|p| p.len()).unwrap_or(0);

    let mut bytes = Vec::with_capacity(HEADER_SIZE + n * d * kind.size());
    bytes.push(kind.tag());
    bytes.extend_from_slice(&(n as u32).to_le_bytes());
    bytes.extend_from_slice(&(d as u32).to_le_bytes());
    for point in points {
        kind.encode_into(point, &mut bytes);
    }

    if let Some(parent) = path_ref.parent() {
        std::fs::create_dir_all(parent).map_err(|e| QalshError::io(path_str.clone(), e))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path_ref)
        .map_err(|e| QalshError::io(path_str.clone(), e))?;
    file.write_all(&bytes)
        .map_err(|e| QalshError::io(path_str, e))
}

/// In-memory point set: decodes the entire payload once at construction.
pub struct InMemoryPointSet {
    kind: ElementKind,
    n: usize,
    d: usize,
    values: Vec<f64>,
}

impl InMemoryPointSet {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let mut file =
            File::open(path.as_ref()).map_err(|e| QalshError::io(path_str.clone(), e))?;
        let (kind, n, d) = read_header(&mut file, &path_str)?;

        let mut payload = Vec::new();
        file.read_to_end(&mut payload)
            .map_err(|e| QalshError::io(path_str.clone(), e))?;
        let expected = n * d * kind.size();
        if payload.len() != expected {
            return Err(QalshError::format(
                path_str,
                "point-set payload",
                format!("expected {expected} bytes, found {}", payload.len()),
            ));
        }

        let mut values = Vec::with_capacity(n * d);
        let mut scratch = Vec::with_capacity(d);
        for i in 0..n {
            let start = i * d * kind.size();
            let end = start + d * kind.size();
            kind.decode_into(&payload[start..end], d, &mut scratch);
            values.extend_from_slice(&scratch);
        }

        Ok(Self { kind, n, d, values })
    }
}

impl PointSetReader for InMemoryPointSet {
    fn len(&self) -> usize {
        self.n
    }

    fn dim(&self) -> usize {
        self.d
    }

    fn element_kind(&self) -> ElementKind {
        self.kind
    }

    fn get_point(&mut self, i: usize, out: &mut Vec<f64>) -> Result<()> {
        check_index(i, self.n)?;
        let start = i * self.d;
        out.clear();
        out.extend_from_slice(&self.values[start..start + self.d]);
        Ok(())
    }
}

/// Disk-backed point set: seeks and decodes on every access, no caching.
pub struct DiskPointSet {
    path: String,
    file: File,
    kind: ElementKind,
    n: usize,
    d: usize,
    scratch_bytes: Vec<u8>,
}

impl DiskPointSet {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let mut file =
            File::open(path.as_ref()).map_err(|e| QalshError::io(path_str.clone(), e))?;
        let (kind, n, d) = read_header(&mut file, &path_str)?;
        Ok(Self {
            path: path_str,
            file,
            kind,
            n,
            d,
            scratch_bytes: vec![0u8; d * kind.size()],
        })
    }
}

impl PointSetReader for DiskPointSet {
    fn len(&self) -> usize {
        self.n
    }

    fn dim(&self) -> usize {
        self.d
    }

    fn element_kind(&self) -> ElementKind {
        self.kind
    }

    fn get_point(&mut self, i: usize, out: &mut Vec<f64>) -> Result<()> {
        check_index(i, self.n)?;
        let elem_size = self.kind.size();
        let offset = HEADER_SIZE as u64 + (i * self.d * elem_size) as u64;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| QalshError::io(self.path.clone(), e))?;
        self.file
            .read_exact(&mut self.scratch_bytes)
            .map_err(|e| QalshError::io(self.path.clone(), e))?;
        self.kind.decode_into(&self.scratch_bytes, self.d, out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points() -> Vec<Vec<f64>> {
        vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]
    }

    #[test]
    fn in_memory_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.bin");
        write_point_set(&path, ElementKind::F64, &sample_points()).unwrap();

        let mut set = InMemoryPointSet::open(&path).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.dim(), 2);
        let mut out = Vec::new();
        set.get_point(1, &mut out).unwrap();
        assert_eq!(out, vec![3.0, 4.0]);
    }

    #[test]
    fn disk_round_trips_and_agrees_with_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.bin");
        write_point_set(&path, ElementKind::I32, &sample_points()).unwrap();

        let mut mem = InMemoryPointSet::open(&path).unwrap();
        let mut disk = DiskPointSet::open(&path).unwrap();
        let mut a = Vec::new();
        let mut b = Vec::new();
        for i in 0..3 {
            mem.get_point(i, &mut a).unwrap();
            disk.get_point(i, &mut b).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn get_point_out_of_range_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.bin");
        write_point_set(&path, ElementKind::F64, &sample_points()).unwrap();
        let mut set = InMemoryPointSet::open(&path).unwrap();
        let mut out = Vec::new();
        let err = set.get_point(3, &mut out).unwrap_err();
        assert_eq!(err.code(), crate::error::QalshErrorCode::OutOfRange);
    }
}
