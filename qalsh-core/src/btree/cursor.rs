//! Bidirectional leaf-linked cursor rooted at a query's projected key.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::btree::node::{InternalNode, LeafNode, RootHeader};
use crate::error::{QalshError, Result};
use crate::paged_file::PagedFile;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Position {
    page: u32,
    index: usize,
}

/// Opens an index file and walks its leaves outward from a query key.
/// Keeps a page cache (cleared on every `init`) so repeated descents
/// within one query pay disk at most once per page.
pub struct Cursor {
    file: PagedFile,
    header: RootHeader,
    page_cache: HashMap<u32, Vec<u8>>,
    q: f64,
    left: Option<Position>,
    right: Option<Position>,
}

impl Cursor {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let page_size = Self::bootstrap_page_size(path)?;
        let mut file = PagedFile::open(path, page_size)?;
        let header = RootHeader::deserialize(&file.read_page(0)?);
        Ok(Self {
            file,
            header,
            page_cache: HashMap::new(),
            q: 0.0,
            left: None,
            right: None,
        })
    }

    /// Read the page size out of page 0's fixed-offset field without
    /// knowing the page size up front, so `PagedFile::open` can then be
    /// told the tree's actual page size rather than assuming the default.
    fn bootstrap_page_size(path: &Path) -> Result<usize> {
        let mut file = File::open(path).map_err(|e| QalshError::io(path.display().to_string(), e))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| QalshError::io(path.display().to_string(), e))?;
        let mut buf = [0u8; RootHeader::ENCODED_LEN];
        file.read_exact(&mut buf)
            .map_err(|e| QalshError::io(path.display().to_string(), e))?;
        let page_size = u32::from_le_bytes(buf[16..20].try_into().unwrap()) as usize;
        Ok(page_size)
    }

    pub fn level(&self) -> u32 {
        self.header.level
    }

    fn fetch(&mut self, page: u32) -> Result<Vec<u8>> {
        if let Some(bytes) = self.page_cache.get(&page) {
            return Ok(bytes.clone());
        }
        let bytes = self.file.read_page(page)?;
        self.page_cache.insert(page, bytes.clone());
        Ok(bytes)
    }

    fn fetch_leaf(&mut self, page: u32) -> Result<LeafNode> {
        self.fetch(page).map(|bytes| LeafNode::deserialize(&bytes))
    }

    fn descend_to_leaf(&mut self, q: f64) -> Result<u32> {
        let mut page = self.header.root_page;
        for _ in 0..self.header.level {
            let bytes = self.fetch(page)?;
            let node = InternalNode::deserialize(&bytes);
            let idx = node.child_for(q);
            page = node.children[idx];
        }
        Ok(page)
    }

    /// Reset cursor state (including the page cache) and position both
    /// sides around `q`.
    pub fn init(&mut self, q: f64) -> Result<()> {
        self.page_cache.clear();
        self.q = q;
        self.left = None;
        self.right = None;

        let leaf_page = self.descend_to_leaf(q)?;
        let leaf = self.fetch_leaf(leaf_page)?;
        let j = leaf.lower_bound(q);

        self.right = if j < leaf.keys.len() {
            Some(Position { page: leaf_page, index: j })
        } else if leaf.next_leaf_page != 0 {
            Some(Position { page: leaf.next_leaf_page, index: 0 })
        } else {
            None
        };

        self.left = if j > 0 {
            Some(Position { page: leaf_page, index: j - 1 })
        } else if leaf.prev_leaf_page != 0 {
            let prev = self.fetch_leaf(leaf.prev_leaf_page)?;
            let last = prev.keys.len().checked_sub(1);
            last.map(|idx| Position { page: leaf.prev_leaf_page, index: idx })
        } else {
            None
        };

        Ok(())
    }

    /// Emit the id at the left position if `q - key <= bound`, then
    /// advance the position one step left.
    pub fn left_find_next(&mut self, bound: f64) -> Result<Option<u32>> {
        let Some(pos) = self.left else { return Ok(None) };
        let leaf = self.fetch_leaf(pos.page)?;
        let key = leaf.keys[pos.index];
        if self.q - key > bound {
            return Ok(None);
        }
        let id = leaf.ids[pos.index];

        self.left = if pos.index > 0 {
            Some(Position { page: pos.page, index: pos.index - 1 })
        } else if leaf.prev_leaf_page != 0 {
            let prev = self.fetch_leaf(leaf.prev_leaf_page)?;
            prev.keys
                .len()
                .checked_sub(1)
                .map(|idx| Position { page: leaf.prev_leaf_page, index: idx })
        } else {
            None
        };

        Ok(Some(id))
    }

    /// Emit the id at the right position if `key - q <= bound`, then
    /// advance the position one step right.
    pub fn right_find_next(&mut self, bound: f64) -> Result<Option<u32>> {
        let Some(pos) = self.right else { return Ok(None) };
        let leaf = self.fetch_leaf(pos.page)?;
        let key = leaf.keys[pos.index];
        if key - self.q > bound {
            return Ok(None);
        }
        let id = leaf.ids[pos.index];

        self.right = if pos.index + 1 < leaf.keys.len() {
            Some(Position { page: pos.page, index: pos.index + 1 })
        } else if leaf.next_leaf_page != 0 {
            Some(Position { page: leaf.next_leaf_page, index: 0 })
        } else {
            None
        };

        Ok(Some(id))
    }

    pub fn is_exhausted(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::btree::bulk_loader::bulk_load;

    fn build(pairs: &[(f64, u32)], page_size: usize) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.bin");
        bulk_load(pairs, &path, page_size).unwrap();
        (dir, path)
    }

    #[test]
    fn single_leaf_drain_matches_scenario() {
        let pairs = vec![(1.0, 0), (2.0, 1), (3.0, 2)];
        let (_dir, path) = build(&pairs, 4096);
        let mut cursor = Cursor::open(&path).unwrap();
        cursor.init(2.5).unwrap();

        let mut left_ids = Vec::new();
        while let Some(id) = cursor.left_find_next(f64::INFINITY).unwrap() {
            left_ids.push(id);
        }
        assert_eq!(left_ids, vec![1, 0]);

        let mut right_ids = Vec::new();
        while let Some(id) = cursor.right_find_next(f64::INFINITY).unwrap() {
            right_ids.push(id);
        }
        assert_eq!(right_ids, vec![2]);
    }

    #[test]
    fn monotonicity_never_re_emits_an_id() {
        let pairs: Vec<(f64, u32)> = (0..50).map(|i| (i as f64, i)).collect();
        let (_dir, path) = build(&pairs, 128);
        let mut cursor = Cursor::open(&path).unwrap();
        cursor.init(24.5).unwrap();

        let mut prev_diff = f64::NEG_INFINITY;
        let mut seen = std::collections::HashSet::new();
        while let Some(id) = cursor.right_find_next(100.0).unwrap() {
            let diff = (id as f64) - 24.5;
            assert!(diff >= prev_diff);
            prev_diff = diff;
            assert!(seen.insert(id));
        }
    }

    #[test]
    fn bound_stops_emission_before_id_is_consumed() {
        let pairs = vec![(0.0, 0), (1.0, 1), (2.0, 2), (10.0, 3)];
        let (_dir, path) = build(&pairs, 4096);
        let mut cursor = Cursor::open(&path).unwrap();
        cursor.init(2.0).unwrap();

        // Right side starting exactly at key 2.0 (id 2).
        assert_eq!(cursor.right_find_next(0.5).unwrap(), Some(2));
        // Next right candidate has key 10.0, far outside the bound.
        assert_eq!(cursor.right_find_next(0.5).unwrap(), None);
    }
}
