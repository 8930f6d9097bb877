//! Binary layout of a bulk-loaded B+ tree's pages: the page-0 header, the
//! internal node, and the leaf node.

use crate::error::{QalshError, Result};

/// Fixed per-page capacities derived from the page size, key size (8, a
/// `double`) and pointer size (4, a page number).
#[derive(Clone, Copy, Debug)]
pub struct NodeLayout {
    pub page_size: usize,
    pub internal_fanout: usize,
    pub leaf_fanout: usize,
}

impl NodeLayout {
    pub fn compute(page_size: usize) -> Result<Self> {
        if page_size < 32 {
            return Err(QalshError::invalid_config(format!(
                "page_size {page_size} too small to hold a B+ tree node"
            )));
        }
        let internal_fanout = (page_size - 4 + 8) / (8 + 4);
        let leaf_fanout = (page_size - 12) / (8 + 4);
        if internal_fanout < 2 || leaf_fanout < 1 {
            return Err(QalshError::invalid_config(format!(
                "page_size {page_size} yields degenerate fanout (internal={internal_fanout}, leaf={leaf_fanout})"
            )));
        }
        Ok(Self {
            page_size,
            internal_fanout,
            leaf_fanout,
        })
    }
}

/// Page 0: `{root_page, level, internal_fanout, leaf_fanout, page_size}`,
/// zero-padded to `page_size`. `page_size` is carried in the header itself
/// so a cursor can learn it before it knows how large a page to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootHeader {
    pub root_page: u32,
    pub level: u32,
    pub internal_fanout: u32,
    pub leaf_fanout: u32,
    pub page_size: u32,
}

impl RootHeader {
    /// Byte length of the fixed fields, always readable regardless of the
    /// tree's actual page size.
    pub const ENCODED_LEN: usize = 20;

    pub fn serialize(&self, page_size: usize) -> Vec<u8> {
        let mut buf = vec![0u8; page_size];
        buf[0..4].copy_from_slice(&self.root_page.to_le_bytes());
        buf[4..8].copy_from_slice(&self.level.to_le_bytes());
        buf[8..12].copy_from_slice(&self.internal_fanout.to_le_bytes());
        buf[12..16].copy_from_slice(&self.leaf_fanout.to_le_bytes());
        buf[16..20].copy_from_slice(&self.page_size.to_le_bytes());
        buf
    }

    pub fn deserialize(buf: &[u8]) -> Self {
        Self {
            root_page: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            level: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            internal_fanout: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            leaf_fanout: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
            page_size: u32::from_le_bytes(buf[16..20].try_into().unwrap()),
        }
    }
}

/// `{child_count, (child_count-1) keys, child_count page numbers}`.
#[derive(Clone, Debug, PartialEq)]
pub struct InternalNode {
    pub keys: Vec<f64>,
    pub children: Vec<u32>,
}

impl InternalNode {
    pub fn serialize(&self, page_size: usize) -> Vec<u8> {
        let mut buf = vec![0u8; page_size];
        let child_count = self.children.len() as u32;
        buf[0..4].copy_from_slice(&child_count.to_le_bytes());
        let mut offset = 4;
        for key in &self.keys {
            buf[offset..offset + 8].copy_from_slice(&key.to_le_bytes());
            offset += 8;
        }
        for child in &self.children {
            buf[offset..offset + 4].copy_from_slice(&child.to_le_bytes());
            offset += 4;
        }
        buf
    }

    pub fn deserialize(buf: &[u8]) -> Self {
        let child_count = u32::from_le_bytes(buf[0..4].try_into().unwrap()) as usize;
        let mut offset = 4;
        let mut keys = Vec::with_capacity(child_count.saturating_sub(1));
        for _ in 0..child_count.saturating_sub(1) {
            keys.push(f64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap()));
            offset += 8;
        }
        let mut children = Vec::with_capacity(child_count);
        for _ in 0..child_count {
            children.push(u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap()));
            offset += 4;
        }
        Self { keys, children }
    }

    /// Index of the child whose key range contains `q`: the first key
    /// greater than `q`, which is the upper-bound child pointer index.
    pub fn child_for(&self, q: f64) -> usize {
        self.keys.iter().position(|&k| k > q).unwrap_or(self.keys.len())
    }
}

/// `{entry_count, prev_leaf_page, next_leaf_page, entry_count keys,
/// entry_count ids}`. `0` in `prev_leaf_page`/`next_leaf_page` means none.
#[derive(Clone, Debug, PartialEq)]
pub struct LeafNode {
    pub prev_leaf_page: u32,
    pub next_leaf_page: u32,
    pub keys: Vec<f64>,
    pub ids: Vec<u32>,
}

impl LeafNode {
    pub fn serialize(&self, page_size: usize) -> Vec<u8> {
        let mut buf = vec![0u8; page_size];
        let entry_count = self.keys.len() as u32;
        buf[0..4].copy_from_slice(&entry_count.to_le_bytes());
        buf[4..8].copy_from_slice(&self.prev_leaf_page.to_le_bytes());
        buf[8..12].copy_from_slice(&self.next_leaf_page.to_le_bytes());
        let mut offset = 12;
        for key in &self.keys {
            buf[offset..offset + 8].copy_from_slice(&key.to_le_bytes());
            offset += 8;
        }
        for id in &self.ids {
            buf[offset..offset + 4].copy_from_slice(&id.to_le_bytes());
            offset += 4;
        }
        buf
    }

    pub fn deserialize(buf: &[u8]) -> Self {
        let entry_count = u32::from_le_bytes(buf[0..4].try_into().unwrap()) as usize;
        let prev_leaf_page = u32::from_le_bytes(buf[4..8].try_into().unwrap());
        let next_leaf_page = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        let mut offset = 12;
        let mut keys = Vec::with_capacity(entry_count);
        for _ in 0..entry_count {
            keys.push(f64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap()));
            offset += 8;
        }
        let mut ids = Vec::with_capacity(entry_count);
        for _ in 0..entry_count {
            ids.push(u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap()));
            offset += 4;
        }
        Self {
            prev_leaf_page,
            next_leaf_page,
            keys,
            ids,
        }
    }

    /// Smallest index `j` with `keys[j] >= q`, or `keys.len()` if none.
    pub fn lower_bound(&self, q: f64) -> usize {
        self.keys.partition_point(|&k| k < q)
    }
}
