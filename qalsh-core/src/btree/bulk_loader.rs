//! Bulk-loads a height-balanced, leaf-linked B+ tree from an ascending
//! `(key, id)` sequence in one sequential pass.

use std::path::Path;

use crate::btree::node::{InternalNode, LeafNode, NodeLayout, RootHeader};
use crate::error::{QalshError, Result};
use crate::paged_file::PagedFile;

/// Bulk-load `pairs` (caller-guaranteed ascending by key) into a new B+
/// tree file at `path`. On any I/O failure the file is left in an
/// undefined state; callers are responsible for deleting it.
pub fn bulk_load(pairs: &[(f64, u32)], path: impl AsRef<Path>, page_size: usize) -> Result<()> {
    let layout = NodeLayout::compute(page_size)?;
    let mut file = PagedFile::create(path, page_size)?;

    if pairs.is_empty() {
        let leaf_page = file.allocate_page()?;
        let leaf = LeafNode {
            prev_leaf_page: 0,
            next_leaf_page: 0,
            keys: Vec::new(),
            ids: Vec::new(),
        };
        file.write_page(leaf_page, &leaf.serialize(page_size))?;
        let header = RootHeader {
            root_page: leaf_page,
            level: 0,
            internal_fanout: layout.internal_fanout as u32,
            leaf_fanout: layout.leaf_fanout as u32,
            page_size: page_size as u32,
        };
        return file.write_page(0, &header.serialize(page_size));
    }

    debug_assert!(
        pairs.windows(2).all(|w| w[0].0 <= w[1].0),
        "bulk_load requires ascending key order"
    );

    // Leaf construction: chunks of leaf_fanout, each chunk's first key is
    // the separator pushed up to the parent level.
    let mut level_entries: Vec<(f64, u32)> = Vec::with_capacity(pairs.len() / layout.leaf_fanout + 1);
    let mut prev_leaf_page: u32 = 0;
    for chunk in pairs.chunks(layout.leaf_fanout) {
        let page = file.allocate_page()?;
        let leaf = LeafNode {
            prev_leaf_page,
            next_leaf_page: 0,
            keys: chunk.iter().map(|(k, _)| *k).collect(),
            ids: chunk.iter().map(|(_, id)| *id).collect(),
        };
        file.write_page(page, &leaf.serialize(page_size))?;

        if prev_leaf_page != 0 {
            let mut prev = LeafNode::deserialize(&file.read_page(prev_leaf_page)?);
            prev.next_leaf_page = page;
            file.write_page(prev_leaf_page, &prev.serialize(page_size))?;
        }

        level_entries.push((chunk[0].0, page));
        prev_leaf_page = page;
    }

    // Internal construction: consume the previous level's entries into
    // chunks of internal_fanout until exactly one entry remains.
    let mut level = 0u32;
    while level_entries.len() > 1 {
        level += 1;
        let mut next_level = Vec::with_capacity(level_entries.len() / layout.internal_fanout + 1);
        for chunk in level_entries.chunks(layout.internal_fanout) {
            let page = file.allocate_page()?;
            let node = InternalNode {
                keys: chunk[1..].iter().map(|(k, _)| *k).collect(),
                children: chunk.iter().map(|(_, p)| *p).collect(),
            };
            file.write_page(page, &node.serialize(page_size))?;
            next_level.push((chunk[0].0, page));
        }
        level_entries = next_level;
    }

    let (_, root_page) = level_entries
        .first()
        .copied()
        .ok_or_else(|| QalshError::format(String::new(), "bulk load", "no root entry produced"))?;

    let header = RootHeader {
        root_page,
        level,
        internal_fanout: layout.internal_fanout as u32,
        leaf_fanout: layout.leaf_fanout as u32,
        page_size: page_size as u32,
    };
    file.write_page(0, &header.serialize(page_size))
}
