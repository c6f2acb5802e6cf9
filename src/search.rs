//! Module implement descent through the btree, from a version's root
//! node down to the leaf owning a key.

use crate::{binary::Binary, node::Node, reader::Reader, Result};

/// One step of a descent. `key` is the largest separator in the parent
/// that is `<=` the search key; at the root it is the empty string.
#[derive(Clone, Debug)]
pub struct PathEntry {
    pub key: Binary,
    pub off: u64,
}

/// Offset of the leaf node owning `key`, descending from the root node
/// of `version`. `version` must be non-zero.
pub fn search_leaf(rdr: &Reader, version: u64, key: &Binary) -> Result<u64> {
    let mut off = version + 8;
    loop {
        match Node::load(rdr, off)? {
            Node::Leaf { .. } => break Ok(off),
            Node::Branch { head, cells } => {
                let mut child = head;
                for (sep, cell_child) in cells.into_iter() {
                    if *key < sep {
                        break;
                    }
                    child = cell_child;
                }
                off = child;
            }
        }
    }
}

/// Full descent for `key`, returning the root-to-leaf path. The spine
/// rebuild walks this stack bottom up.
pub fn search_path(rdr: &Reader, version: u64, key: &Binary) -> Result<Vec<PathEntry>> {
    let mut path = vec![];
    let mut node_key = Binary::default();
    let mut off = version + 8;
    loop {
        debug_assert!(node_key <= *key);
        path.push(PathEntry {
            key: node_key.clone(),
            off,
        });
        match Node::load(rdr, off)? {
            Node::Leaf { .. } => break Ok(path),
            Node::Branch { head, cells } => {
                let mut child = head;
                for (sep, cell_child) in cells.into_iter() {
                    if *key < sep {
                        break;
                    }
                    node_key = sep;
                    child = cell_child;
                }
                off = child;
            }
        }
    }
}
