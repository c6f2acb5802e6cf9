//! Module implement the on-disk representation of btree nodes.
//!
//! A node is `type (1 byte) | count (u32) | body`. Leaf bodies are
//! `count` records, each `(keylen:u32, key, vallen:u32, val)`. Branch
//! bodies are a leading child offset followed by `count` cells of
//! `(keylen:u32, key, childoff:u64)`, that is `count + 1` children
//! separated by `count` keys. All integers big-endian, all child
//! offsets absolute file offsets.

use std::convert::TryFrom;

use crate::{binary::Binary, reader::Reader, rope::Rope, Error, Result, MAX_NODE_SIZE};

pub const TYPE_LEAF: u8 = b'l';
pub const TYPE_BRANCH: u8 = b'b';

/// Size-prefixed block, `(length:u32, bytes)`, the unit out of which
/// node bodies are composed. Key/value lengths are validated at the
/// API boundary.
pub fn make_block(dat: Binary) -> Rope {
    let mut rope = Rope::new();
    rope.push_u32(dat.len() as u32);
    rope.push(dat);
    rope
}

/// Key/value record, two blocks back to back.
pub fn make_record(key: Binary, value: Binary) -> Rope {
    let mut rope = make_block(key);
    rope.merge(make_block(value));
    rope
}

/// Serialize a leaf node.
pub fn encode_leaf(records: Vec<(Binary, Binary)>) -> Rope {
    let mut rope = Rope::new();
    rope.push(Binary::from(vec![TYPE_LEAF]));
    rope.push_u32(records.len() as u32);
    for (key, value) in records.into_iter() {
        rope.merge(make_record(key, value));
    }
    rope
}

/// Serialize a branch node from its children, each keyed by the least
/// key of its subtree. The first entry's key is implied by the parent
/// and not written.
pub fn encode_branch(entries: Vec<(Binary, u64)>) -> Rope {
    assert!(!entries.is_empty());

    let mut rope = Rope::new();
    rope.push(Binary::from(vec![TYPE_BRANCH]));
    rope.push_u32((entries.len() - 1) as u32);
    let mut entries = entries.into_iter();
    rope.push_u64(entries.next().map(|(_, child)| child).unwrap());
    for (key, child) in entries {
        rope.merge(make_block(key));
        rope.push_u64(child);
    }
    rope
}

/// Decoded btree node.
pub enum Node {
    Leaf {
        records: Vec<(Binary, Binary)>,
    },
    Branch {
        head: u64,
        cells: Vec<(Binary, u64)>,
    },
}

impl Node {
    /// Decode the node at file offset `off`.
    pub fn load(rdr: &Reader, off: u64) -> Result<Node> {
        let typ = rdr.read_bytes(off, 1)?[0];
        let count = {
            let n = rdr.read_u32(off + 1)?;
            err_at!(FailConvert, usize::try_from(n))?
        };
        if count > MAX_NODE_SIZE {
            return err_at!(Corrupted, msg: "node at {} with {} entries", off, count);
        }
        match typ {
            TYPE_LEAF => {
                let mut records = Vec::with_capacity(count);
                let mut pos = off + 5;
                for _i in 0..count {
                    let key = rdr.read_data(pos)?;
                    pos += 4 + (key.len() as u64);
                    let value = rdr.read_data(pos)?;
                    pos += 4 + (value.len() as u64);
                    records.push((key, value));
                }
                Ok(Node::Leaf { records })
            }
            TYPE_BRANCH => {
                let head = rdr.read_u64(off + 5)?;
                let mut cells = Vec::with_capacity(count);
                let mut pos = off + 13;
                for _i in 0..count {
                    let key = rdr.read_data(pos)?;
                    pos += 4 + (key.len() as u64);
                    let child = rdr.read_u64(pos)?;
                    pos += 8;
                    cells.push((key, child));
                }
                Ok(Node::Branch { head, cells })
            }
            typ => err_at!(Corrupted, msg: "unknown node type {} at {}", typ, off),
        }
    }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
