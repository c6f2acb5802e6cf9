//! Module implement copy-on-write mutation of the btree.
//!
//! A mutation never touches existing bytes. It plans one data-block
//! payload holding the new spine, at most one or two nodes per tree
//! level, with the rewritten root at the tail of the payload preceded
//! by the predecessor link. Node offsets inside the payload are
//! computed up front from the append position, so the whole block is
//! assembled in memory and appended in one shot.

use crate::{
    binary::Binary,
    node::{self, Node},
    reader::Reader,
    rope::Rope,
    search::{self, PathEntry},
    Error, Result, MAX_NODE_SIZE,
};

// What one level of the rebuild hands to the level above: the
// replacement node(s) for the child that was rewritten, or a signal
// that the child vanished altogether.
enum Level {
    One {
        node: Rope,
        key: Binary,
    },
    Two {
        a: Rope,
        a_key: Binary,
        b: Rope,
        b_key: Binary,
    },
    Removed,
}

// (least-key, offset) of the replacement node(s) spliced into the
// parent, None when the child was dropped without replacement.
type Repl = Option<(Binary, u64, Option<(Binary, u64)>)>;

/// Plan the spine for `set(version, key, value)`. Returns the
/// data-block payload, assuming it lands at `append_pos`, and the
/// version the payload creates.
pub fn plan_set(
    rdr: &Reader,
    version: u64,
    key: Binary,
    value: Binary,
    append_pos: u64,
) -> Result<(Vec<u8>, u64)> {
    let (path, level, prev) = if version == 0 {
        let level = Level::One {
            key: key.clone(),
            node: node::encode_leaf(vec![(key, value)]),
        };
        (vec![], level, 0)
    } else {
        let mut path = search::search_path(rdr, version, &key)?;
        let leaf = pop_leaf(&mut path)?;
        let records = leaf_records(rdr, leaf.off)?;
        (path, leaf_insert(records, key, value), leaf.off)
    };
    rebuild(rdr, path, prev, level, version, append_pos)
}

/// Plan the spine for `del(version, key)`. Returns None when the key
/// is absent, deleting nothing is a no-op that keeps the version.
pub fn plan_del(
    rdr: &Reader,
    version: u64,
    key: &Binary,
    append_pos: u64,
) -> Result<Option<(Vec<u8>, u64)>> {
    if version == 0 {
        return Ok(None);
    }

    let mut path = search::search_path(rdr, version, key)?;
    let leaf = pop_leaf(&mut path)?;
    let mut records = leaf_records(rdr, leaf.off)?;
    let i = match records.binary_search_by(|(k, _)| k.cmp(key)) {
        Ok(i) => i,
        Err(_) => return Ok(None),
    };
    records.remove(i);

    let level = if records.is_empty() {
        Level::Removed
    } else {
        let key1 = records[0].0.clone();
        Level::One {
            key: key1,
            node: node::encode_leaf(records),
        }
    };
    Ok(Some(rebuild(rdr, path, leaf.off, level, version, append_pos)?))
}

fn pop_leaf(path: &mut Vec<PathEntry>) -> Result<PathEntry> {
    match path.pop() {
        Some(entry) => Ok(entry),
        None => err_at!(Fatal, msg: "empty search path"),
    }
}

fn leaf_records(rdr: &Reader, off: u64) -> Result<Vec<(Binary, Binary)>> {
    match Node::load(rdr, off)? {
        Node::Leaf { records } => Ok(records),
        Node::Branch { .. } => err_at!(Fatal, msg: "branch at the leaf level"),
    }
}

// New leaf, or pair of leaves, for inserting `key` into `records`.
fn leaf_insert(mut records: Vec<(Binary, Binary)>, key: Binary, value: Binary) -> Level {
    match records.binary_search_by(|(k, _)| k.cmp(&key)) {
        Ok(i) => {
            // replacing in place never grows the leaf, never splits.
            records[i].1 = value;
            let key1 = records[0].0.clone();
            Level::One {
                key: key1,
                node: node::encode_leaf(records),
            }
        }
        Err(i) if records.len() < MAX_NODE_SIZE => {
            records.insert(i, (key, value));
            let key1 = records[0].0.clone();
            Level::One {
                key: key1,
                node: node::encode_leaf(records),
            }
        }
        Err(i) => {
            // full leaf splits into MAX/2 and MAX/2 + 1 records, the
            // new record going to whichever half owns its slot.
            let half = MAX_NODE_SIZE / 2;
            let mut b_records = records.split_off(half);
            let mut a_records = records;
            if i < half {
                a_records.insert(i, (key, value));
            } else {
                b_records.insert(i - half, (key, value));
            }
            let (a_key, b_key) = (a_records[0].0.clone(), b_records[0].0.clone());
            Level::Two {
                a: node::encode_leaf(a_records),
                a_key,
                b: node::encode_leaf(b_records),
                b_key,
            }
        }
    }
}

// Rewrite the spine bottom up. `prev` is the offset of the node that
// `level` replaces; each branch on the path drops `prev` and gains the
// replacement children.
fn rebuild(
    rdr: &Reader,
    mut path: Vec<PathEntry>,
    mut prev: u64,
    mut level: Level,
    version: u64,
    append_pos: u64,
) -> Result<(Vec<u8>, u64)> {
    let mut out = Rope::new();

    while let Some(PathEntry { key: node_key, off }) = path.pop() {
        let repl = emit_level(&mut out, append_pos, level);
        level = branch_rewrite(rdr, off, node_key, repl, prev)?;
        prev = off;
    }

    let root = match level {
        Level::One { node, .. } => node,
        Level::Two { a, b, b_key, .. } => {
            let a_off = emit(&mut out, append_pos, a);
            let b_off = emit(&mut out, append_pos, b);
            // the tree grows a level.
            node::encode_branch(vec![(Binary::default(), a_off), (b_key, b_off)])
        }
        // last record deleted; the empty tree is a zero-record leaf.
        Level::Removed => node::encode_leaf(vec![]),
    };

    let new_version = append_pos + (out.size() as u64);
    out.push_u64(version);
    out.merge(root);
    Ok((out.into_bytes(), new_version))
}

// Rewrite one branch of the path: drop the child that was replaced,
// splice in the replacement children, split when the node overflows.
fn branch_rewrite(
    rdr: &Reader,
    off: u64,
    node_key: Binary,
    repl: Repl,
    prev: u64,
) -> Result<Level> {
    let (head, cells) = match Node::load(rdr, off)? {
        Node::Branch { head, cells } => (head, cells),
        Node::Leaf { .. } => return err_at!(Fatal, msg: "leaf at a branch level"),
    };

    // children of the old branch, each keyed by the least key of its
    // subtree; the leading child is keyed by the separator that
    // selected this branch.
    let mut entries: Vec<(Binary, u64)> = Vec::with_capacity(cells.len() + 2);
    entries.push((node_key, head));
    entries.extend(cells.into_iter());
    entries.retain(|(_, child)| *child != prev);

    if let Some((a_key, a_off, b)) = repl {
        splice(&mut entries, a_key, a_off);
        if let Some((b_key, b_off)) = b {
            splice(&mut entries, b_key, b_off);
        }
    }

    let val = match entries.len() {
        // the only child vanished, pass the removal up. underfull
        // survivors are tolerated otherwise, siblings are not
        // rebalanced.
        0 => Level::Removed,
        n if n <= MAX_NODE_SIZE + 1 => {
            let key = entries[0].0.clone();
            Level::One {
                key,
                node: node::encode_branch(entries),
            }
        }
        _ => {
            // a MAX+2 children rewrite splits into halves of MAX/2
            // separators each.
            let b_entries = entries.split_off(MAX_NODE_SIZE / 2 + 1);
            let (a_key, b_key) = (entries[0].0.clone(), b_entries[0].0.clone());
            Level::Two {
                a: node::encode_branch(entries),
                a_key,
                b: node::encode_branch(b_entries),
                b_key,
            }
        }
    };
    Ok(val)
}

// Append a serialized node to the output, returning the absolute file
// offset it will occupy.
fn emit(out: &mut Rope, append_pos: u64, node: Rope) -> u64 {
    let off = append_pos + (out.size() as u64);
    out.merge(node);
    off
}

fn emit_level(out: &mut Rope, append_pos: u64, level: Level) -> Repl {
    match level {
        Level::One { node, key } => {
            let off = emit(out, append_pos, node);
            Some((key, off, None))
        }
        Level::Two { a, a_key, b, b_key } => {
            let a_off = emit(out, append_pos, a);
            let b_off = emit(out, append_pos, b);
            Some((a_key, a_off, Some((b_key, b_off))))
        }
        Level::Removed => None,
    }
}

// Keep `entries` ordered by key; a child with an equal key sorts after.
fn splice(entries: &mut Vec<(Binary, u64)>, key: Binary, child: u64) {
    let i = entries.partition_point(|(k, _)| *k <= key);
    entries.insert(i, (key, child));
}

#[cfg(test)]
#[path = "mutate_test.rs"]
mod mutate_test;
