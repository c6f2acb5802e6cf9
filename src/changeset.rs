//! Module implement changesets, ordered batches of write operations.

use arbitrary::Arbitrary;

use std::vec;

use crate::binary::Binary;

/// Single operation in a [Changeset].
#[derive(Clone, Debug, PartialEq, Arbitrary)]
pub enum Op {
    /// Insert `key`, or update it when present.
    Modify { key: Binary, value: Binary },
    /// Delete `key`; deleting an absent key is a no-op.
    Remove { key: Binary },
}

impl Op {
    #[inline]
    pub fn modify(key: Binary, value: Binary) -> Op {
        Op::Modify { key, value }
    }

    #[inline]
    pub fn remove(key: Binary) -> Op {
        Op::Remove { key }
    }

    /// Key this operation touches.
    pub fn as_key(&self) -> &Binary {
        match self {
            Op::Modify { key, .. } => key,
            Op::Remove { key } => key,
        }
    }
}

/// Ordered list of write operations, applied front to back as one new
/// version via [apply][crate::Db::apply]. Also the shape of the answer
/// from [diff][crate::Db::diff].
#[derive(Clone, Debug, Default, PartialEq, Arbitrary)]
pub struct Changeset {
    ops: Vec<Op>,
}

impl Changeset {
    pub fn new() -> Changeset {
        Changeset::default()
    }

    /// Queue an insert/update of `key`.
    pub fn modify(&mut self, key: Binary, value: Binary) {
        self.ops.push(Op::modify(key, value));
    }

    /// Queue a delete of `key`.
    pub fn remove(&mut self, key: Binary) {
        self.ops.push(Op::remove(key));
    }

    /// Concatenate `other`'s operations after this changeset's.
    pub fn merge(mut self, other: Changeset) -> Changeset {
        self.ops.extend(other.ops);
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn as_ops(&self) -> &[Op] {
        &self.ops
    }
}

impl IntoIterator for Changeset {
    type Item = Op;
    type IntoIter = vec::IntoIter<Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

#[cfg(test)]
#[path = "changeset_test.rs"]
mod changeset_test;
