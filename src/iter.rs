//! Module implement forward iteration over one version of the btree.

use std::mem;

use crate::{binary::Binary, node::Node, reader::Reader, Result};

enum Frame {
    Leaf {
        records: Vec<(Binary, Binary)>,
        pos: usize,
    },
    Branch {
        children: Vec<u64>,
        pos: usize,
    },
}

/// Forward iterator over the records of a version, in key order.
///
/// The iterator keeps an explicit stack of visited nodes, one frame
/// per tree level. Exhausting a leaf pops frames until a branch still
/// has an unvisited child, then descends into that child's leftmost
/// leaf.
pub struct Iter<'a> {
    rdr: &'a Reader,
    version: u64,
    stack: Vec<Frame>,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(rdr: &'a Reader, version: u64) -> Result<Iter<'a>> {
        let mut iter = Iter {
            rdr,
            version,
            stack: vec![],
        };
        if version != 0 {
            iter.push_node(version + 8)?;
        }
        Ok(iter)
    }

    pub(crate) fn new_from(rdr: &'a Reader, version: u64, key: &Binary) -> Result<Iter<'a>> {
        let mut iter = Iter {
            rdr,
            version,
            stack: vec![],
        };
        if version != 0 {
            iter.seek(key)?;
        }
        Ok(iter)
    }

    /// Reposition at the first record whose key is `>= key`.
    pub fn goto(&mut self, key: &Binary) -> Result<()> {
        self.stack.clear();
        if self.version != 0 {
            self.seek(key)?;
        }
        Ok(())
    }

    fn push_node(&mut self, off: u64) -> Result<()> {
        let frame = match Node::load(self.rdr, off)? {
            Node::Leaf { records } => Frame::Leaf { records, pos: 0 },
            Node::Branch { head, cells } => {
                let mut children = Vec::with_capacity(cells.len() + 1);
                children.push(head);
                children.extend(cells.into_iter().map(|(_, child)| child));
                Frame::Branch { children, pos: 0 }
            }
        };
        self.stack.push(frame);
        Ok(())
    }

    // descend towards `key`, leaving every frame positioned at the
    // first child/record not yet consumed.
    fn seek(&mut self, key: &Binary) -> Result<()> {
        let mut off = self.version + 8;
        loop {
            match Node::load(self.rdr, off)? {
                Node::Leaf { records } => {
                    let pos = records.partition_point(|(k, _)| k < key);
                    self.stack.push(Frame::Leaf { records, pos });
                    break Ok(());
                }
                Node::Branch { head, cells } => {
                    let owner = cells.partition_point(|(sep, _)| *sep <= *key);
                    let mut children = Vec::with_capacity(cells.len() + 1);
                    children.push(head);
                    children.extend(cells.into_iter().map(|(_, child)| child));
                    off = children[owner];
                    self.stack.push(Frame::Branch {
                        children,
                        pos: owner + 1,
                    });
                }
            }
        }
    }
}

enum Step {
    Record((Binary, Binary)),
    Descend(u64),
    Ascend,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<(Binary, Binary)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let step = match self.stack.last_mut()? {
                Frame::Leaf { records, pos } => {
                    if *pos < records.len() {
                        let rec = mem::take(&mut records[*pos]);
                        *pos += 1;
                        Step::Record(rec)
                    } else {
                        Step::Ascend
                    }
                }
                Frame::Branch { children, pos } => {
                    if *pos < children.len() {
                        let off = children[*pos];
                        *pos += 1;
                        Step::Descend(off)
                    } else {
                        Step::Ascend
                    }
                }
            };
            match step {
                Step::Record(rec) => break Some(Ok(rec)),
                Step::Descend(off) => {
                    if let Err(err) = self.push_node(off) {
                        break Some(Err(err));
                    }
                }
                Step::Ascend => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "iter_test.rs"]
mod iter_test;
