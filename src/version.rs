//! Module implement the version chain.
//!
//! A version is the file offset of its 8-byte predecessor link; the
//! root node of the version sits just after the link, at `version + 8`.
//! Version 0 is reserved, it names the empty database and terminates
//! every predecessor chain.

use crate::{reader::Reader, Error, Result};

/// Predecessor of `version`. `version` must be non-zero.
pub fn previous(rdr: &Reader, version: u64) -> Result<u64> {
    let prev = rdr.read_u64(version)?;
    if prev >= version {
        err_at!(Corrupted, msg: "version chain {} -> {}", version, prev)
    } else {
        Ok(prev)
    }
}

/// Whether version `a` descends from version `b` through predecessor
/// links. Every version descends from 0; 0 descends only from 0.
pub fn is_based_on(rdr: &Reader, a: u64, b: u64) -> Result<bool> {
    if b == 0 {
        return Ok(true);
    }
    let mut a = a;
    loop {
        if a < b {
            // includes a == 0; predecessors only ever point backward.
            break Ok(false);
        }
        if a == b {
            break Ok(true);
        }
        a = previous(rdr, a)?;
    }
}

/// Nearest version that both `a` and `b` descend from.
pub fn common_ancestor(rdr: &Reader, a: u64, b: u64) -> Result<u64> {
    let (mut a, mut b) = (a, b);
    loop {
        if a == 0 || b == 0 {
            break Ok(0);
        }
        if a == b {
            break Ok(a);
        }
        if a > b {
            a = previous(rdr, a)?;
        } else {
            b = previous(rdr, b)?;
        }
    }
}
