//! Aodb implement an embedded key/value store kept in a single
//! append-only file, with multi-version-concurrency-control.
//!
//! Keys and values are opaque byte strings, [Binary]. Every mutation,
//! [set][Db::set] or [del][Db::del], writes a fresh copy-on-write spine
//! of btree nodes at the end of the file and returns a new version.
//! Versions are plain file offsets and stay readable for the lifetime
//! of the file; nothing is rewritten in place. A process wide *current*
//! version is advanced through [commit][Db::commit], which succeeds
//! only when the committing version descends from the current version,
//! giving compare-and-set semantics over the whole database.
//!
//! Concurrency model
//! -----------------
//!
//! * Any number of readers can read any version, concurrent with each
//!   other and with the writer.
//! * Exactly one writer at a time; writers serialize on the handle's
//!   writer lock.
//! * Committing a version is independent of producing it. A writer may
//!   commit later or never; an uncommitted version is garbage only in
//!   the sense that no one remembers its offset.
//!
//! Reads are served either by a plain seek-and-read backend or through
//! a growable read-only memory map, compiled in with the `mmap`
//! feature (default) and selected via [Config].
//!
//! Recovery
//! --------
//!
//! The file is a sequence of framed blocks. [Db::open] scans the frames
//! and trims a torn frame at the tail, if the previous process died
//! mid-append. Everything before the tail frame is reachable again.

#[macro_use]
mod error;

#[macro_use]
mod util;

mod binary;
mod changeset;
mod db;
mod iter;
mod journal;
mod mutate;
mod node;
mod reader;
mod rope;
mod search;
mod spinlock;
mod version;

pub use crate::binary::Binary;
pub use crate::changeset::{Changeset, Op};
pub use crate::db::{Commit, Config, Db};
pub use crate::error::Error;
pub use crate::iter::Iter;
pub use crate::spinlock::Spinlock;

/// Type alias for Result return type, used by this package.
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum number of records in a leaf node, also the maximum number
/// of separator keys in a branch node. Must be even and >= 4.
pub const MAX_NODE_SIZE: usize = 4;

const _: () = assert!(MAX_NODE_SIZE >= 4 && MAX_NODE_SIZE % 2 == 0);
