//! Module implement the public database handle.
//!
//! [Db] owns the three synchronization domains of the store,
//!
//! * the writer lock, making [set][Db::set]/[del][Db::del] the sole
//!   appender and keeping the append position meaningful,
//! * the version lock, guarding the current version and serializing
//!   commit records,
//! * the block reader's internal latches.
//!
//! All public operations take the handle by shared reference; clones
//! of data cross the API boundary, never borrows into the file.

use log::{debug, info};

use std::{
    convert::TryFrom,
    env, ffi, path,
    sync::{Mutex, MutexGuard},
};

use crate::{
    binary::Binary,
    changeset::{Changeset, Op},
    iter::Iter,
    journal::Journal,
    mutate,
    node::Node,
    reader::Reader,
    search, util, version, Error, Result,
};

/// Configuration for opening a [Db].
#[derive(Clone, Debug)]
pub struct Config {
    /// Location of the database file, created when missing.
    pub file: ffi::OsString,
    /// Serve reads through a growable read-only memory map. Effective
    /// only when the crate is built with the `mmap` feature, otherwise
    /// reads seek.
    pub mmap: bool,
}

impl Config {
    /// Create a new configuration value, use the `set_*` methods to
    /// add more configuration.
    pub fn new(file: &ffi::OsStr) -> Config {
        Config {
            file: file.to_os_string(),
            mmap: cfg!(feature = "mmap"),
        }
    }

    pub fn set_mmap(&mut self, mmap: bool) -> &mut Self {
        self.mmap = mmap;
        self
    }
}

impl<'a> arbitrary::Arbitrary<'a> for Config {
    fn arbitrary(u: &mut arbitrary::Unstructured) -> arbitrary::Result<Self> {
        let file: path::PathBuf = [
            env::temp_dir(),
            format!("aodb-arbitrary-{}.data", u.arbitrary::<u64>()?).into(),
        ]
        .iter()
        .collect();

        let config = Config {
            file: file.into_os_string(),
            mmap: u.arbitrary::<bool>()? && cfg!(feature = "mmap"),
        };
        Ok(config)
    }
}

/// Database handle. Share it across threads behind an `Arc`; readers
/// proceed in parallel with each other and with the single writer.
pub struct Db {
    config: Config,
    journal: Mutex<Journal>,
    reader: Reader,
    cur: Mutex<u64>,
}

impl Db {
    /// Open or create the database at `file`. A torn frame at the tail,
    /// left by a crashed writer, is trimmed away.
    pub fn open(file: &ffi::OsStr) -> Result<Db> {
        Db::open_with(Config::new(file))
    }

    /// [open][Db::open], configured.
    pub fn open_with(config: Config) -> Result<Db> {
        let journal = Journal::open(&config.file)?;
        let size = journal.as_size();

        #[cfg(feature = "mmap")]
        let reader = if config.mmap {
            Reader::mmap(
                util::open_file_r(&config.file)?,
                util::open_file_r(&config.file)?,
                size,
            )
        } else {
            Reader::stdio(util::open_file_r(&config.file)?, size)
        };
        #[cfg(not(feature = "mmap"))]
        let reader = Reader::stdio(util::open_file_r(&config.file)?, size);

        let cur = Mutex::new(journal.to_current());
        let val = Db {
            config,
            journal: Mutex::new(journal),
            reader,
            cur,
        };
        Ok(val)
    }

    /// Sync outstanding bytes, release locks and mappings.
    pub fn close(self) -> Result<()> {
        err_at!(Fatal, self.journal.into_inner())?.close()
    }

    pub fn as_config(&self) -> &Config {
        &self.config
    }

    /// Current committed version, 0 when nothing was ever committed.
    pub fn current(&self) -> Result<u64> {
        Ok(*err_at!(Fatal, self.cur.lock())?)
    }

    /// Length of the database file.
    pub fn file_size(&self) -> Result<u64> {
        Ok(err_at!(Fatal, self.journal.lock())?.file_size())
    }

    /// Advance the current version to `version`, compare-and-set
    /// fashion: succeeds, appending a version record, iff `version`
    /// descends from the current version.
    pub fn commit(&self, version: u64) -> Result<bool> {
        let mut cur = err_at!(Fatal, self.cur.lock())?;
        if !version::is_based_on(&self.reader, version, *cur)? {
            return Ok(false);
        }
        err_at!(Fatal, self.journal.lock())?.append_version(version)?;
        *cur = version;
        info!(target: "aodb", "committed {}", version);
        Ok(true)
    }

    /// First half of a two-phase commit. `Some` holds the version lock
    /// until the [Commit] value is finished or dropped; `None` means
    /// `version` does not descend from the current version and the
    /// lock was released right away.
    pub fn commit_init(&self, version: u64) -> Result<Option<Commit>> {
        let cur = err_at!(Fatal, self.cur.lock())?;
        if version::is_based_on(&self.reader, version, *cur)? {
            Ok(Some(Commit {
                db: self,
                cur,
                version,
            }))
        } else {
            Ok(None)
        }
    }

    /// Whether `key` exists in `version`.
    pub fn has(&self, version: u64, key: &Binary) -> Result<bool> {
        Ok(self.get(version, key)?.is_some())
    }

    /// Value stored for `key` in `version`, None when absent. Version
    /// 0 is the empty database.
    pub fn get(&self, version: u64, key: &Binary) -> Result<Option<Binary>> {
        if version == 0 {
            return Ok(None);
        }
        let off = search::search_leaf(&self.reader, version, key)?;
        let mut records = match Node::load(&self.reader, off)? {
            Node::Leaf { records } => records,
            Node::Branch { .. } => return err_at!(Fatal, msg: "landed on a branch"),
        };
        let val = match records.binary_search_by(|(k, _)| k.cmp(key)) {
            Ok(i) => Some(records.swap_remove(i).1),
            Err(_) => None,
        };
        Ok(val)
    }

    /// Insert `key`/`value` into `version`, returning the new,
    /// uncommitted, version.
    pub fn set(&self, version: u64, key: Binary, value: Binary) -> Result<u64> {
        let mut jn = err_at!(Fatal, self.journal.lock())?;
        self.set_locked(&mut jn, version, key, value)
    }

    /// Delete `key` from `version`, returning the new version.
    /// Deleting an absent key returns `version` itself.
    pub fn del(&self, version: u64, key: &Binary) -> Result<u64> {
        let mut jn = err_at!(Fatal, self.journal.lock())?;
        self.del_locked(&mut jn, version, key)
    }

    /// Apply `changeset` on top of `version` as one writer operation,
    /// returning the last version of the fold. Commit the returned
    /// version to make the whole batch visible at once.
    pub fn apply(&self, version: u64, changeset: Changeset) -> Result<u64> {
        let mut jn = err_at!(Fatal, self.journal.lock())?;
        let mut ver = version;
        for op in changeset.into_iter() {
            ver = match op {
                Op::Modify { key, value } => self.set_locked(&mut jn, ver, key, value)?,
                Op::Remove { key } => self.del_locked(&mut jn, ver, &key)?,
            };
        }
        Ok(ver)
    }

    fn set_locked(
        &self,
        jn: &mut MutexGuard<Journal>,
        version: u64,
        key: Binary,
        value: Binary,
    ) -> Result<u64> {
        err_at!(FailConvert, u32::try_from(key.len()), "key too large")?;
        err_at!(FailConvert, u32::try_from(value.len()), "value too large")?;

        let append_pos = jn.file_size() + 5;
        let (payload, new_version) =
            mutate::plan_set(&self.reader, version, key, value, append_pos)?;
        jn.append_data(&payload)?;
        debug!(target: "aodb", "set {} -> {}", version, new_version);
        Ok(new_version)
    }

    fn del_locked(
        &self,
        jn: &mut MutexGuard<Journal>,
        version: u64,
        key: &Binary,
    ) -> Result<u64> {
        let append_pos = jn.file_size() + 5;
        match mutate::plan_del(&self.reader, version, key, append_pos)? {
            Some((payload, new_version)) => {
                jn.append_data(&payload)?;
                debug!(target: "aodb", "del {} -> {}", version, new_version);
                Ok(new_version)
            }
            None => Ok(version),
        }
    }

    /// Whether version `a` descends from version `b`.
    pub fn is_based_on(&self, a: u64, b: u64) -> Result<bool> {
        version::is_based_on(&self.reader, a, b)
    }

    /// Predecessor of `version`; 0's predecessor is 0.
    pub fn previous_version(&self, version: u64) -> Result<u64> {
        if version == 0 {
            Ok(0)
        } else {
            version::previous(&self.reader, version)
        }
    }

    /// Nearest version both `a` and `b` descend from.
    pub fn common_ancestor(&self, a: u64, b: u64) -> Result<u64> {
        version::common_ancestor(&self.reader, a, b)
    }

    /// Iterate `version`'s records in key order.
    pub fn iterate(&self, version: u64) -> Result<Iter> {
        Iter::new(&self.reader, version)
    }

    /// Iterate `version`'s records in key order, starting at the first
    /// key `>= key`.
    pub fn iterate_from(&self, version: u64, key: &Binary) -> Result<Iter> {
        Iter::new_from(&self.reader, version, key)
    }

    /// Changeset that transforms version `old` into version `new`:
    /// modifies for keys added or changed in `new`, removes for keys
    /// dropped from `new`.
    pub fn diff(&self, old: u64, new: u64) -> Result<Changeset> {
        let mut changeset = Changeset::new();
        if old == new {
            // immutable file, equal offsets are equal trees.
            return Ok(changeset);
        }

        let mut old_iter = self.iterate(old)?;
        let mut new_iter = self.iterate(new)?;
        let mut old_rec = old_iter.next().transpose()?;
        let mut new_rec = new_iter.next().transpose()?;
        loop {
            match (old_rec.take(), new_rec.take()) {
                (None, None) => break,
                (Some((k, _)), None) => {
                    changeset.remove(k);
                    old_rec = old_iter.next().transpose()?;
                }
                (None, Some((k, v))) => {
                    changeset.modify(k, v);
                    new_rec = new_iter.next().transpose()?;
                }
                (Some((ok, ov)), Some((nk, nv))) => {
                    if ok < nk {
                        changeset.remove(ok);
                        old_rec = old_iter.next().transpose()?;
                        new_rec = Some((nk, nv));
                    } else if ok > nk {
                        changeset.modify(nk, nv);
                        old_rec = Some((ok, ov));
                        new_rec = new_iter.next().transpose()?;
                    } else {
                        if ov != nv {
                            changeset.modify(nk, nv);
                        }
                        old_rec = old_iter.next().transpose()?;
                        new_rec = new_iter.next().transpose()?;
                    }
                }
            }
        }
        Ok(changeset)
    }
}

/// Second half of a two-phase commit, holding the version lock.
///
/// [finish][Commit::finish] appends the commit record and advances the
/// current version; dropping the value aborts, releasing the lock
/// without writing.
pub struct Commit<'a> {
    db: &'a Db,
    cur: MutexGuard<'a, u64>,
    version: u64,
}

impl<'a> Commit<'a> {
    /// Version this commit will install.
    pub fn to_version(&self) -> u64 {
        self.version
    }

    /// Append the commit record and advance the current version.
    pub fn finish(mut self) -> Result<()> {
        err_at!(Fatal, self.db.journal.lock())?.append_version(self.version)?;
        *self.cur = self.version;
        info!(target: "aodb", "committed {}", self.version);
        Ok(())
    }

    /// Release the version lock without committing.
    pub fn abort(self) {}
}

#[cfg(test)]
#[path = "db_test.rs"]
mod db_test;
