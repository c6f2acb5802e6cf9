//! Module implement the append-only journal of framed blocks backing
//! the store.
//!
//! The file is a sequence of two frame types,
//!
//! * Data block, `'d' | length (u32) | payload`, carrying one or more
//!   btree nodes addressed by absolute file offset.
//! * Version record, `'v' | version (u64)`, committing a version as the
//!   database's current version.
//!
//! All integers are big-endian. While the database is open the file
//! only ever grows; the single mutation of existing bytes is the
//! open-time truncation of a torn tail frame.

use fs2::FileExt;
use log::{info, warn};

use std::{
    convert::TryFrom,
    ffi, fs,
    io::{self, Read, Seek, SeekFrom},
    sync::{
        atomic::{AtomicU64, Ordering::SeqCst},
        Arc,
    },
};

use crate::{util, Error, Result};

pub const BLOCK_DATA: u8 = b'd';
pub const BLOCK_VERSION: u8 = b'v';

/// Writing half of the database file, the sole appender.
///
/// Opening the journal scans existing frames to recover the current
/// version and to detect a torn append from a previous incarnation.
/// The flushed length is published through an atomic shared with the
/// reading half, so readers know how far the file is valid.
#[derive(Debug)]
pub struct Journal {
    file: ffi::OsString,
    fd: fs::File,
    size: Arc<AtomicU64>,
    current: u64,
}

impl Journal {
    /// Open the journal at `file`, creating it if missing. Holds an
    /// exclusive advisory lock for the lifetime of the value, one
    /// writing process per database.
    pub fn open(file: &ffi::OsStr) -> Result<Journal> {
        let mut fd = util::open_file_w(file)?;
        err_at!(InvalidFile, fd.try_lock_exclusive(), "open writer for {:?}", file)?;

        let actual = err_at!(IOError, fd.metadata())?.len();
        let (size, current) = Journal::scan(&mut fd, actual)?;
        if size < actual {
            warn!(
                target: "aodb",
                "truncating torn tail of {:?} from {} to {}", file, actual, size
            );
            err_at!(IOError, fd.set_len(size), "truncating {:?}", file)?;
        }
        err_at!(IOError, fd.seek(SeekFrom::End(0)))?;

        info!(target: "aodb", "opened {:?}, size:{} current:{}", file, size, current);

        let val = Journal {
            file: file.to_os_string(),
            fd,
            size: Arc::new(AtomicU64::new(size)),
            current,
        };

        Ok(val)
    }

    // walk the frames from the top of the file. returns the length of
    // the longest prefix of complete frames and the last committed
    // version within it.
    fn scan(fd: &mut fs::File, actual: u64) -> Result<(u64, u64)> {
        err_at!(IOError, fd.seek(SeekFrom::Start(0)))?;
        let mut rdr = io::BufReader::new(fd);

        let (mut pos, mut current) = (0_u64, 0_u64);
        loop {
            let mut typ = [0_u8; 1];
            if err_at!(IOError, rdr.read(&mut typ))? == 0 {
                break; // clean end of file
            }
            match typ[0] {
                BLOCK_VERSION => {
                    if pos + 9 > actual {
                        break; // frame cut off inside the payload
                    }
                    let mut buf = [0_u8; 8];
                    err_at!(IOError, rdr.read_exact(&mut buf))?;
                    current = u64::from_be_bytes(buf);
                    pos += 9;
                }
                BLOCK_DATA => {
                    if pos + 5 > actual {
                        break; // frame cut off inside the header
                    }
                    let mut buf = [0_u8; 4];
                    err_at!(IOError, rdr.read_exact(&mut buf))?;
                    let n = u64::from(u32::from_be_bytes(buf));
                    if pos + 5 + n > actual {
                        break; // frame cut off inside the payload
                    }
                    let n = err_at!(FailConvert, i64::try_from(n))?;
                    err_at!(IOError, rdr.seek(SeekFrom::Current(n)))?;
                    pos += 5 + (n as u64);
                }
                typ => {
                    return err_at!(Corrupted, msg: "unknown block type {} at {}", typ, pos)
                }
            }
        }

        Ok((pos, current))
    }

    /// Append one data block. Returns the file offset at which the
    /// payload's first byte landed.
    pub fn append_data(&mut self, payload: &[u8]) -> Result<u64> {
        let fpos = self.size.load(SeqCst);
        let n = err_at!(FailConvert, u32::try_from(payload.len()))?;

        let mut head = [0_u8; 5];
        head[0] = BLOCK_DATA;
        head[1..].copy_from_slice(&n.to_be_bytes());
        write_file!(self.fd, &head, &self.file, "data-block header")?;
        write_file!(self.fd, payload, &self.file, "data-block payload")?;

        self.size.store(fpos + 5 + u64::from(n), SeqCst);
        Ok(fpos + 5)
    }

    /// Append one version record, committing `version`.
    pub fn append_version(&mut self, version: u64) -> Result<()> {
        let fpos = self.size.load(SeqCst);

        let mut buf = [0_u8; 9];
        buf[0] = BLOCK_VERSION;
        buf[1..].copy_from_slice(&version.to_be_bytes());
        write_file!(self.fd, &buf, &self.file, "version record")?;

        self.size.store(fpos + 9, SeqCst);
        self.current = version;
        Ok(())
    }

    /// Flushed length of the file.
    #[inline]
    pub fn file_size(&self) -> u64 {
        self.size.load(SeqCst)
    }

    /// Handle on the flushed length, for the reading half.
    #[inline]
    pub fn as_size(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.size)
    }

    /// Last committed version found by the open-time scan, or appended
    /// since; 0 when the database has never committed.
    #[inline]
    pub fn to_current(&self) -> u64 {
        self.current
    }

    /// Sync outstanding bytes and release the writer lock.
    pub fn close(self) -> Result<()> {
        err_at!(IOError, self.fd.sync_all(), "sync {:?}", self.file)?;
        err_at!(IOError, self.fd.unlock(), "unlock {:?}", self.file)?;
        info!(
            target: "aodb",
            "closed {:?}, size:{} current:{}", self.file, self.file_size(), self.current
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "journal_test.rs"]
mod journal_test;
