//! Module implement random reads over the database file.
//!
//! Reads are served by one of two backends, picked when the handle is
//! opened,
//!
//! * *stdio*, every read seeks and reads under a mutex,
//! * *mmap*, reads copy out of a read-only memory map covering the
//!   page-aligned prefix of the flushed file, growing the map on
//!   demand. Reads past the map fall through to the stdio side.
//!
//! Either way the readers synchronize internally; callers share the
//! [Reader] freely across threads. Offsets handed to a reader always
//! point inside committed frames, so a short read here means the file
//! is broken, not merely behind.

use std::{
    convert::TryFrom,
    fs,
    io::{Read, Seek, SeekFrom},
    sync::{
        atomic::{AtomicU64, Ordering::SeqCst},
        Arc, Mutex,
    },
};

#[cfg(feature = "mmap")]
use crate::spinlock::Spinlock;
use crate::{binary::Binary, Error, Result};

// mappings grow in whole pages; a fixed multiple of the real page size
// only makes the rounding coarser, never unsafe.
#[cfg(feature = "mmap")]
const PAGE_SIZE: u64 = 4096;

#[cfg(feature = "mmap")]
struct Mapping {
    fd: fs::File,
    map: Option<memmap2::Mmap>,
    len: u64,
}

/// Reading half of the database file.
pub struct Reader {
    size: Arc<AtomicU64>,
    fd: Mutex<fs::File>,
    #[cfg(feature = "mmap")]
    mapping: Option<Spinlock<Mapping>>,
}

impl Reader {
    /// Stdio backend over `fd`. `size` is the flushed length published
    /// by the writing half.
    pub fn stdio(fd: fs::File, size: Arc<AtomicU64>) -> Reader {
        Reader {
            size,
            fd: Mutex::new(fd),
            #[cfg(feature = "mmap")]
            mapping: None,
        }
    }

    /// Mmap backend; `fd` serves the fall-through reads, `map_fd` backs
    /// the mapping.
    #[cfg(feature = "mmap")]
    pub fn mmap(fd: fs::File, map_fd: fs::File, size: Arc<AtomicU64>) -> Reader {
        Reader {
            size,
            fd: Mutex::new(fd),
            mapping: Some(Spinlock::new(Mapping {
                fd: map_fd,
                map: None,
                len: 0,
            })),
        }
    }

    /// Read exactly `n` bytes at offset `off`.
    pub fn read_bytes(&self, off: u64, n: usize) -> Result<Vec<u8>> {
        #[cfg(feature = "mmap")]
        {
            if self.mapping.is_some() {
                return self.read_mapped(off, n);
            }
        }
        self.read_stdio(off, n)
    }

    /// Big-endian u32 at offset `off`.
    pub fn read_u32(&self, off: u64) -> Result<u32> {
        let buf = self.read_bytes(off, 4)?;
        let mut scratch = [0_u8; 4];
        scratch.copy_from_slice(&buf);
        Ok(u32::from_be_bytes(scratch))
    }

    /// Big-endian u64 at offset `off`.
    pub fn read_u64(&self, off: u64) -> Result<u64> {
        let buf = self.read_bytes(off, 8)?;
        let mut scratch = [0_u8; 8];
        scratch.copy_from_slice(&buf);
        Ok(u64::from_be_bytes(scratch))
    }

    /// Length-prefixed byte string at offset `off`.
    pub fn read_data(&self, off: u64) -> Result<Binary> {
        let n = self.read_u32(off)?;
        let n = err_at!(FailConvert, usize::try_from(n))?;
        Ok(Binary::from(self.read_bytes(off + 4, n)?))
    }

    fn read_stdio(&self, off: u64, n: usize) -> Result<Vec<u8>> {
        let mut fd = err_at!(Fatal, self.fd.lock())?;
        read_file!(fd, SeekFrom::Start(off), n, "reading block")
    }

    #[cfg(feature = "mmap")]
    fn read_mapped(&self, off: u64, n: usize) -> Result<Vec<u8>> {
        let mapping = self.mapping.as_ref().unwrap();
        let end = off + err_at!(FailConvert, u64::try_from(n))?;

        {
            let m = mapping.read();
            if end <= m.len {
                return Mapping::copy_out(&m, off, end);
            }
        }

        // the range is past the mapping. grow the mapping if the
        // flushed prefix covers it, else serve from the stdio side.
        let grown = Reader::page_floor(self.size.load(SeqCst));
        if grown < end {
            return self.read_stdio(off, n);
        }

        {
            let mut m = mapping.write();
            if m.len < grown {
                let len = err_at!(FailConvert, usize::try_from(grown))?;
                let map = {
                    let mut opts = memmap2::MmapOptions::new();
                    err_at!(IOError, unsafe { opts.len(len).map(&m.fd) })?
                };
                m.map = Some(map);
                m.len = grown;
            }
        }

        let m = mapping.read();
        Mapping::copy_out(&m, off, end)
    }

    #[cfg(feature = "mmap")]
    fn page_floor(size: u64) -> u64 {
        size - (size % PAGE_SIZE)
    }
}

#[cfg(feature = "mmap")]
impl Mapping {
    fn copy_out(m: &Mapping, off: u64, end: u64) -> Result<Vec<u8>> {
        let start = err_at!(FailConvert, usize::try_from(off))?;
        let end = err_at!(FailConvert, usize::try_from(end))?;
        match &m.map {
            Some(map) => Ok(map[start..end].to_vec()),
            None => err_at!(Fatal, msg: "no mapping for {}..{}", start, end),
        }
    }
}

#[cfg(test)]
#[path = "reader_test.rs"]
mod reader_test;
