//! Module implement common utility functions for file handling.

use std::{ffi, fs, path};

use crate::{Error, Result};

#[macro_export]
macro_rules! read_file {
    ($fd:expr, $seek:expr, $n:expr, $msg:expr) => {{
        use std::convert::TryFrom;

        match $fd.seek($seek) {
            Ok(_) => {
                let mut buf = vec![0; usize::try_from($n).unwrap()];
                match $fd.read(&mut buf) {
                    Ok(n) if buf.len() == n => Ok(buf),
                    Ok(n) => {
                        let m = buf.len();
                        err_at!(Fatal, msg: concat!($msg, " {}/{} at {:?}"), m, n, $seek)
                    }
                    Err(err) => err_at!(IOError, Err(err)),
                }
            }
            Err(err) => err_at!(IOError, Err(err)),
        }
    }};
}

#[macro_export]
macro_rules! write_file {
    ($fd:expr, $buffer:expr, $file:expr, $msg:expr) => {{
        use std::io::Write;

        match err_at!(IOError, $fd.write($buffer))? {
            n if $buffer.len() == n => Ok(n),
            n => err_at!(
                Fatal, msg: "partial-wr {}, {:?}, {}/{}", $msg, $file, $buffer.len(), n
            ),
        }
    }};
}

// open the database file for appending, creating it if missing.
pub fn open_file_w(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = path::Path::new(file);

    if let Some(parent) = os_file.parent() {
        err_at!(IOError, fs::create_dir_all(parent))?;
    }

    let mut opts = fs::OpenOptions::new();
    Ok(err_at!(
        InvalidFile,
        opts.read(true).append(true).create(true).open(os_file)
    )?)
}

// open the database file for reading.
pub fn open_file_r(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = path::Path::new(file);
    Ok(err_at!(
        InvalidFile,
        fs::OpenOptions::new().read(true).open(os_file)
    )?)
}
