use std::{error, fmt, result};

/// Short form to compose Error values.
///
/// Here are few possible ways,
///
/// ```ignore
/// use crate::Error;
/// err_at!(Corrupted, msg: "unknown block type {}", typ)
/// ```
///
/// ```ignore
/// use crate::Error;
/// err_at!(IOError, fd.seek(io::SeekFrom::Start(fpos)))
/// ```
///
/// ```ignore
/// use crate::Error;
/// err_at!(IOError, fd.set_len(size), "truncating {:?}", file)
/// ```
#[macro_export]
macro_rules! err_at {
    ($variant:ident, msg: $($arg:expr),+) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err(Error::$variant(prefix, format!($($arg),+)))
    }};
    ($variant:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err(Error::$variant(prefix, format!("{}", err)))
            }
        }
    }};
    ($variant:ident, $e:expr, $($arg:expr),+) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                let msg = format!($($arg),+);
                Err(Error::$variant(prefix, format!("{} {}", err, msg)))
            }
        }
    }};
}

/// Error variants that can be returned by this package's API.
///
/// Each variant carries a prefix, identifying the location where the
/// error was detected, and a message.
#[derive(Clone, PartialEq)]
pub enum Error {
    /// Internal invariant broken, like a short read inside a committed
    /// region of the file.
    Fatal(String, String),
    /// Error from the operating system while reading, writing, seeking
    /// or mapping the database file.
    IOError(String, String),
    /// Failed integer conversion, typically a key or value too large
    /// for the on-disk framing.
    FailConvert(String, String),
    /// Database file cannot be opened or locked.
    InvalidFile(String, String),
    /// On-disk bytes do not decode as a frame or a btree node.
    Corrupted(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use Error::*;

        match self {
            Fatal(p, m) => write!(f, "{} Fatal: {}", p, m),
            IOError(p, m) => write!(f, "{} IOError: {}", p, m),
            FailConvert(p, m) => write!(f, "{} FailConvert: {}", p, m),
            InvalidFile(p, m) => write!(f, "{} InvalidFile: {}", p, m),
            Corrupted(p, m) => write!(f, "{} Corrupted: {}", p, m),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{}", self)
    }
}

impl error::Error for Error {}
