use std::fmt;

/// Binary type, an opaque sequence of bytes, the shape of every key and
/// value stored by this package.
///
/// Ordering is lexicographic over unsigned bytes, the empty value
/// ordering before everything else.
#[derive(Clone, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Binary {
    pub val: Vec<u8>,
}

impl Binary {
    #[inline]
    pub fn len(&self) -> usize {
        self.val.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.val.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.val
    }

    /// Concatenate `other` after this value.
    pub fn concat(mut self, other: Binary) -> Binary {
        self.val.extend(other.val);
        self
    }
}

impl From<Vec<u8>> for Binary {
    fn from(val: Vec<u8>) -> Binary {
        Binary { val }
    }
}

impl From<&[u8]> for Binary {
    fn from(val: &[u8]) -> Binary {
        Binary { val: val.to_vec() }
    }
}

impl From<&str> for Binary {
    fn from(val: &str) -> Binary {
        Binary {
            val: val.as_bytes().to_vec(),
        }
    }
}

impl fmt::Debug for Binary {
    // python style string, non-printable bytes hex escaped.
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "b\"")?;
        for byte in self.val.iter() {
            match byte {
                b'\n' => write!(f, "\\n")?,
                byte if *byte >= 127 || *byte < 32 => write!(f, "\\x{:02x}", byte)?,
                byte => write!(f, "{}", *byte as char)?,
            }
        }
        write!(f, "\"")
    }
}

impl<'a> arbitrary::Arbitrary<'a> for Binary {
    fn arbitrary(u: &mut arbitrary::Unstructured) -> arbitrary::Result<Self> {
        let size = u.arbitrary::<usize>()? % 1024;
        let val = match u.arbitrary::<u64>()? {
            0 => Binary::default(),
            val => Binary {
                val: format!("{:0width$}", val, width = size).as_bytes().to_vec(),
            },
        };
        Ok(val)
    }
}

impl rand::distributions::Distribution<Binary> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Binary {
        let (val, size) = (rng.gen::<u64>(), rng.gen::<usize>() % 1024);
        Binary {
            val: format!("{:0width$}", val, width = size).as_bytes().to_vec(),
        }
    }
}

#[cfg(test)]
#[path = "binary_test.rs"]
mod binary_test;
