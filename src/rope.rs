use crate::binary::Binary;

/// Rope type, assembles the byte image of a data block out of owned
/// fragments, without copying until [into_bytes][Rope::into_bytes].
///
/// Fragments are kept in emit order; merging two ropes moves the
/// fragment list, materializing does a single contiguous allocation.
/// Ropes live only for the duration of one writer operation.
#[derive(Default)]
pub struct Rope {
    frags: Vec<Binary>,
    size: usize,
}

impl Rope {
    pub fn new() -> Rope {
        Rope::default()
    }

    /// Append a fragment.
    pub fn push(&mut self, frag: Binary) {
        self.size += frag.len();
        self.frags.push(frag);
    }

    /// Append a big-endian u32 fragment.
    pub fn push_u32(&mut self, n: u32) {
        self.push(Binary::from(n.to_be_bytes().to_vec()));
    }

    /// Append a big-endian u64 fragment.
    pub fn push_u64(&mut self, n: u64) {
        self.push(Binary::from(n.to_be_bytes().to_vec()));
    }

    /// Append all of `other`'s fragments after this rope's.
    pub fn merge(&mut self, mut other: Rope) {
        self.size += other.size;
        self.frags.append(&mut other.frags);
    }

    /// Serialized length, in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Materialize into a contiguous buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.size);
        for frag in self.frags.into_iter() {
            data.extend_from_slice(frag.as_bytes());
        }
        data
    }
}

#[cfg(test)]
#[path = "rope_test.rs"]
mod rope_test;
