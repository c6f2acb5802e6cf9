use rand::prelude::random;

use std::{env, ffi, fs, path};

use super::*;
use crate::{journal::Journal, util};

fn scratch_file(name: &str) -> ffi::OsString {
    let file: path::PathBuf = [
        env::temp_dir(),
        format!("aodb-{}-{}.data", name, random::<u64>()).into(),
    ]
    .iter()
    .collect();
    fs::remove_file(&file).ok();
    file.into_os_string()
}

#[test]
fn test_reader_stdio() {
    let file = scratch_file("reader-stdio");
    let mut jn = Journal::open(&file).unwrap();
    jn.append_data(&payload()).unwrap();

    let rdr = Reader::stdio(util::open_file_r(&file).unwrap(), jn.as_size());
    check_reads(&rdr);

    jn.close().unwrap();
    fs::remove_file(&file).unwrap();
}

#[cfg(feature = "mmap")]
#[test]
fn test_reader_mmap() {
    let file = scratch_file("reader-mmap");
    let mut jn = Journal::open(&file).unwrap();
    jn.append_data(&payload()).unwrap();

    let rdr = Reader::mmap(
        util::open_file_r(&file).unwrap(),
        util::open_file_r(&file).unwrap(),
        jn.as_size(),
    );
    // before the first page is full every read falls through.
    check_reads(&rdr);

    // grow past one page so the mapping kicks in, then read both old
    // and fresh offsets.
    let blob = vec![0xab_u8; 8192];
    let fpos = jn.append_data(&blob).unwrap();
    check_reads(&rdr);
    assert_eq!(rdr.read_bytes(fpos, 8192).unwrap(), blob);
    assert_eq!(rdr.read_bytes(fpos + 8190, 2).unwrap(), vec![0xab_u8; 2]);

    jn.close().unwrap();
    fs::remove_file(&file).unwrap();
}

// payload starts at file offset 5.
fn payload() -> Vec<u8> {
    let mut data = vec![];
    data.extend_from_slice(&0xdeadbeef_u32.to_be_bytes());
    data.extend_from_slice(&0x0123456789abcdef_u64.to_be_bytes());
    data.extend_from_slice(&5_u32.to_be_bytes());
    data.extend_from_slice(b"hello");
    data
}

fn check_reads(rdr: &Reader) {
    assert_eq!(rdr.read_u32(5).unwrap(), 0xdeadbeef);
    assert_eq!(rdr.read_u64(9).unwrap(), 0x0123456789abcdef);
    assert_eq!(rdr.read_data(17).unwrap(), Binary::from("hello"));
    assert_eq!(rdr.read_bytes(21, 5).unwrap(), b"hello".to_vec());
}
