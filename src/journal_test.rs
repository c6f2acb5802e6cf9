use rand::prelude::random;

use std::{env, ffi, fs, io::Write, path};

use super::*;

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
fn test_journal_fresh() {
    let file = scratch_file("journal-fresh");

    let jn = Journal::open(&file).unwrap();
    assert_eq!(jn.file_size(), 0);
    assert_eq!(jn.to_current(), 0);
    jn.close().unwrap();

    fs::remove_file(&file).unwrap();
}

#[test]
fn test_journal_append_and_reopen() {
    let file = scratch_file("journal-reopen");

    let mut jn = Journal::open(&file).unwrap();
    let fpos = jn.append_data(b"payload-one").unwrap();
    assert_eq!(fpos, 5);
    assert_eq!(jn.file_size(), 5 + 11);

    jn.append_version(13).unwrap();
    assert_eq!(jn.to_current(), 13);

    let fpos = jn.append_data(b"payload-two").unwrap();
    assert_eq!(fpos, 16 + 9 + 5);
    let size = jn.file_size();
    jn.close().unwrap();

    let jn = Journal::open(&file).unwrap();
    assert_eq!(jn.file_size(), size);
    assert_eq!(jn.to_current(), 13);
    jn.close().unwrap();

    fs::remove_file(&file).unwrap();
}

#[test]
fn test_journal_torn_tail() {
    let file = scratch_file("journal-torn");

    let mut jn = Journal::open(&file).unwrap();
    jn.append_data(b"whole").unwrap();
    jn.append_version(5).unwrap();
    let size = jn.file_size();
    jn.close().unwrap();

    // torn data-block payload.
    let mut fd = fs::OpenOptions::new().append(true).open(&file).unwrap();
    fd.write_all(&[BLOCK_DATA, 0, 0, 0, 9, b'p', b'a', b'r']).unwrap();
    fd.sync_all().unwrap();
    drop(fd);

    let jn = Journal::open(&file).unwrap();
    assert_eq!(jn.file_size(), size);
    assert_eq!(jn.to_current(), 5);
    jn.close().unwrap();

    // torn version record.
    let mut fd = fs::OpenOptions::new().append(true).open(&file).unwrap();
    fd.write_all(&[BLOCK_VERSION, 0, 0]).unwrap();
    fd.sync_all().unwrap();
    drop(fd);

    let jn = Journal::open(&file).unwrap();
    assert_eq!(jn.file_size(), size);
    assert_eq!(jn.to_current(), 5);
    jn.close().unwrap();

    // torn data-block header.
    let mut fd = fs::OpenOptions::new().append(true).open(&file).unwrap();
    fd.write_all(&[BLOCK_DATA, 0, 0]).unwrap();
    fd.sync_all().unwrap();
    drop(fd);

    let jn = Journal::open(&file).unwrap();
    assert_eq!(jn.file_size(), size);
    assert_eq!(jn.to_current(), 5);
    jn.close().unwrap();

    fs::remove_file(&file).unwrap();
}

#[test]
fn test_journal_corrupt() {
    let file = scratch_file("journal-corrupt");

    let mut jn = Journal::open(&file).unwrap();
    jn.append_data(b"ok").unwrap();
    jn.close().unwrap();

    let mut fd = fs::OpenOptions::new().append(true).open(&file).unwrap();
    fd.write_all(&[b'x', 1, 2, 3]).unwrap();
    fd.sync_all().unwrap();
    drop(fd);

    match Journal::open(&file) {
        Err(Error::Corrupted(_, _)) => (),
        val => panic!("expected corrupted error, got {:?}", val),
    }

    fs::remove_file(&file).unwrap();
}
