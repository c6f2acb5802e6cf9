use rand::prelude::random;

use std::{env, fs, path};

use super::*;
use crate::db::{Config, Db};

fn scratch_config(name: &str) -> Config {
    let file: path::PathBuf = [
        env::temp_dir(),
        format!("aodb-{}-{}.data", name, random::<u64>()).into(),
    ]
    .iter()
    .collect();
    fs::remove_file(&file).ok();
    Config::new(&file.into_os_string())
}

fn key(i: usize) -> Binary {
    Binary::from(format!("key-{:02}", i).as_str())
}

fn value(i: usize) -> Binary {
    Binary::from(format!("val-{}", i).as_str())
}

#[test]
fn test_iter() {
    let config = scratch_config("iter");
    let db = Db::open_with(config.clone()).unwrap();

    // version 0 iterates empty.
    assert_eq!(db.iterate(0).unwrap().count(), 0);

    let mut ver = 0;
    for i in 0..10 {
        ver = db.set(ver, key(i), value(i)).unwrap();
    }

    let records: Vec<(Binary, Binary)> =
        db.iterate(ver).unwrap().map(|item| item.unwrap()).collect();
    let want: Vec<(Binary, Binary)> = (0..10).map(|i| (key(i), value(i))).collect();
    assert_eq!(records, want);

    db.close().unwrap();
    fs::remove_file(&config.file).unwrap();
}

#[test]
fn test_iter_from_and_goto() {
    let config = scratch_config("iter-from");
    let db = Db::open_with(config.clone()).unwrap();

    let mut ver = 0;
    for i in (0..20).step_by(2) {
        // even keys only: key-00, key-02, ...
        ver = db.set(ver, key(i), value(i)).unwrap();
    }

    // from an existing key, inclusive.
    let records: Vec<Binary> = db
        .iterate_from(ver, &key(8))
        .unwrap()
        .map(|item| item.unwrap().0)
        .collect();
    let want: Vec<Binary> = (8..20).step_by(2).map(key).collect();
    assert_eq!(records, want);

    // from a missing key, lands on the next one.
    let records: Vec<Binary> = db
        .iterate_from(ver, &key(9))
        .unwrap()
        .map(|item| item.unwrap().0)
        .collect();
    let want: Vec<Binary> = (10..20).step_by(2).map(key).collect();
    assert_eq!(records, want);

    // past the last key.
    assert_eq!(db.iterate_from(ver, &key(99)).unwrap().count(), 0);

    // goto repositions the same iterator, backward too.
    let mut iter = db.iterate_from(ver, &key(12)).unwrap();
    assert_eq!(iter.next().unwrap().unwrap().0, key(12));
    iter.goto(&key(2)).unwrap();
    assert_eq!(iter.next().unwrap().unwrap().0, key(2));
    assert_eq!(iter.next().unwrap().unwrap().0, key(4));
    iter.goto(&key(18)).unwrap();
    assert_eq!(iter.next().unwrap().unwrap().0, key(18));
    assert!(iter.next().is_none());

    db.close().unwrap();
    fs::remove_file(&config.file).unwrap();
}
