use rand::prelude::random;

use std::{sync::Arc, thread, time};

use super::*;

#[test]
fn test_spinlock() {
    let spin = Arc::new(Spinlock::new(vec![0_u8; 64]));
    let (n_readers, n_writers) = (4, 2);

    let mut writers = vec![];
    for idx in 0..n_writers {
        let spin = Arc::clone(&spin);
        writers.push(thread::spawn(move || {
            let value: Vec<u8> = vec![idx as u8; 64];
            let mut ops = 0;
            let start = time::SystemTime::now();
            while start.elapsed().unwrap().as_millis() < 500 {
                {
                    let mut w = spin.write();
                    w.copy_from_slice(&value);
                    ops += 1;
                }
            }
            ops
        }));
    }

    let mut readers = vec![];
    for _idx in 0..n_readers {
        let spin = Arc::clone(&spin);
        readers.push(thread::spawn(move || {
            let mut ops = 0;
            let start = time::SystemTime::now();
            while start.elapsed().unwrap().as_millis() < 500 {
                {
                    let r = spin.read();
                    // a torn write would leave mixed bytes behind.
                    let first = r[0];
                    assert!(r.iter().all(|byte| *byte == first));
                    ops += 1;
                }
                busy_loop(25);
            }
            ops
        }));
    }

    // writers make progress even with readers hammering the shared
    // side.
    let w_ops: usize = writers.into_iter().map(|w| w.join().unwrap()).sum();
    let r_ops: usize = readers.into_iter().map(|r| r.join().unwrap()).sum();
    assert!(w_ops > 0);
    assert!(r_ops > 0);
    println!("test_spinlock w_ops:{} r_ops:{}", w_ops, r_ops);
}

fn busy_loop(count: usize) -> u64 {
    let acc: u64 = (0..count).map(|_| random::<u32>() as u64).sum();
    acc
}
