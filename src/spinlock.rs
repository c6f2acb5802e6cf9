//! Module `spinlock` implement the latch guarding the memory mapping.
//!
//! Readers copy bytes out of the mapping under the shared side; growing
//! the mapping takes the exclusive side. Both sections are a handful of
//! memory operations, so waiters spin instead of parking the thread. A
//! remapper announces itself before waiting for the readers inside to
//! drain, which stops new readers from entering; a steady stream of
//! readers cannot starve a remap.

use std::{
    cell::UnsafeCell,
    hint,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicU32, Ordering::SeqCst},
};

// state word: bit 31 = exclusive side held, bit 30 = remapper waiting,
// bits 0-29 = count of readers inside.
const LOCKED: u32 = 0x80000000;
const WAITING: u32 = 0x40000000;

/// Readers/writer spinlock over `value`. The exclusive side cannot be
/// starved by the shared side.
pub struct Spinlock<T> {
    state: AtomicU32,
    value: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for Spinlock<T> {}
unsafe impl<T: Send + Sync> Sync for Spinlock<T> {}

impl<T> Spinlock<T> {
    pub fn new(value: T) -> Spinlock<T> {
        Spinlock {
            state: AtomicU32::new(0),
            value: UnsafeCell::new(value),
        }
    }

    /// Enter the shared side.
    pub fn read(&self) -> ReadGuard<T> {
        loop {
            let old = self.state.load(SeqCst);
            if (old & (LOCKED | WAITING)) == 0 {
                if self
                    .state
                    .compare_exchange(old, old + 1, SeqCst, SeqCst)
                    .is_ok()
                {
                    break ReadGuard { latch: self };
                }
            }
            hint::spin_loop();
        }
    }

    /// Enter the exclusive side, once the readers inside have drained.
    pub fn write(&self) -> WriteGuard<T> {
        // announce; one exclusive claimant at a time.
        loop {
            let old = self.state.load(SeqCst);
            if (old & (LOCKED | WAITING)) == 0 {
                if self
                    .state
                    .compare_exchange(old, old | WAITING, SeqCst, SeqCst)
                    .is_ok()
                {
                    break;
                }
            }
            hint::spin_loop();
        }
        // wait out the readers, then flip the lock on.
        loop {
            if self
                .state
                .compare_exchange(WAITING, LOCKED, SeqCst, SeqCst)
                .is_ok()
            {
                break WriteGuard { latch: self };
            }
            hint::spin_loop();
        }
    }
}

/// Shared access to the protected value, released on drop.
pub struct ReadGuard<'a, T> {
    latch: &'a Spinlock<T>,
}

impl<'a, T> Deref for ReadGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.latch.value.get() }
    }
}

impl<'a, T> Drop for ReadGuard<'a, T> {
    fn drop(&mut self) {
        self.latch.state.fetch_sub(1, SeqCst);
    }
}

/// Exclusive access to the protected value, released on drop.
pub struct WriteGuard<'a, T> {
    latch: &'a Spinlock<T>,
}

impl<'a, T> Deref for WriteGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.latch.value.get() }
    }
}

impl<'a, T> DerefMut for WriteGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.latch.value.get() }
    }
}

impl<'a, T> Drop for WriteGuard<'a, T> {
    fn drop(&mut self) {
        self.latch.state.store(0, SeqCst);
    }
}

#[cfg(test)]
#[path = "spinlock_test.rs"]
mod spinlock_test;
