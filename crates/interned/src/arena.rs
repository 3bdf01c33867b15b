//! Contiguous slot storage for all buckets
//!
//! ```text
//! locks: [m0][m1][m2] ...                       one raw mutex per bucket
//! slots: [b0 s0..s31][b1 s0..s31][b2 s0..s31] ...  bucket_count × capacity
//! ```
//!
//! Bucket `i` owns `slots[i * capacity..(i + 1) * capacity]`; that window is
//! only reachable through a [`BucketGuard`] holding `locks[i]`.

use crate::{PooledStr, bucket::Bucket};
use core::{
    cell::UnsafeCell,
    marker::PhantomData,
    ops::{Deref, DerefMut},
};
use parking_lot::{RawMutex, lock_api::RawMutex as RawMutexApi};

pub(crate) struct BucketArena {
    locks: Box<[RawMutex]>,
    slots: Box<[UnsafeCell<Option<PooledStr>>]>,
    capacity: usize,
}

// SAFETY: every slot window is accessed exclusively under its bucket lock
unsafe impl Sync for BucketArena {}

impl BucketArena {
    /// Caller validates that `bucket_count * capacity` does not overflow
    pub(crate) fn new(bucket_count: usize, capacity: usize) -> Self {
        let locks = (0..bucket_count).map(|_| <RawMutex as RawMutexApi>::INIT).collect();
        let slots = (0..bucket_count * capacity).map(|_| UnsafeCell::new(None)).collect();
        Self { locks, slots, capacity }
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize { self.locks.len() }

    #[inline]
    pub(crate) fn capacity(&self) -> usize { self.capacity }

    /// Block until bucket `index` is free and return exclusive access to it
    ///
    /// # Panics
    ///
    /// If `index >= bucket_count`.
    pub(crate) fn lock(&self, index: usize) -> BucketGuard<'_> {
        let lock = &self.locks[index];
        let start = index * self.capacity;
        let cells = &self.slots[start..start + self.capacity];

        lock.lock();

        // SAFETY: UnsafeCell<T> has the layout of T, and holding `lock` makes
        // this the only live reference into the window until the guard drops
        let slots = unsafe {
            core::slice::from_raw_parts_mut(UnsafeCell::raw_get(cells.as_ptr()), cells.len())
        };

        BucketGuard { lock, bucket: Bucket::new(slots), _not_send: PhantomData }
    }
}

/// Exclusive access to one bucket, unlocks on drop
pub(crate) struct BucketGuard<'a> {
    lock: &'a RawMutex,
    bucket: Bucket<'a>,
    _not_send: PhantomData<*const ()>,
}

impl<'a> Deref for BucketGuard<'a> {
    type Target = Bucket<'a>;

    #[inline]
    fn deref(&self) -> &Self::Target { &self.bucket }
}

impl<'a> DerefMut for BucketGuard<'a> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.bucket }
}

impl Drop for BucketGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: the lock was acquired in `BucketArena::lock` on this thread
        unsafe { self.lock.unlock() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn test_windows_are_independent() {
        let arena = BucketArena::new(3, 2);
        assert_eq!(arena.bucket_count(), 3);
        assert_eq!(arena.capacity(), 2);

        arena.lock(0).get_or_add("zero");
        arena.lock(2).get_or_add("two");

        assert_eq!(arena.lock(0).find("zero"), Some(0));
        assert_eq!(arena.lock(1).len(), 0);
        assert_eq!(arena.lock(2).find("zero"), None);
        assert_eq!(arena.lock(2).find("two"), Some(0));
    }

    #[test]
    fn test_guard_releases_lock() {
        let arena = BucketArena::new(1, 4);
        {
            let mut guard = arena.lock(0);
            guard.get_or_add("held");
        }
        // Would deadlock if the first guard kept the lock
        assert_eq!(arena.lock(0).len(), 1);
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_bucket() {
        let arena = BucketArena::new(2, 2);
        let _ = arena.lock(2);
    }

    #[test]
    fn test_lock_is_mutually_exclusive() {
        let arena = Arc::new(BucketArena::new(1, 64));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let arena = Arc::clone(&arena);
                thread::spawn(move || {
                    for i in 0..8 {
                        arena.lock(0).get_or_add(&format!("t{t}-{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let guard = arena.lock(0);
        assert_eq!(guard.len(), 64);
        let mut names: Vec<_> = guard.iter().map(|s| s.to_string()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 64);
    }
}
