//! Synchronization primitives.

use core::cell::UnsafeCell;
use core::sync::atomic::{self, AtomicBool};
use core::ops;

use crate::sys;

/// A mutual exclusive container.
///
/// This assures that only one holds mutability of the inner value. To get the inner value, you
/// need acquire the "lock". If you try to lock it while a lock is already held elsewhere, it will
/// block the thread until the lock is released.
///
/// This guards the log output. The record lists use their own lock (see `lock::ListLock`).
pub struct Mutex<T> {
    /// The inner value.
    inner: UnsafeCell<T>,
    /// The lock boolean.
    ///
    /// This is true, if and only if the lock is currently held.
    locked: AtomicBool,
}

/// A mutex guard.
///
/// This acts as the lock.
pub struct MutexGuard<'a, T: 'a> {
    mutex: &'a Mutex<T>,
}

/// Release the mutex.
impl<'a, T> Drop for MutexGuard<'a, T> {
    fn drop(&mut self) {
        self.mutex.locked.store(false, atomic::Ordering::Release);
    }
}

impl<'a, T> ops::Deref for MutexGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.mutex.inner.get() }
    }
}

impl<'a, T> ops::DerefMut for MutexGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.mutex.inner.get() }
    }
}

impl<T> Mutex<T> {
    /// Create a new mutex with some inner value.
    pub const fn new(inner: T) -> Mutex<T> {
        Mutex {
            inner: UnsafeCell::new(inner),
            locked: AtomicBool::new(false),
        }
    }

    /// Lock this mutex.
    ///
    /// If another lock is held, this will block the thread until it is released.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        let mut spins = 0;

        // Lock the mutex.
        while self.locked.compare_exchange_weak(false, true, atomic::Ordering::Acquire,
                                                atomic::Ordering::Relaxed).is_err() {
            sys::backoff(&mut spins);
        }

        MutexGuard {
            mutex: self,
        }
    }
}

unsafe impl<T: Send> Sync for Mutex<T> {}
