//! The list lock.
//!
//! Every root owns one of these, serializing structural edits (link and unlink) to its record
//! list. Acquiring the lock hands the list head (the root's successor link) to the acquiring
//! thread, and releasing it publishes the head back. Only O(1) work is ever done while it is held,
//! so contenders simply spin.

use core::sync::atomic::{self, AtomicBool, AtomicPtr};

use crate::fail::{self, Violation};
use crate::record::Record;
use crate::sys;

/// A list lock.
///
/// This is the "busy" marker of a root's successor link, kept in a field of its own.
pub struct ListLock {
    /// Is the lock held?
    locked: AtomicBool,
}

/// A held list lock.
///
/// The guard holds the list head privately. Edits to the head go through `set_head`, and are
/// published to the link when the guard is dropped.
#[must_use = "the list is unlocked as soon as the guard is dropped"]
pub struct ChainGuard<'a> {
    /// The lock being held.
    lock: &'a ListLock,
    /// The link holding the list head (the root's `next`).
    link: &'a AtomicPtr<Record>,
    /// The head, as observed when acquiring.
    head: *mut Record,
}

impl ListLock {
    /// Create a new, unlocked list lock.
    pub const fn new() -> ListLock {
        ListLock {
            locked: AtomicBool::new(false),
        }
    }

    /// Acquire the lock, taking over the head stored in `link`.
    ///
    /// If another thread holds the lock, this spins until it is released.
    pub fn acquire<'a>(&'a self, link: &'a AtomicPtr<Record>) -> ChainGuard<'a> {
        let mut spins = 0;

        while self.locked.swap(true, atomic::Ordering::Acquire) {
            sys::backoff(&mut spins);
        }

        ChainGuard {
            lock: self,
            link: link,
            head: link.load(atomic::Ordering::Relaxed),
        }
    }
}

impl<'a> ChainGuard<'a> {
    /// The first record after the root.
    ///
    /// If the list is empty, this is the root sentinel itself.
    #[inline]
    pub fn head(&self) -> *mut Record {
        self.head
    }

    /// Replace the first record after the root.
    ///
    /// The new head becomes visible to other threads when the lock is released.
    #[inline]
    pub fn set_head(&mut self, head: *mut Record) {
        debug_assert!(!head.is_null(), "Null list head.");

        self.head = head;
    }
}

/// Release the lock.
impl<'a> Drop for ChainGuard<'a> {
    fn drop(&mut self) {
        self.link.store(self.head, atomic::Ordering::Relaxed);

        if !self.lock.locked.swap(false, atomic::Ordering::Release) {
            fail::violation(Violation::Unlock {
                lock: self.lock as *const ListLock as usize,
            });
        }
    }
}
