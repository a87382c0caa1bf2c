//! Allocation records.
//!
//! A record tracks one allocation made by a memory space: where the block lives, how large it is,
//! and how to get rid of it. Records are linked into a circular, doubly linked list anchored at the
//! space's `Root`, and carry an intrusive reference count. The thread which drops the count from
//! one to zero unlinks the record and hands it to its deallocator.
//!
//! Structural edits to a list are serialized by the root's list lock. Count changes which do not
//! cross zero never touch the lock.

use alloc::boxed::Box;
use alloc::sync::Arc;

use core::sync::atomic::{self, AtomicIsize, AtomicPtr};
use core::{fmt, ptr};

use crate::fail::{self, Violation};
use crate::ptr::Pointer;
use crate::root::Root;

/// A deallocator.
///
/// This is the capability of a memory space to release what a record tracks. It is invoked exactly
/// once per record, by the thread which drops the last reference, after the record is unlinked.
pub trait Dealloc: Send + Sync {
    /// Release a record.
    ///
    /// The deallocator owns the record from here on, and is responsible for freeing the tracked
    /// block (`record.data()`, `record.size()`). The record's own storage is freed when the box is
    /// dropped.
    fn dealloc(&self, record: Box<Record>);
}

impl<F> Dealloc for F
    where F: Fn(Box<Record>) + Send + Sync {
    fn dealloc(&self, record: Box<Record>) {
        self(record)
    }
}

/// An allocation record.
pub struct Record {
    /// The tracked block.
    ///
    /// This is never dereferenced by the registry.
    alloc_ptr: *mut u8,
    /// The size of the tracked block, in bytes.
    alloc_size: usize,
    /// The deallocator.
    ///
    /// This is `None` for root sentinels, and once the record is handed to it.
    dealloc: Option<Arc<dyn Dealloc>>,
    /// The root of the list this record belongs to.
    ///
    /// This is fixed while the record is linked, and null once it is released.
    pub(crate) root: *const Root,
    /// The previous record in the list.
    ///
    /// Only touched under the root's list lock.
    pub(crate) prev: AtomicPtr<Record>,
    /// The next record in the list.
    ///
    /// Only touched under the root's list lock. For the sentinel, this is the list head.
    pub(crate) next: AtomicPtr<Record>,
    /// The reference count.
    pub(crate) count: AtomicIsize,
}

unsafe impl Send for Record {}
unsafe impl Sync for Record {}

impl Record {
    /// Create an unlinked root sentinel.
    ///
    /// The root fixes up the root pointer and the links once it has a stable address.
    pub(crate) fn sentinel() -> Record {
        Record {
            alloc_ptr: ptr::null_mut(),
            alloc_size: 0,
            dealloc: None,
            root: ptr::null(),
            prev: AtomicPtr::new(ptr::null_mut()),
            next: AtomicPtr::new(ptr::null_mut()),
            count: AtomicIsize::new(0),
        }
    }

    /// The current reference count.
    #[inline]
    pub fn use_count(&self) -> isize {
        self.count.load(atomic::Ordering::Acquire)
    }

    /// The tracked block.
    #[inline]
    pub fn data(&self) -> *mut u8 {
        self.alloc_ptr
    }

    /// The size of the tracked block.
    #[inline]
    pub fn size(&self) -> usize {
        self.alloc_size
    }

    /// The root of the list this record belongs to.
    ///
    /// This is `None` once the record is released, since the root may well be gone by then.
    #[inline]
    pub fn root(&self) -> Option<&Root> {
        unsafe {
            // A root outlives the records linked into it: dropping it with records still linked is
            // a violation.
            self.root.as_ref()
        }
    }

    /// Is this a root sentinel?
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.root().map_or(false, |root| ptr::eq(self, root.sentinel()))
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:p}[0x{:x}] x{}", self.alloc_ptr, self.alloc_size, self.use_count())
    }
}

/// A handle to a live record.
///
/// This is a plain, non-owning pointer: copying it does not touch the count. Ownership handles
/// built on top are expected to `increment` on copy and `decrement` on drop.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RecordRef {
    /// The record.
    ptr: Pointer<Record>,
}

impl RecordRef {
    /// Create a handle from a raw record pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null.
    #[inline]
    pub unsafe fn from_raw(ptr: *mut Record) -> RecordRef {
        RecordRef {
            ptr: Pointer::new(ptr),
        }
    }

    /// The raw record pointer.
    #[inline]
    pub fn as_ptr(&self) -> *mut Record {
        *self.ptr
    }

    /// Borrow the record.
    ///
    /// # Safety
    ///
    /// The record must be alive, and stay alive for `'a`, i.e. the caller must hold a reference
    /// (count) on it.
    #[inline]
    pub unsafe fn get<'a>(&self) -> &'a Record {
        &**self.ptr
    }
}

/// Construct a record and link it into the list of `root`.
///
/// The record starts out with a count of zero. The caller is expected to `increment` it right
/// away; until then, nothing will ever deallocate it.
pub fn construct(root: &Root, alloc_ptr: *mut u8, alloc_size: usize, dealloc: Arc<dyn Dealloc>)
    -> RecordRef {
    let record = Box::into_raw(Box::new(Record {
        alloc_ptr: alloc_ptr,
        alloc_size: alloc_size,
        dealloc: Some(dealloc),
        root: root,
        prev: AtomicPtr::new(root.sentinel_ptr()),
        next: AtomicPtr::new(ptr::null_mut()),
        count: AtomicIsize::new(0),
    }));

    // before: root.next == next; next.prev == root
    // after:  root.next == record; record.prev == root; record.next == next; next.prev == record
    {
        let mut chain = root.lock();
        let next = chain.head();

        unsafe {
            (*record).next.store(next, atomic::Ordering::Relaxed);
            (*next).prev.store(record, atomic::Ordering::Relaxed);
        }

        chain.set_head(record);
    }

    log!(DEBUG, "Tracking {:p}[0x{:x}] in `{}` as {:p}.", alloc_ptr, alloc_size, root.label(),
         record);

    unsafe { RecordRef::from_raw(record) }
}

/// Increment the count of a record.
///
/// # Safety
///
/// The record must be alive.
pub unsafe fn increment(record: RecordRef) {
    let old = record.get().count.fetch_add(1, atomic::Ordering::AcqRel);

    if old < 0 {
        fail::violation(Violation::Increment {
            record: record.as_ptr() as usize,
            count: old,
        });
    }
}

/// Decrement the count of a record.
///
/// If this drops the last reference, the record is unlinked and passed to its deallocator, and
/// `None` is returned. Otherwise, the record is still alive and is returned as is.
///
/// # Safety
///
/// The record must be alive, and the caller must own one of its references (which is given up).
pub unsafe fn decrement(record: RecordRef) -> Option<RecordRef> {
    let rec = record.get();
    let old = rec.count.fetch_sub(1, atomic::Ordering::AcqRel);

    if old == 1 {
        if rec.is_sentinel() {
            fail::violation(Violation::Sentinel {
                record: record.as_ptr() as usize,
            });
        }

        let root = &*rec.root;

        // before: rec.prev.next == rec; rec.next.prev == rec
        // after:  rec.prev.next == rec.next; rec.next.prev == rec.prev
        {
            let mut chain = root.lock();
            let prev = rec.prev.load(atomic::Ordering::Relaxed);
            let next = rec.next.load(atomic::Ordering::Relaxed);

            (*next).prev.store(prev, atomic::Ordering::Relaxed);

            if chain.head() == record.as_ptr() {
                // The predecessor is the root, whose link is held by the lock.
                chain.set_head(next);
            } else {
                (*prev).next.store(next, atomic::Ordering::Relaxed);
            }
        }

        rec.prev.store(ptr::null_mut(), atomic::Ordering::Relaxed);
        rec.next.store(ptr::null_mut(), atomic::Ordering::Relaxed);

        log!(DEBUG, "Releasing {:p}[0x{:x}] from `{}`.", rec.alloc_ptr, rec.alloc_size,
             root.label());

        let mut rec = Box::from_raw(record.as_ptr());
        rec.root = ptr::null();
        // Only sentinels lack a deallocator, and those never get here.
        if let Some(dealloc) = rec.dealloc.take() {
            dealloc.dealloc(rec);
        }

        None
    } else if old < 1 {
        fail::violation(Violation::Decrement {
            record: record.as_ptr() as usize,
            count: old,
        })
    } else {
        Some(record)
    }
}
