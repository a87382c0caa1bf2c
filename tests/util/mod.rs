//! Test automation.

use std::pin::Pin;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use shalloc::{Dealloc, Record, RecordRef, Root};

/// "Multiply" a closure, by running it in multiple threads at the same time.
///
/// The closure gets the index of its thread.
#[allow(dead_code)]
pub fn multiply<F: Fn(usize) + Sync>(threads: usize, func: F) {
    thread::scope(|s| {
        for n in 0..threads {
            let func = &func;
            s.spawn(move || func(n));
        }
    });
}

/// Wrap a block in acid tests.
///
/// The list of `root` is checked for structural sanity before and after the closure runs. Since
/// the checks take the list lock, they can interleave with whatever other threads are doing to
/// the same root.
#[allow(dead_code)]
pub fn acid<F: FnOnce() -> R, R>(root: &Root, func: F) -> R {
    assert!(root.is_sane());
    let res = func();
    assert!(root.is_sane());

    res
}

/// A memory space.
///
/// Blocks are allocated from the global allocator, and the deallocator frees them and counts how
/// many records it has seen.
pub struct Space {
    /// The root of the space.
    pub root: Pin<Box<Root>>,
    /// The number of records deallocated so far.
    freed: Arc<AtomicUsize>,
    /// The deallocator handed to every record.
    dealloc: Arc<dyn Dealloc>,
}

#[allow(dead_code)]
impl Space {
    pub fn new(label: &'static str) -> Space {
        let freed = Arc::new(AtomicUsize::new(0));
        let counter = freed.clone();

        let dealloc: Arc<dyn Dealloc> = Arc::new(move |rec: Box<Record>| {
            assert_eq!(rec.use_count(), 0);

            unsafe {
                drop(Box::from_raw(ptr::slice_from_raw_parts_mut(rec.data(), rec.size())));
            }
            counter.fetch_add(1, Ordering::SeqCst);
        });

        Space {
            root: Root::new(label),
            freed: freed,
            dealloc: dealloc,
        }
    }

    /// Allocate a zeroed block and register it, without counting it.
    pub fn construct(&self, size: usize) -> RecordRef {
        let block = Box::into_raw(vec![0u8; size].into_boxed_slice()) as *mut u8;

        shalloc::construct(&self.root, block, size, self.dealloc.clone())
    }

    /// Allocate a zeroed block and register it, holding one reference.
    pub fn alloc(&self, size: usize) -> RecordRef {
        let rec = self.construct(size);
        unsafe { shalloc::increment(rec) };

        rec
    }

    /// The number of records deallocated so far.
    pub fn freed(&self) -> usize {
        self.freed.load(Ordering::SeqCst)
    }

    /// The addresses of the records in the list, most recent first.
    pub fn records(&self) -> Vec<usize> {
        let mut recs = Vec::new();
        self.root.for_each(|rec| recs.push(rec as *const Record as usize));

        recs
    }
}
