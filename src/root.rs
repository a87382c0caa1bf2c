//! Root sentinels.
//!
//! Every memory space owns one root, anchoring the list of its allocation records. The root is
//! itself a record (the sentinel) whose count is always zero, and which is never deallocated.

use alloc::boxed::Box;

use core::pin::Pin;
use core::sync::atomic;
use core::{fmt, marker};

use crate::fail::{self, Violation};
use crate::lock::{ChainGuard, ListLock};
use crate::record::Record;
use crate::sanity::{self, Insanity};

/// The root of a record list.
///
/// Records point back to their root, so a root lives at a fixed address (it is always pinned) and
/// must outlive every record linked into it. Dropping a root which still tracks records is a
/// protocol violation.
pub struct Root {
    /// The sentinel record.
    ///
    /// `sentinel.next` is the list head, guarded by `lock`.
    sentinel: Record,
    /// The list lock.
    lock: ListLock,
    /// A human readable name, usually the name of the memory space.
    label: &'static str,
    /// The sentinel is self-referential.
    _pinned: marker::PhantomPinned,
}

impl Root {
    /// Create a new root with an empty list.
    pub fn new(label: &'static str) -> Pin<Box<Root>> {
        let mut root = Box::pin(Root {
            sentinel: Record::sentinel(),
            lock: ListLock::new(),
            label: label,
            _pinned: marker::PhantomPinned,
        });

        let this = unsafe {
            // Nothing is moved, we only fill in the self-references.
            let root = root.as_mut().get_unchecked_mut();
            let this = root as *const Root;
            let sentinel = &mut root.sentinel as *mut Record;

            root.sentinel.root = this;
            root.sentinel.prev.store(sentinel, atomic::Ordering::Relaxed);
            root.sentinel.next.store(sentinel, atomic::Ordering::Relaxed);

            this
        };

        log!(NOTE, "Created root `{}` at {:p}.", label, this);

        root
    }

    /// The label of this root.
    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// The sentinel record.
    #[inline]
    pub fn sentinel(&self) -> &Record {
        &self.sentinel
    }

    /// The sentinel record, as a link value.
    #[inline]
    pub(crate) fn sentinel_ptr(&self) -> *mut Record {
        &self.sentinel as *const Record as *mut Record
    }

    /// Acquire the list lock.
    #[inline]
    pub(crate) fn lock(&self) -> ChainGuard<'_> {
        self.lock.acquire(&self.sentinel.next)
    }

    /// Check the structural invariants of the list.
    ///
    /// This logs a diagnostic of the first broken node, if any.
    pub fn is_sane(&self) -> bool {
        sanity::is_sane(&self.sentinel)
    }

    /// Check the structural invariants of the list, returning the first violation.
    pub fn validate(&self) -> Result<(), Insanity> {
        sanity::validate(&self.sentinel)
    }

    /// Run a closure on every record in the list, starting from the most recent one.
    ///
    /// The list lock is held throughout, so the closure must not construct or release records in
    /// this root (that would deadlock).
    pub fn for_each<F: FnMut(&Record)>(&self, mut f: F) {
        let chain = self.lock();
        let sentinel = self.sentinel_ptr();
        let mut rec = chain.head();

        while rec != sentinel {
            unsafe {
                f(&*rec);
                rec = (*rec).next.load(atomic::Ordering::Relaxed);
            }
        }
    }

    /// The number of records in the list (not counting the sentinel).
    pub fn len(&self) -> usize {
        let mut len = 0;
        self.for_each(|_| len += 1);

        len
    }

    /// Is the list empty?
    pub fn is_empty(&self) -> bool {
        self.lock().head() == self.sentinel_ptr()
    }

    /// Print the records of the list, one per line.
    ///
    /// With `detail`, the list links of each record are printed as well.
    pub fn print_records<W: fmt::Write>(&self, w: &mut W, detail: bool) -> fmt::Result {
        let mut res = Ok(());

        self.for_each(|rec| {
            if res.is_err() {
                return;
            }

            res = if detail {
                writeln!(w, "{} addr( {:p} ) list( {:p} {:p} ) use_count( {} ) data( {:p} ) \
                             size( {} )",
                         self.label, rec, rec.prev.load(atomic::Ordering::Relaxed),
                         rec.next.load(atomic::Ordering::Relaxed), rec.use_count(), rec.data(),
                         rec.size())
            } else {
                writeln!(w, "{} addr( {:p} ) use_count( {} ) data( {:p} ) size( {} )",
                         self.label, rec, rec.use_count(), rec.data(), rec.size())
            };
        });

        res
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Root({:?} @ {:p})", self.label, self)
    }
}

/// Tear down the root.
///
/// The list must be empty by now.
impl Drop for Root {
    fn drop(&mut self) {
        let sentinel = self.sentinel_ptr();
        let mut records = 0;
        let mut rec = self.sentinel.next.load(atomic::Ordering::Acquire);

        while rec != sentinel && !rec.is_null() {
            records += 1;
            rec = unsafe { (*rec).next.load(atomic::Ordering::Relaxed) };
        }

        if records != 0 {
            fail::violation(Violation::Teardown {
                root: self.label,
                records: records,
            });
        }

        log!(NOTE, "Tearing down root `{}`.", self.label);
    }
}
