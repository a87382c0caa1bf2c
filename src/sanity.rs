//! List validation.
//!
//! This walks a record list under its lock and re-derives every structural invariant. It is meant
//! for tests and diagnostics, never for hot paths. The walk stops at the first node which breaks
//! an invariant.

use core::sync::atomic;
use core::{fmt, ptr};

use crate::record::Record;
use crate::root::Root;
use crate::write::{self, level};

/// A structural check on a single record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Check {
    /// `prev` or `next` is null.
    Null,
    /// The record belongs to another root.
    Root,
    /// The predecessor does not link forward to the record.
    PrevNext,
    /// The successor does not link back to the record.
    NextPrev,
    /// The count is negative.
    Count,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Check::Null => "null link",
            Check::Root => "foreign root",
            Check::PrevNext => "broken prev->next",
            Check::NextPrev => "broken next->prev",
            Check::Count => "negative count",
        })
    }
}

/// The state of a record failing a check.
///
/// Addresses are captured as integers, since the record may well be garbage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// The failed check.
    pub check: Check,
    /// The address of the record.
    pub record: usize,
    /// The count.
    pub count: isize,
    /// The root the record points to.
    pub root: usize,
    /// The next record.
    pub next: usize,
    /// The previous record.
    pub prev: usize,
    /// What the next record links back to.
    pub next_prev: usize,
    /// What the previous record links forward to.
    pub prev_next: usize,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "rec(0x{:012x}){{ count({}) root(0x{:012x}) next(0x{:012x}) prev(0x{:012x}) \
                   next->prev(0x{:012x}) prev->next(0x{:012x}) }}: {}",
               self.record, self.count, self.root, self.next, self.prev, self.next_prev,
               self.prev_next, self.check)
    }
}

/// A broken list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insanity {
    /// The root sentinel has a non-zero count.
    Root {
        /// The count of the sentinel.
        count: isize,
    },
    /// The record was released, and belongs to no list.
    Detached {
        /// The address of the record.
        record: usize,
    },
    /// A record failed a check.
    Node(Snapshot),
}

impl fmt::Display for Insanity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Insanity::Root { count } => write!(f, "root count is {}", count),
            Insanity::Detached { record } =>
                write!(f, "rec(0x{:012x}) is not linked into any list", record),
            Insanity::Node(ref snapshot) => snapshot.fmt(f),
        }
    }
}

/// Check a single record, returning its successor.
///
/// `head` is the list head as held by the lock, which is what the first record's predecessor
/// (the root) links forward to.
unsafe fn inspect(rec: *mut Record, root: &Root, head: *mut Record)
    -> Result<*mut Record, Insanity> {
    let sentinel = root.sentinel_ptr();
    let r = &*rec;

    let prev = r.prev.load(atomic::Ordering::Relaxed);
    let next = r.next.load(atomic::Ordering::Relaxed);
    let count = r.count.load(atomic::Ordering::Acquire);

    let next_prev = if next.is_null() {
        ptr::null_mut()
    } else {
        (*next).prev.load(atomic::Ordering::Relaxed)
    };
    let prev_next = if prev.is_null() {
        ptr::null_mut()
    } else if prev != sentinel {
        (*prev).next.load(atomic::Ordering::Relaxed)
    } else {
        head
    };

    let check = if prev.is_null() || next.is_null() {
        Some(Check::Null)
    } else if r.root != root as *const Root {
        Some(Check::Root)
    } else if prev_next != rec {
        Some(Check::PrevNext)
    } else if next_prev != rec {
        Some(Check::NextPrev)
    } else if count < 0 {
        Some(Check::Count)
    } else {
        None
    };

    match check {
        Some(check) => Err(Insanity::Node(Snapshot {
            check: check,
            record: rec as usize,
            count: count,
            root: r.root as usize,
            next: next as usize,
            prev: prev as usize,
            next_prev: next_prev as usize,
            prev_next: prev_next as usize,
        })),
        None => Ok(next),
    }
}

/// Validate the list which `record` belongs to.
///
/// Any record of the list (including the root sentinel) will do. The first violation found is
/// returned.
pub fn validate(record: &Record) -> Result<(), Insanity> {
    let root = match record.root() {
        Some(root) => root,
        None => return Err(Insanity::Detached {
            record: record as *const Record as usize,
        }),
    };

    let count = root.sentinel().use_count();
    if count != 0 {
        return Err(Insanity::Root { count: count });
    }

    let chain = root.lock();
    let head = chain.head();
    let sentinel = root.sentinel_ptr();

    let mut rec = head;
    while rec != sentinel {
        rec = unsafe { inspect(rec, root, head)? };
    }

    Ok(())
}

/// Is the list which `record` belongs to sane?
///
/// If not, a diagnostic of the first broken record is written to the log.
pub fn is_sane(record: &Record) -> bool {
    match validate(record) {
        Ok(()) => true,
        Err(insanity) => {
            write::log(level::ERROR, "ERROR",
                       format_args!("root `{}` failed is_sane: {}",
                                    record.root().map_or("?", |root| root.label()), insanity),
                       file!(), line!());

            false
        },
    }
}
