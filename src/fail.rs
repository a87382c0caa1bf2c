//! General error handling.
//!
//! Breaking the record protocol (counting a dead record, releasing a lock nobody holds, tearing
//! down a root which still tracks records) means memory safety is already lost. There is nothing
//! to recover, so these are reported through a handler which never returns.

use core::sync::atomic::{self, AtomicPtr};
use core::{fmt, mem, ptr};

use crate::write::{self, level};
use crate::sys;

/// The violation handler.
///
/// Null means the default handler.
static VIOLATION_HANDLER: AtomicPtr<()> = AtomicPtr::new(ptr::null_mut());

/// A broken protocol invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Violation {
    /// A record was incremented while its count was negative.
    Increment {
        /// The address of the record.
        record: usize,
        /// The count observed before the increment.
        count: isize,
    },
    /// A record was decremented while its count was below one.
    ///
    /// This is a double free.
    Decrement {
        /// The address of the record.
        record: usize,
        /// The count observed before the decrement.
        count: isize,
    },
    /// A list lock was released while not being held.
    Unlock {
        /// The address of the lock.
        lock: usize,
    },
    /// A root was torn down while records were still linked into it.
    Teardown {
        /// The label of the root.
        root: &'static str,
        /// The number of records left in the list.
        records: usize,
    },
    /// The last reference of a root sentinel was released.
    ///
    /// Sentinels are never unlinked nor deallocated.
    Sentinel {
        /// The address of the sentinel.
        record: usize,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Violation::Increment { record, count } =>
                write!(f, "failed increment of record 0x{:x}: count was {}", record, count),
            Violation::Decrement { record, count } =>
                write!(f, "failed decrement of record 0x{:x}: count was {}", record, count),
            Violation::Unlock { lock } =>
                write!(f, "failed unlocking of list lock 0x{:x}: the lock was not held", lock),
            Violation::Teardown { root, records } =>
                write!(f, "failed teardown of root `{}`: {} records still tracked", root, records),
            Violation::Sentinel { record } =>
                write!(f, "failed release of record 0x{:x}: it is a root sentinel", record),
        }
    }
}

/// The default violation handler.
///
/// This will log the violation and abort the process.
#[cold]
fn default_violation_handler(violation: Violation) -> ! {
    write::log(level::ERROR, "ERROR", format_args!("\x1b[31;1m{}\x1b[m", violation), file!(),
               line!());

    sys::abort()
}

/// Call the violation handler.
///
/// This is used when a protocol invariant is found broken, and will never return. Usually, it
/// simply consists of aborting the process.
#[cold]
pub fn violation(violation: Violation) -> ! {
    let handler = VIOLATION_HANDLER.load(atomic::Ordering::SeqCst);

    if handler.is_null() {
        default_violation_handler(violation)
    } else {
        unsafe {
            // Only `set_violation_handler` stores here, and it stores a `fn(Violation) -> !`.
            (mem::transmute::<*mut (), fn(Violation) -> !>(handler))(violation)
        }
    }
}

/// Set the violation handler.
///
/// This is called when a protocol violation is detected. A handler may panic instead of aborting
/// (test harnesses do), but the offending record or list is left in whatever state the violation
/// found it in.
#[inline]
pub fn set_violation_handler(handler: fn(Violation) -> !) {
    VIOLATION_HANDLER.store(handler as *mut (), atomic::Ordering::SeqCst);
}
