//! System calls.

/// Voluntarily give a time slice to the scheduler.
pub fn sched_yield() -> i32 {
    unsafe { libc::sched_yield() }
}

/// Abort the process.
///
/// This never unwinds and never allocates.
pub fn abort() -> ! {
    unsafe { libc::abort() }
}
