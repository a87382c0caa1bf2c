//! System primitives.

extern crate shalloc_shim as shim;

use core::hint;

pub use self::shim::config;

/// Cooperatively gives up a timeslice to the OS scheduler.
pub fn yield_now() {
    assert_eq!(shim::syscalls::sched_yield(), 0);
}

/// Back off from a contended lock.
///
/// The first `config::SPINS_BEFORE_YIELD` calls (counted in `spins`) only spin, after which every
/// call yields to the scheduler. There is no upper bound on the number of retries.
#[inline]
pub fn backoff(spins: &mut usize) {
    if *spins < config::SPINS_BEFORE_YIELD {
        *spins += 1;
        hint::spin_loop();
    } else {
        yield_now();
    }
}

/// Write text to the log.
///
/// The log target is defined by the `shim` crate.
pub fn log(s: &str) -> Result<(), ()> {
    if shim::log::write(s) == -1 { Err(()) } else { Ok(()) }
}

/// Abort the process.
pub fn abort() -> ! {
    shim::syscalls::abort()
}
