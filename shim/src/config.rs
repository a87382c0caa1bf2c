//! Configuration.
//!
//! This module contains anything which can be tweaked and customized to the users preferences.

/// The file descriptor of the logging target.
///
/// This points to stderr, but could be changed arbitrarily.
pub const LOG_TARGET: i32 = 2;

/// The minimum log level.
///
/// Messages with a level below this are discarded.
pub const MIN_LOG_LEVEL: u8 = 0;

/// The number of busy spins before yielding.
///
/// A contended lock will spin this many times (with a spin loop hint) before giving its timeslice
/// to the scheduler, and repeat. The critical sections guarded by the list locks are a handful of
/// stores, so the holder usually finishes within the spinning phase.
pub const SPINS_BEFORE_YIELD: usize = 64;
