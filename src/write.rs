//! Direct shim-based write for logging and diagnostics.
//!
//! The writer here never allocates, so it can be used from inside a deallocation callback or a
//! violation handler.

use core::fmt::{self, Write};

use crate::sync::{Mutex, MutexGuard};
use crate::sys::{self, config};

/// Log levels.
pub mod level {
    /// Operation tracing.
    pub const DEBUG: u8 = 1;
    /// Noteworthy, but expected, events.
    pub const NOTE: u8 = 3;
    /// Something is definitely wrong.
    pub const ERROR: u8 = 6;
}

/// The log lock.
///
/// This lock is used to avoid bungling and intertwining the log.
pub static LOG_LOCK: Mutex<()> = Mutex::new(());

/// A log writer.
///
/// This writes to `sys::log`. The log lock is held for as long as the writer lives.
pub struct LogWriter {
    /// The inner lock.
    _lock: MutexGuard<'static, ()>,
}

impl LogWriter {
    /// Standard error output.
    pub fn new() -> LogWriter {
        LogWriter {
            _lock: LOG_LOCK.lock(),
        }
    }
}

impl fmt::Write for LogWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if sys::log(s).is_err() {
            Err(fmt::Error)
        } else { Ok(()) }
    }
}

/// Write a line to the log.
///
/// Lines with a level below `config::MIN_LOG_LEVEL` are dropped.
pub fn log(lv: u8, kind: &str, args: fmt::Arguments, file: &str, line: u32) {
    if lv >= config::MIN_LOG_LEVEL {
        let mut log = LogWriter::new();
        let _ = writeln!(log, "{:10}{} (@ {}:{})", kind, args, file, line);
    }
}

/// Log an operation.
///
/// The first argument is the level (`DEBUG`, `NOTE` or `ERROR`), the rest are normal
/// formatters. This is a no-op unless the `log` feature is enabled.
macro_rules! log {
    ($lv:ident, $( $arg:tt )*) => {{
        if cfg!(feature = "log") {
            $crate::write::log($crate::write::level::$lv, stringify!($lv),
                               format_args!($( $arg )*), file!(), line!());
        }
    }};
}

#[cfg(test)]
mod test {
    use super::*;

    use core::fmt::Write;

    #[test]
    fn test_writer() {
        let mut log = LogWriter::new();
        assert!(write!(log, "").is_ok());
    }

    #[test]
    fn test_lock_released() {
        {
            let _log = LogWriter::new();
        }

        // Would spin forever if the first writer kept the lock.
        let _log = LogWriter::new();
    }
}
