//! Raw logging output.

use crate::config;

/// Write to the log.
///
/// This writes the whole string to `config::LOG_TARGET`, retrying on partial writes. The return
/// value is the number of bytes written, or `-1` if the target failed.
pub fn write(s: &str) -> isize {
    let mut buf = s.as_bytes();

    while !buf.is_empty() {
        let res = unsafe {
            libc::write(config::LOG_TARGET, buf.as_ptr() as *const libc::c_void, buf.len())
        };

        if res < 0 {
            return -1;
        }

        buf = &buf[res as usize..];
    }

    s.len() as isize
}
