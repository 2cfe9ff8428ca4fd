//! File descriptor limit detection for capping the reader pool (Unix).

/// File descriptors a reader may hold at once (the file being read, plus slack for processors
/// that open the same path again, e.g. checksumming in skip-read mode).
pub const FDS_PER_READER: usize = 4;

/// Fraction of the process FD limit to use (leave headroom for sockets and other code).
const FD_LIMIT_FRACTION: f64 = 0.8;

/// Returns the soft limit for max open file descriptors, or `None` if unavailable (e.g. Windows).
#[cfg(unix)]
pub fn max_open_fds() -> Option<u64> {
    use std::mem::MaybeUninit;
    let mut rlim = MaybeUninit::<libc::rlimit>::uninit();
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, rlim.as_mut_ptr()) } != 0 {
        return None;
    }
    let rlim = unsafe { rlim.assume_init() };
    let cur = rlim.rlim_cur;
    // RLIM_INFINITY is typically !0 or u64::MAX; treat as "no practical limit"
    if cur == libc::RLIM_INFINITY || cur > i64::MAX as u64 {
        return None;
    }
    Some(cur)
}

#[cfg(not(unix))]
pub fn max_open_fds() -> Option<u64> {
    None
}

/// Largest reader pool that stays under ~80% of the FD limit.
/// Returns `None` if no limit is available (use caller's value).
pub fn max_readers_by_fd_limit() -> Option<usize> {
    let limit = max_open_fds()?;
    let usable = (limit as f64 * FD_LIMIT_FRACTION) as usize;
    if usable < FDS_PER_READER {
        return Some(1);
    }
    Some(usable / FDS_PER_READER)
}

/// Cap `requested` readers by the FD limit, never below 1.
pub fn cap_readers(requested: usize) -> usize {
    match max_readers_by_fd_limit() {
        Some(max) if requested > max => {
            log::warn!(
                "Reducing readers from {} to {} to stay under the open file limit",
                requested,
                max
            );
            max.max(1)
        }
        _ => requested.max(1),
    }
}
