//! Unix pthread backend.
//!
//! Mutex and condition handles are initialized with the
//! `PTHREAD_PROCESS_SHARED` attribute, so a handle placed in memory mapped
//! by several processes serializes all of them, not just the threads of one
//! process.
//!
//! pthread calls report failure through their return code rather than
//! `errno`; errors are surfaced as [`io::Error::from_raw_os_error`].

use libc::{
    CLOCK_REALTIME, ETIMEDOUT, PTHREAD_PROCESS_SHARED, c_int, c_long, clock_gettime,
    pthread_cond_broadcast, pthread_cond_destroy, pthread_cond_init, pthread_cond_t,
    pthread_cond_timedwait, pthread_cond_wait, pthread_condattr_destroy, pthread_condattr_init,
    pthread_condattr_setpshared, pthread_condattr_t, pthread_mutex_destroy, pthread_mutex_init,
    pthread_mutex_lock, pthread_mutex_t, pthread_mutex_unlock, pthread_mutexattr_destroy,
    pthread_mutexattr_init, pthread_mutexattr_setpshared, pthread_mutexattr_t, timespec,
};
use std::cell::UnsafeCell;
use std::io;
use std::mem::MaybeUninit;
use std::time::Duration;

const NANOS_PER_SEC: c_long = 1_000_000_000;

/// Process-shared mutex handle.
///
/// The handle must stay at a stable address while locked or waited on;
/// relocating it is only permitted before first use (see
/// [`Mutex::transfer`](crate::Mutex::transfer)).
pub(crate) struct RawMutex(UnsafeCell<pthread_mutex_t>);

/// Process-shared condition variable handle. Same address constraints as
/// [`RawMutex`].
pub(crate) struct RawCondition(UnsafeCell<pthread_cond_t>);

// Safety: the pthread primitives are designed for concurrent use from any
// thread (and, with PTHREAD_PROCESS_SHARED, any process); all mutation goes
// through the OS calls below.
unsafe impl Send for RawMutex {}
unsafe impl Sync for RawMutex {}
unsafe impl Send for RawCondition {}
unsafe impl Sync for RawCondition {}

/// Maps a pthread return code to an `io::Result`.
fn check(rc: c_int) -> io::Result<()> {
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(rc))
    }
}

/// Allocates and initializes a process-shared mutex handle.
///
/// A failure at any step unwinds the attribute (and, on attribute teardown
/// failure, the handle itself) before returning, so no partially
/// initialized handle escapes.
pub(crate) fn mutex_init() -> io::Result<RawMutex> {
    unsafe {
        let mut attr = MaybeUninit::<pthread_mutexattr_t>::uninit();
        check(pthread_mutexattr_init(attr.as_mut_ptr()))?;

        if let Err(e) = check(pthread_mutexattr_setpshared(
            attr.as_mut_ptr(),
            PTHREAD_PROCESS_SHARED,
        )) {
            pthread_mutexattr_destroy(attr.as_mut_ptr());
            return Err(e);
        }

        let mutex = UnsafeCell::new(MaybeUninit::<pthread_mutex_t>::zeroed().assume_init());
        if let Err(e) = check(pthread_mutex_init(mutex.get(), attr.as_ptr())) {
            pthread_mutexattr_destroy(attr.as_mut_ptr());
            return Err(e);
        }

        if let Err(e) = check(pthread_mutexattr_destroy(attr.as_mut_ptr())) {
            pthread_mutex_destroy(mutex.get());
            return Err(e);
        }

        Ok(RawMutex(mutex))
    }
}

/// Blocks until the mutex is acquired by the calling thread.
pub(crate) fn mutex_lock(mutex: &RawMutex) -> io::Result<()> {
    check(unsafe { pthread_mutex_lock(mutex.0.get()) })
}

/// Releases the mutex. The caller must hold it.
pub(crate) fn mutex_unlock(mutex: &RawMutex) -> io::Result<()> {
    check(unsafe { pthread_mutex_unlock(mutex.0.get()) })
}

/// Releases the OS resources behind the handle. The mutex must be unlocked.
pub(crate) fn mutex_destroy(mutex: &RawMutex) -> io::Result<()> {
    check(unsafe { pthread_mutex_destroy(mutex.0.get()) })
}

/// Allocates and initializes a process-shared condition variable handle.
///
/// Same unwinding contract as [`mutex_init`].
pub(crate) fn cond_init() -> io::Result<RawCondition> {
    unsafe {
        let mut attr = MaybeUninit::<pthread_condattr_t>::uninit();
        check(pthread_condattr_init(attr.as_mut_ptr()))?;

        if let Err(e) = check(pthread_condattr_setpshared(
            attr.as_mut_ptr(),
            PTHREAD_PROCESS_SHARED,
        )) {
            pthread_condattr_destroy(attr.as_mut_ptr());
            return Err(e);
        }

        let cond = UnsafeCell::new(MaybeUninit::<pthread_cond_t>::zeroed().assume_init());
        if let Err(e) = check(pthread_cond_init(cond.get(), attr.as_ptr())) {
            pthread_condattr_destroy(attr.as_mut_ptr());
            return Err(e);
        }

        if let Err(e) = check(pthread_condattr_destroy(attr.as_mut_ptr())) {
            pthread_cond_destroy(cond.get());
            return Err(e);
        }

        Ok(RawCondition(cond))
    }
}

/// Atomically releases `mutex` and suspends until broadcast. The mutex is
/// re-acquired before returning. The caller must hold `mutex`.
pub(crate) fn cond_wait(cond: &RawCondition, mutex: &RawMutex) -> io::Result<()> {
    check(unsafe { pthread_cond_wait(cond.0.get(), mutex.0.get()) })
}

/// Like [`cond_wait`], but gives up after `timeout`.
///
/// Returns `Ok(true)` when woken by a broadcast (or spuriously) and
/// `Ok(false)` when the timeout elapsed; the mutex is re-acquired before
/// returning in both cases.
pub(crate) fn cond_timedwait(
    cond: &RawCondition,
    mutex: &RawMutex,
    timeout: Duration,
) -> io::Result<bool> {
    let deadline = deadline_after(timeout)?;
    let rc = unsafe { pthread_cond_timedwait(cond.0.get(), mutex.0.get(), &deadline) };
    match rc {
        0 => Ok(true),
        ETIMEDOUT => Ok(false),
        err => Err(io::Error::from_raw_os_error(err)),
    }
}

/// Wakes every thread currently waiting on the condition. A broadcast with
/// no waiters succeeds and has no effect.
pub(crate) fn cond_broadcast(cond: &RawCondition) -> io::Result<()> {
    check(unsafe { pthread_cond_broadcast(cond.0.get()) })
}

/// Releases the OS resources behind the handle. No thread may be waiting.
pub(crate) fn cond_destroy(cond: &RawCondition) -> io::Result<()> {
    check(unsafe { pthread_cond_destroy(cond.0.get()) })
}

/// Absolute `CLOCK_REALTIME` deadline `timeout` from now, for
/// `pthread_cond_timedwait`.
fn deadline_after(timeout: Duration) -> io::Result<timespec> {
    let mut now = timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    if unsafe { clock_gettime(CLOCK_REALTIME, &mut now) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(add_timeout(now, timeout))
}

/// Adds a relative timeout to a timespec, carrying nanosecond overflow into
/// the seconds field so `tv_nsec` stays within `[0, 1e9)`.
fn add_timeout(mut ts: timespec, timeout: Duration) -> timespec {
    ts.tv_sec = ts.tv_sec.saturating_add(timeout.as_secs() as libc::time_t);
    ts.tv_nsec += timeout.subsec_nanos() as c_long;
    if ts.tv_nsec >= NANOS_PER_SEC {
        ts.tv_sec = ts.tv_sec.saturating_add(1);
        ts.tv_nsec -= NANOS_PER_SEC;
    }
    ts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(sec: libc::time_t, nsec: c_long) -> timespec {
        timespec {
            tv_sec: sec,
            tv_nsec: nsec,
        }
    }

    #[test]
    fn add_timeout_splits_milliseconds() {
        let out = add_timeout(ts(100, 0), Duration::from_millis(1500));
        assert_eq!(out.tv_sec, 101);
        assert_eq!(out.tv_nsec, 500_000_000);
    }

    #[test]
    fn add_timeout_carries_nanosecond_overflow() {
        let out = add_timeout(ts(100, 900_000_000), Duration::from_millis(200));
        assert_eq!(out.tv_sec, 101);
        assert_eq!(out.tv_nsec, 100_000_000);
    }

    #[test]
    fn add_timeout_keeps_nanoseconds_in_range() {
        for ms in [0u64, 1, 99, 999, 1000, 1001, 86_400_000] {
            let out = add_timeout(ts(7, 999_999_999), Duration::from_millis(ms));
            assert!(
                out.tv_nsec >= 0 && out.tv_nsec < NANOS_PER_SEC,
                "tv_nsec {} out of range for timeout {}ms",
                out.tv_nsec,
                ms
            );
        }
    }
}
