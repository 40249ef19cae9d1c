//! Windows SRW backend.
//!
//! Mirrors the Unix platform layer and exposes identical function names and
//! semantics where possible, built on slim reader/writer locks and Win32
//! condition variables (exclusive acquisition only).
//!
//! Scope narrowing: Windows has no process-shared equivalent of these
//! primitives, so on this platform the handles coordinate threads of one
//! process only. The API and every other contract are unchanged.

use std::cell::UnsafeCell;
use std::io;
use std::time::Duration;

use windows_sys::Win32::Foundation::{ERROR_TIMEOUT, GetLastError};
use windows_sys::Win32::System::Threading::{
    AcquireSRWLockExclusive, CONDITION_VARIABLE, CONDITION_VARIABLE_INIT, INFINITE,
    ReleaseSRWLockExclusive, SRWLOCK, SRWLOCK_INIT, SleepConditionVariableSRW,
    WakeAllConditionVariable,
};

/// Exclusive lock handle (thread-only scope on this platform).
pub(crate) struct RawMutex(UnsafeCell<SRWLOCK>);

/// Condition variable handle (thread-only scope on this platform).
pub(crate) struct RawCondition(UnsafeCell<CONDITION_VARIABLE>);

// Safety: SRW locks and Win32 condition variables are designed for
// concurrent use from any thread of the process; all mutation goes through
// the OS calls below.
unsafe impl Send for RawMutex {}
unsafe impl Sync for RawMutex {}
unsafe impl Send for RawCondition {}
unsafe impl Sync for RawCondition {}

/// Initializes an exclusive lock handle. Cannot fail on this platform.
pub(crate) fn mutex_init() -> io::Result<RawMutex> {
    Ok(RawMutex(UnsafeCell::new(SRWLOCK_INIT)))
}

/// Blocks until the lock is acquired by the calling thread.
pub(crate) fn mutex_lock(mutex: &RawMutex) -> io::Result<()> {
    unsafe { AcquireSRWLockExclusive(mutex.0.get()) };
    Ok(())
}

/// Releases the lock. The caller must hold it.
pub(crate) fn mutex_unlock(mutex: &RawMutex) -> io::Result<()> {
    unsafe { ReleaseSRWLockExclusive(mutex.0.get()) };
    Ok(())
}

/// SRW locks hold no OS resources; teardown is a no-op.
pub(crate) fn mutex_destroy(_mutex: &RawMutex) -> io::Result<()> {
    Ok(())
}

/// Initializes a condition variable handle. Cannot fail on this platform.
pub(crate) fn cond_init() -> io::Result<RawCondition> {
    Ok(RawCondition(UnsafeCell::new(CONDITION_VARIABLE_INIT)))
}

/// Atomically releases `mutex` and suspends until broadcast. The mutex is
/// re-acquired before returning. The caller must hold `mutex`.
pub(crate) fn cond_wait(cond: &RawCondition, mutex: &RawMutex) -> io::Result<()> {
    sleep_on(cond, mutex, INFINITE).map(|_| ())
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
    // INFINITE is the wait-forever sentinel, so a finite timeout must stay
    // below it.
    let ms = timeout.as_millis().min(u128::from(INFINITE - 1)) as u32;
    sleep_on(cond, mutex, ms)
}

fn sleep_on(cond: &RawCondition, mutex: &RawMutex, ms: u32) -> io::Result<bool> {
    let ok = unsafe { SleepConditionVariableSRW(cond.0.get(), mutex.0.get(), ms, 0) };
    if ok != 0 {
        return Ok(true);
    }
    let err = unsafe { GetLastError() };
    if err == ERROR_TIMEOUT {
        Ok(false)
    } else {
        Err(io::Error::from_raw_os_error(err as i32))
    }
}

/// Wakes every thread currently waiting on the condition. A broadcast with
/// no waiters succeeds and has no effect.
pub(crate) fn cond_broadcast(cond: &RawCondition) -> io::Result<()> {
    unsafe { WakeAllConditionVariable(cond.0.get()) };
    Ok(())
}

/// Win32 condition variables hold no OS resources; teardown is a no-op.
pub(crate) fn cond_destroy(_cond: &RawCondition) -> io::Result<()> {
    Ok(())
}
