use crate::error::Error;
use crate::mutex::Mutex;
use crate::sys;
use std::fmt;
use std::ptr;
use std::time::Duration;

/// A process-shareable condition variable.
///
/// A `Condition` lets threads block until notified, in conjunction with an
/// externally held [`Mutex`]. It does not own the mutex: callers pair them
/// at call sites, and several `Condition`s may share one `Mutex` (e.g. a
/// reader/writer handshake).
///
/// A broadcast is **not** latched: with no thread waiting it is lost, so
/// callers must keep their own "has this happened" predicate, guarded by
/// the associated mutex, and re-check it in a loop around every wait
/// (wakeups may also be spurious).
///
/// Ownership semantics match [`Mutex`]: not cloneable, transferable once
/// per hop via [`transfer`](Condition::transfer).
///
/// # Example
/// ```
/// use interlock::{Condition, Mutex};
/// use std::time::Duration;
///
/// let m = Mutex::new().unwrap();
/// let cond = Condition::new().unwrap();
///
/// m.lock().unwrap();
/// // Nothing will signal: the wait times out and re-locks the mutex.
/// let signalled = cond.wait(&m, Some(Duration::from_millis(10))).unwrap();
/// assert!(!signalled);
/// m.unlock().unwrap();
/// ```
pub struct Condition {
    /// OS-level condition handle, inline for the same shared-memory reason
    /// as the mutex handle.
    raw: sys::RawCondition,

    /// Cleared when ownership is transferred away.
    valid: bool,
}

impl Condition {
    /// Allocates and initializes a process-shareable condition handle.
    ///
    /// Same failure and cleanup contract as [`Mutex::new`].
    pub fn new() -> Result<Condition, Error> {
        let raw = sys::cond_init().map_err(Error::Initialization)?;
        Ok(Condition { raw, valid: true })
    }

    /// Waits for the condition to be signalled by a call to
    /// [`broadcast`](Condition::broadcast).
    ///
    /// Call with `mutex` locked. The mutex is atomically released while
    /// the thread is suspended and re-acquired before this returns,
    /// whether the return is due to a signal or to the timeout.
    ///
    /// With `timeout` of `None` the wait is unbounded. Otherwise the
    /// deadline is absolute: the duration is added to the clock reading at
    /// call time, so a delayed wakeup does not extend the wait.
    ///
    /// Returns `Ok(true)` when woken by a broadcast — or spuriously, per
    /// OS semantics; callers must re-check their predicate in a loop —
    /// and `Ok(false)` only when the timeout elapsed with no signal
    /// observed.
    pub fn wait(&self, mutex: &Mutex, timeout: Option<Duration>) -> Result<bool, Error> {
        let cond = self.raw()?;
        let raw_mutex = mutex.raw()?;
        match timeout {
            None => sys::cond_wait(cond, raw_mutex)
                .map(|()| true)
                .map_err(Error::Os),
            Some(timeout) => sys::cond_timedwait(cond, raw_mutex, timeout).map_err(Error::Os),
        }
    }

    /// Wakes *all* threads currently waiting on this condition.
    ///
    /// Succeeds with no effect when nothing is waiting; the signal is not
    /// remembered.
    pub fn broadcast(&self) -> Result<(), Error> {
        sys::cond_broadcast(self.raw()?).map_err(Error::Os)
    }

    /// Transfers ownership of the underlying handle to a new `Condition`.
    ///
    /// Same contract as [`Mutex::transfer`]: the source becomes
    /// permanently invalid, and the transfer is only permitted while no
    /// thread is waiting on the primitive.
    pub fn transfer(&mut self) -> Result<Condition, Error> {
        if !self.valid {
            return Err(Error::InvalidState);
        }
        self.valid = false;
        // Relocates the handle bytes; the source never touches them again.
        let raw = unsafe { ptr::read(&self.raw) };
        Ok(Condition { raw, valid: true })
    }

    fn raw(&self) -> Result<&sys::RawCondition, Error> {
        if self.valid {
            Ok(&self.raw)
        } else {
            Err(Error::InvalidState)
        }
    }
}

impl Drop for Condition {
    /// Releases the handle if this instance still owns it; failures are
    /// reported on stderr and swallowed.
    fn drop(&mut self) {
        if !self.valid {
            return;
        }
        if let Err(e) = sys::cond_destroy(&self.raw) {
            eprintln!("WARNING: failed to destroy condition handle: {e}");
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("valid", &self.valid)
            .finish()
    }
}
