use crate::error::Error;
use crate::sys;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;

/// A process-shareable mutual-exclusion lock.
///
/// `Mutex` owns one OS-level exclusive-lock handle, initialized so that it
/// can coordinate threads of one process or, when the instance is placed in
/// shared memory, several processes (Unix; on Windows the scope is
/// thread-only, see the crate docs).
///
/// Unlike `std::sync::Mutex`, this mutex does not wrap protected data: it
/// is a bare gate, paired at call sites with any number of
/// [`Condition`](crate::Condition)s guarding a jointly-owned predicate.
///
/// The handle is exclusively owned. A `Mutex` cannot be cloned (duplicate
/// handles would not serialize against each other), but ownership can be
/// relocated exactly once per hop with [`transfer`](Mutex::transfer),
/// leaving the source permanently invalid.
///
/// # Example
/// ```
/// use interlock::Mutex;
///
/// let m = Mutex::new().unwrap();
/// {
///     let _guard = m.guard().unwrap();
///     // exclusive section; released on scope exit
/// }
/// m.lock().unwrap();
/// m.unlock().unwrap();
/// ```
pub struct Mutex {
    /// OS-level lock handle. Lives inline so that placing the `Mutex` in
    /// shared memory shares the handle itself.
    raw: sys::RawMutex,

    /// Cleared when ownership is transferred away; every operation on an
    /// invalid instance fails with [`Error::InvalidState`].
    valid: bool,
}

impl Mutex {
    /// Allocates and initializes a process-shareable lock handle.
    ///
    /// Fails with [`Error::Initialization`] if any OS setup call fails; on
    /// failure nothing is left allocated, so dropping the error is safe.
    pub fn new() -> Result<Mutex, Error> {
        let raw = sys::mutex_init().map_err(Error::Initialization)?;
        Ok(Mutex { raw, valid: true })
    }

    /// Blocks the calling thread until the lock is acquired.
    ///
    /// No recursion support: locking again from the holding thread blocks
    /// per OS semantics.
    ///
    /// Fails with [`Error::InvalidState`] after a transfer-out and
    /// [`Error::Os`] if the underlying primitive call fails.
    pub fn lock(&self) -> Result<(), Error> {
        sys::mutex_lock(self.raw()?).map_err(Error::Os)
    }

    /// Releases the lock. The calling thread must hold it; unlocking a
    /// mutex it does not hold is undefined for the underlying primitive
    /// and surfaces as [`Error::Os`] where the OS reports it.
    pub fn unlock(&self) -> Result<(), Error> {
        sys::mutex_unlock(self.raw()?).map_err(Error::Os)
    }

    /// Scoped acquisition: locks and returns a guard that releases the
    /// lock when dropped, on every exit path.
    pub fn guard(&self) -> Result<MutexGuard<'_>, Error> {
        self.lock()?;
        Ok(MutexGuard {
            mutex: self,
            _not_send: PhantomData,
        })
    }

    /// Transfers ownership of the underlying handle to a new `Mutex`.
    ///
    /// The returned instance becomes the sole owner; `self` becomes
    /// permanently invalid and every subsequent operation on it (including
    /// another transfer) fails with [`Error::InvalidState`]. Dropping the
    /// source releases nothing.
    ///
    /// Only permitted before any thread locks or waits on the primitive;
    /// transferring a handle that is locked, or that a `Condition` waiter
    /// is suspended on, is out of contract.
    pub fn transfer(&mut self) -> Result<Mutex, Error> {
        if !self.valid {
            return Err(Error::InvalidState);
        }
        self.valid = false;
        // Relocates the handle bytes; the source never touches them again.
        let raw = unsafe { ptr::read(&self.raw) };
        Ok(Mutex { raw, valid: true })
    }

    /// Handle access for `Condition::wait`, gated on validity.
    pub(crate) fn raw(&self) -> Result<&sys::RawMutex, Error> {
        if self.valid {
            Ok(&self.raw)
        } else {
            Err(Error::InvalidState)
        }
    }
}

impl Drop for Mutex {
    /// Releases the handle if this instance still owns it.
    ///
    /// A release failure is reported on stderr and swallowed: teardown
    /// must not abort unrelated control flow.
    fn drop(&mut self) {
        if !self.valid {
            return;
        }
        if let Err(e) = sys::mutex_destroy(&self.raw) {
            eprintln!("WARNING: failed to destroy mutex handle: {e}");
        }
    }
}

impl fmt::Debug for Mutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex").field("valid", &self.valid).finish()
    }
}

/// Guard returned by [`Mutex::guard`].
///
/// Releases the mutex when dropped.
pub struct MutexGuard<'a> {
    mutex: &'a Mutex,

    /// The underlying primitive must be released by the thread that
    /// acquired it, so the guard must not cross threads.
    _not_send: PhantomData<*const ()>,
}

impl Drop for MutexGuard<'_> {
    /// Unlocks the mutex. A failure here is reported on stderr and
    /// swallowed, like destructor-time failures elsewhere.
    fn drop(&mut self) {
        if let Err(e) = self.mutex.unlock() {
            eprintln!("WARNING: failed to unlock mutex from guard: {e}");
        }
    }
}
