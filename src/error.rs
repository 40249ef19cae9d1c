//! Error types for the synchronization primitives.
//!
//! The taxonomy distinguishes failures by when they can occur:
//!
//! - [`Error::Initialization`] — OS-level setup failed during construction;
//!   no usable object exists.
//! - [`Error::InvalidState`] — an operation was invoked on an instance whose
//!   ownership was transferred away; a programmer error surfaced immediately.
//! - [`Error::Os`] — an underlying primitive call failed for a reason other
//!   than timeout; propagated to the caller, never retried internally.
//!
//! A timed wait that elapses is **not** an error:
//! [`Condition::wait`](crate::Condition::wait) reports it as `Ok(false)`.

use std::error;
use std::fmt;
use std::io;

/// Error returned by the mutex and condition variable operations.
#[derive(Debug)]
pub enum Error {
    /// An OS-level setup call failed while constructing the primitive.
    ///
    /// Non-recoverable for that instance; nothing was left allocated.
    Initialization(io::Error),

    /// The instance's ownership was transferred away; it is permanently
    /// invalid.
    InvalidState,

    /// The underlying primitive call failed (e.g. resource exhaustion).
    Os(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Initialization(e) => {
                write!(f, "failed to initialize synchronization primitive: {e}")
            }
            Error::InvalidState => {
                write!(f, "synchronization primitive used after ownership transfer")
            }
            Error::Os(e) => write!(f, "synchronization primitive call failed: {e}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Initialization(e) | Error::Os(e) => Some(e),
            Error::InvalidState => None,
        }
    }
}
