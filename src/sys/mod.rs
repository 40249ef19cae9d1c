//! Platform-specific synchronization backend.
//!
//! This module provides a unified interface over the OS primitives backing
//! [`Mutex`](crate::Mutex) and [`Condition`](crate::Condition):
//!
//! - handle initialization and teardown,
//! - blocking lock/unlock,
//! - condition wait (plain and timed) and broadcast.
//!
//! The concrete implementation is selected at compile time depending on the
//! target operating system. Both backends expose identical function names
//! and semantics; scope differences (process-shared vs. thread-only) are
//! documented on the backend modules themselves.

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub(crate) use unix::*;

#[cfg(windows)]
mod windows;

#[cfg(windows)]
pub(crate) use windows::*;
