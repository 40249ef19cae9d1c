//! # Interlock
//!
//! **Interlock** provides process-shareable mutual-exclusion and
//! condition-variable primitives with explicit ownership transfer, for
//! multi-threaded and multi-process coordination.
//!
//! Unlike `std::sync`, these primitives wrap the OS handles directly and
//! initialize them process-shared (on Unix): an instance placed in memory
//! mapped by several processes serializes all of them. They are bare
//! gates — no protected payload — designed to be paired at call sites:
//! one [`Mutex`] with any number of [`Condition`]s guarding a jointly-owned
//! predicate.
//!
//! - **[`Mutex`]** — exclusive lock with `lock`/`unlock`, plus scoped
//!   acquisition via [`Mutex::guard`] that releases on every exit path
//! - **[`Condition`]** — wait/broadcast with optional timeout; `wait`
//!   atomically releases the caller's mutex and re-locks it before
//!   returning
//! - **Ownership transfer** — handles are exclusively owned and
//!   non-cloneable; [`Mutex::transfer`]/[`Condition::transfer`] relocate
//!   ownership once per hop, leaving the source permanently invalid
//!
//! ## Usage discipline
//!
//! A broadcast with no waiters is lost (nothing is latched), and wakeups
//! may be spurious: always keep an explicit predicate guarded by the
//! mutex, and wait in a loop re-checking it.
//!
//! ## Quick Start
//!
//! ```
//! use interlock::{Condition, Mutex};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::thread;
//!
//! struct Gate {
//!     m: Mutex,
//!     cond: Condition,
//!     // Read and written only while holding `m`; the mutex provides the
//!     // ordering.
//!     ready: AtomicBool,
//! }
//!
//! let gate = Arc::new(Gate {
//!     m: Mutex::new().unwrap(),
//!     cond: Condition::new().unwrap(),
//!     ready: AtomicBool::new(false),
//! });
//!
//! let signaller = {
//!     let gate = gate.clone();
//!     thread::spawn(move || {
//!         gate.m.lock().unwrap();
//!         gate.ready.store(true, Ordering::Relaxed);
//!         gate.m.unlock().unwrap();
//!         gate.cond.broadcast().unwrap();
//!     })
//! };
//!
//! let guard = gate.m.guard().unwrap();
//! while !gate.ready.load(Ordering::Relaxed) {
//!     gate.cond.wait(&gate.m, None).unwrap();
//! }
//! drop(guard);
//! signaller.join().unwrap();
//! ```
//!
//! ## Platform scope
//!
//! The Unix backend uses pthread primitives initialized
//! `PTHREAD_PROCESS_SHARED`. The Windows backend (SRW locks and Win32
//! condition variables) offers the same API with **thread-only** scope —
//! Windows has no process-shared equivalent of these primitives.

mod condition;
mod error;
mod mutex;
mod sys;

pub use condition::Condition;
pub use error::Error;
pub use mutex::{Mutex, MutexGuard};
