//! Single-assignment promises whose asynchronous work can be drained.
//!
//! A [`Promise`] settles exactly once, either fulfilled with a value or
//! rejected with an error, no matter which thread gets there first. Promises
//! built from a work unit register themselves in an outstanding [`Registry`]
//! until they settle, which keeps fire-and-forget promises alive and lets
//! [`wait_for_promises`] block until all of them are done.
//!
//! # Examples
//!
//! ```
//! use promise_drain::{wait_for_promises, Promise};
//! use std::time::Duration;
//!
//! let promise = Promise::<i32, String>::new(|fulfill, _| {
//!     fulfill.fulfill(42);
//!     Ok(())
//! });
//!
//! assert!(wait_for_promises(Duration::from_secs(10)));
//! assert_eq!(promise.value(), Some(42));
//! assert_eq!(promise.error(), None);
//! ```
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

mod cell;
pub mod drain;
pub mod executor;
pub mod promise;
pub mod registry;

pub use drain::{wait_for_promises, Drain};
pub use executor::{Executor, Immediate, Job, NewThread, Queue};
pub use promise::{Fulfill, Promise, Reject, State, Waiter, WeakPromise};
pub use registry::Registry;

/// Errors reported by this crate. A rejected promise carries its own error
/// type instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `try_fulfill` or `try_reject` lost to an earlier settlement.
    #[error("promise has already settled")]
    AlreadySettled,
    /// A drain gave up with `outstanding` promises still pending.
    #[error("timed out with {outstanding} promise(s) still pending")]
    TimedOut { outstanding: usize },
}

// Every critical section in this crate leaves its data consistent, so a
// poisoned lock is still safe to use.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
