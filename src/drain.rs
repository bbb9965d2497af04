//! Blocking until every tracked promise has settled.
//!
//! The executors behind a registry are opaque to the drain, so it polls: pump
//! the cooperative queue, look at the registry, sleep, repeat. The poll
//! interval is the granularity of the wait, not a wake-up guarantee.
use std::{
    thread,
    time::{Duration, Instant},
};

use crate::{executor::Queue, registry::Registry, Error};

/// How long the drain sleeps between two looks at the registry by default.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Block until every promise tracked by the global [`Registry`] has settled,
/// or `timeout` elapses. Returns `false` on timeout; the promises still
/// pending are left alone and may settle later.
///
/// Jobs on the main [`Queue`] run on the calling thread while waiting. Jobs
/// a job enqueues run on a later round, so a job that keeps rescheduling
/// itself can't hold the drain past `timeout`.
///
/// A panic in a work unit is not a rejection. If that work unit runs on the
/// main queue, the panic unwinds out of this call on the draining thread and
/// its promise stays registered, so every later drain in the process returns
/// `false`.
///
/// # Examples
///
/// ```
/// use promise_drain::{wait_for_promises, Promise};
/// use std::time::Duration;
///
/// let promise = Promise::<i32, String>::new(|_, _| Err("code42".to_string()));
///
/// assert!(wait_for_promises(Duration::from_secs(10)));
/// assert_eq!(promise.error().as_deref(), Some("code42"));
/// assert_eq!(promise.value(), None);
/// ```
pub fn wait_for_promises(timeout: Duration) -> bool {
    Drain::new().wait(timeout).is_ok()
}

/// A configurable drain over a registry.
///
/// # Examples
///
/// ```
/// use promise_drain::{Drain, Promise, Queue, Registry};
/// use std::time::Duration;
///
/// let registry = Registry::new();
/// let queue = Queue::new();
/// let promise = Promise::<u32, ()>::new_in(&registry, &queue, |fulfill, _| {
///     fulfill.fulfill(7);
///     Ok(())
/// });
///
/// Drain::new()
///     .registry(registry)
///     .queue(queue)
///     .poll_interval(Duration::from_millis(1))
///     .wait(Duration::from_secs(1))
///     .unwrap();
/// assert_eq!(promise.value(), Some(7));
/// ```
#[derive(Debug, Clone)]
pub struct Drain {
    registry: Registry,
    queue: Queue,
    poll_interval: Duration,
}

impl Default for Drain {
    fn default() -> Self {
        Self {
            registry: Registry::global(),
            queue: Queue::main(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl Drain {
    /// A drain over the global registry that pumps the main queue.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// The cooperative queue to run while waiting.
    pub fn queue(mut self, queue: Queue) -> Self {
        self.queue = queue;
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Block until the registry and the queue are both empty, or `timeout`
    /// elapses.
    pub fn wait(&self, timeout: Duration) -> Result<(), Error> {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            // Two looks in a row, so a registration racing the first one
            // can't end the wait early.
            if self.settled(deadline) && self.settled(deadline) {
                return Ok(());
            }

            let now = Instant::now();
            let remaining = match deadline {
                Some(deadline) if now >= deadline => {
                    let outstanding = self.registry.len();
                    log::debug!("drain timed out with {outstanding} promise(s) outstanding");
                    return Err(Error::TimedOut { outstanding });
                }
                Some(deadline) => deadline - now,
                None => self.poll_interval,
            };
            thread::sleep(self.poll_interval.min(remaining));
        }
    }

    /// Run the jobs queued so far, stopping early at `deadline`, then report
    /// whether nothing is left to wait for.
    fn settled(&self, deadline: Option<Instant>) -> bool {
        let budget = self.queue.len();
        let mut ran = 0;
        while ran < budget && !expired(deadline) && self.queue.run_next() {
            ran += 1;
        }
        if ran > 0 {
            log::trace!("drain ran {ran} queued job(s)");
        }
        self.registry.is_empty() && self.queue.is_empty()
    }
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}
