//! Where work units and continuations run.
//!
//! The promise core never assumes *when* or *where* a job runs, only that the
//! executor eventually runs it.
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, OnceLock},
    thread,
};

use crate::lock;

/// A unit of work handed to an [`Executor`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait Executor: Send + Sync {
    /// Run `job`, possibly on another thread, possibly later.
    fn execute(&self, job: Job);
}

impl<X: Executor + ?Sized> Executor for &X {
    fn execute(&self, job: Job) {
        (**self).execute(job)
    }
}

impl<X: Executor + ?Sized> Executor for Arc<X> {
    fn execute(&self, job: Job) {
        (**self).execute(job)
    }
}

impl<X: Executor + ?Sized> Executor for Box<X> {
    fn execute(&self, job: Job) {
        (**self).execute(job)
    }
}

/// Runs every job inline on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl Executor for Immediate {
    fn execute(&self, job: Job) {
        job()
    }
}

/// Runs every job on its own freshly spawned thread.
#[derive(Debug, Clone, Default)]
pub struct NewThread {
    name: Option<String>,
}

impl NewThread {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name given to the spawned threads.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

impl Executor for NewThread {
    fn execute(&self, job: Job) {
        let mut builder = thread::Builder::new();
        if let Some(name) = &self.name {
            builder = builder.name(name.clone());
        }
        // If the OS refuses a thread the job runs inline instead.
        let job = Arc::new(Mutex::new(Some(job)));
        let spawned = {
            let job = job.clone();
            builder.spawn(move || {
                if let Some(job) = lock(&job).take() {
                    job()
                }
            })
        };
        if let Err(err) = spawned {
            log::warn!("failed to spawn executor thread, running job inline: {err}");
            if let Some(job) = lock(&job).take() {
                job()
            }
        }
    }
}

/// A cooperative FIFO queue. Jobs only run when someone pumps it with
/// [`Queue::run_pending`].
///
/// # Examples
///
/// ```
/// use promise_drain::{Executor, Queue};
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let queue = Queue::new();
/// let hits = Arc::new(AtomicUsize::new(0));
/// let counter = hits.clone();
/// queue.execute(Box::new(move || { counter.fetch_add(1, Ordering::SeqCst); }));
/// assert_eq!(hits.load(Ordering::SeqCst), 0);
/// assert_eq!(queue.run_pending(), 1);
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone, Default)]
pub struct Queue {
    jobs: Arc<Mutex<VecDeque<Job>>>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide queue used by [`crate::Promise::new`] and pumped by
    /// [`crate::wait_for_promises`].
    pub fn main() -> Queue {
        static MAIN: OnceLock<Queue> = OnceLock::new();
        MAIN.get_or_init(Queue::new).clone()
    }

    /// Run the jobs queued at the time of the call on the calling thread.
    /// Jobs they enqueue wait for the next call. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let budget = self.len();
        let mut ran = 0;
        while ran < budget && self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Run the oldest queued job, if any.
    pub(crate) fn run_next(&self) -> bool {
        // Pop under the lock, run outside of it.
        let next = lock(&self.jobs).pop_front();
        match next {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.jobs).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.jobs).is_empty()
    }

    #[cfg(test)]
    pub(crate) fn same_queue(&self, other: &Queue) -> bool {
        Arc::ptr_eq(&self.jobs, &other.jobs)
    }
}

impl Executor for Queue {
    fn execute(&self, job: Job) {
        lock(&self.jobs).push_back(job);
    }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue").field("len", &self.len()).finish()
    }
}
