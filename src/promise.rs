//! The public promise handle and the capabilities that settle it.
use std::{
    fmt::{self, Debug},
    future::Future,
    mem,
    pin::Pin,
    sync::{Arc, Mutex, Weak},
    task::{Context, Poll, Waker},
};

use crate::{
    cell::{Cell, Outcome},
    executor::{Executor, Queue},
    lock,
    registry::Registry,
    Error,
};

/// A snapshot of where a promise is in its life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State<T, E> {
    Pending,
    Fulfilled(T),
    Rejected(E),
}

/// A single-assignment container for the outcome of some work.
///
/// Cloning a `Promise` gives another handle to the same promise. The outcome
/// is committed once: every later `fulfill` or `reject` is ignored.
///
/// # Examples
///
/// ```
/// use promise_drain::{Immediate, Promise};
///
/// let promise = Promise::<u32, String>::new_on(Immediate, |_, reject| {
///     reject.reject("nope".into());
///     Ok(())
/// });
/// assert_eq!(promise.error().as_deref(), Some("nope"));
/// assert_eq!(promise.value(), None);
///
/// // Settled already, so this is ignored.
/// promise.fulfill(1);
/// assert!(promise.is_rejected());
/// ```
pub struct Promise<T, E> {
    cell: Arc<Cell<T, E>>,
}

impl<T, E> Promise<T, E> {
    /// A promise that is fulfilled from the start.
    pub fn fulfilled(value: T) -> Self {
        Self::settled(Ok(value))
    }

    /// A promise that is rejected from the start.
    pub fn rejected(error: E) -> Self {
        Self::settled(Err(error))
    }

    fn settled(result: Result<T, E>) -> Self {
        Self {
            cell: Arc::new(Cell::settled(result)),
        }
    }

    /// A pending promise settled later through [`Promise::fulfill`] or
    /// [`Promise::reject`]. It is not tracked by any registry.
    pub fn pending() -> Self {
        Self {
            cell: Arc::new(Cell::pending()),
        }
    }

    pub fn fulfill(&self, value: T) {
        settle_or_ignore(&self.cell, Ok(value))
    }

    pub fn reject(&self, error: E) {
        settle_or_ignore(&self.cell, Err(error))
    }

    /// Like [`Promise::fulfill`] but tells the caller when it lost.
    pub fn try_fulfill(&self, value: T) -> Result<(), Error> {
        self.cell.settle(Ok(value))
    }

    /// Like [`Promise::reject`] but tells the caller when it lost.
    pub fn try_reject(&self, error: E) -> Result<(), Error> {
        self.cell.settle(Err(error))
    }

    pub fn is_pending(&self) -> bool {
        self.cell.outcome().is_none()
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self.cell.outcome().as_deref(), Some(Ok(_)))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.cell.outcome().as_deref(), Some(Err(_)))
    }

    /// The value, if the promise was fulfilled.
    pub fn value(&self) -> Option<T>
    where
        T: Clone,
    {
        match self.cell.outcome()?.as_ref() {
            Ok(value) => Some(value.clone()),
            Err(_) => None,
        }
    }

    /// The error, if the promise was rejected.
    pub fn error(&self) -> Option<E>
    where
        E: Clone,
    {
        match self.cell.outcome()?.as_ref() {
            Ok(_) => None,
            Err(error) => Some(error.clone()),
        }
    }

    pub fn state(&self) -> State<T, E>
    where
        T: Clone,
        E: Clone,
    {
        match self.cell.outcome().as_deref() {
            None => State::Pending,
            Some(Ok(value)) => State::Fulfilled(value.clone()),
            Some(Err(error)) => State::Rejected(error.clone()),
        }
    }

    pub fn downgrade(&self) -> WeakPromise<T, E> {
        WeakPromise {
            cell: Arc::downgrade(&self.cell),
        }
    }

    /// A future resolving to the outcome once the promise settles.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_drain::{NewThread, Promise};
    /// use futures::executor::block_on;
    ///
    /// let promise = Promise::<String, ()>::new_on(NewThread::new(), |fulfill, _| {
    ///     fulfill.fulfill("🍓".into());
    ///     Ok(())
    /// });
    /// assert_eq!(block_on(promise.wait()), Ok("🍓".to_string()));
    /// ```
    pub fn wait(&self) -> Waiter<T, E> {
        Waiter {
            cell: self.cell.clone(),
            waker: Arc::new(Mutex::new(Err(WakerState::Fresh))),
        }
    }

    /// Hand the outcome to `callback` on `executor` once the promise settles.
    /// Callbacks are dispatched in the order they were registered.
    pub fn observe<X, F>(&self, executor: X, callback: F)
    where
        X: Executor + 'static,
        F: FnOnce(Result<T, E>) + Send + 'static,
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        self.cell.subscribe(Box::new(move |outcome: &Outcome<T, E>| {
            let outcome = outcome.clone();
            executor.execute(Box::new(move || callback(outcome.as_ref().clone())));
        }));
    }
}

impl<T, E> Promise<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Run `work` on the main [`Queue`] and settle the promise with whatever
    /// it does. See [`Promise::new_in`].
    pub fn new<W>(work: W) -> Self
    where
        W: FnOnce(Fulfill<T, E>, Reject<T, E>) -> Result<(), E> + Send + 'static,
    {
        Self::new_on(Queue::main(), work)
    }

    /// Run `work` on `executor`, tracked by the global [`Registry`].
    pub fn new_on<X, W>(executor: X, work: W) -> Self
    where
        X: Executor,
        W: FnOnce(Fulfill<T, E>, Reject<T, E>) -> Result<(), E> + Send + 'static,
    {
        Self::new_in(&Registry::global(), executor, work)
    }

    /// Run `work` on `executor`, tracked by `registry` until it settles.
    ///
    /// The promise is registered before `work` is handed to the executor, and
    /// the registry keeps it alive even if every handle is dropped. `work`
    /// settles it through its capabilities; returning `Err(e)` rejects it with
    /// `e`. Returning `Ok(())` without settling leaves it pending.
    pub fn new_in<X, W>(registry: &Registry, executor: X, work: W) -> Self
    where
        X: Executor,
        W: FnOnce(Fulfill<T, E>, Reject<T, E>) -> Result<(), E> + Send + 'static,
    {
        let cell = Arc::new(Cell::pending());
        cell.track(registry);

        let fulfill = Fulfill { cell: cell.clone() };
        let reject = Reject { cell: cell.clone() };
        let on_error = Reject { cell: cell.clone() };
        executor.execute(Box::new(move || {
            if let Err(error) = work(fulfill, reject) {
                on_error.reject(error)
            }
        }));
        Self { cell }
    }

    /// Run `work` on the main [`Queue`] and settle the promise with its
    /// result.
    pub fn from_fn<F>(work: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        Self::from_fn_on(Queue::main(), work)
    }

    /// Run `work` on `executor` and settle the promise with its result.
    pub fn from_fn_on<X, F>(executor: X, work: F) -> Self
    where
        X: Executor,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        Self::new_on(executor, move |fulfill, _| {
            fulfill.fulfill(work()?);
            Ok(())
        })
    }
}

fn settle_or_ignore<T, E>(cell: &Cell<T, E>, result: Result<T, E>) {
    if cell.settle(result).is_err() {
        log::debug!("promise {:#x} already settled, ignoring", cell.id());
    }
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T, E> From<Result<T, E>> for Promise<T, E> {
    fn from(result: Result<T, E>) -> Self {
        Self::settled(result)
    }
}

impl<T: Debug, E: Debug> Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("id", &format_args!("{:#x}", self.cell.id()))
            .field("outcome", &self.cell.outcome())
            .finish()
    }
}

/// The capability to fulfill a promise, handed to its work unit.
pub struct Fulfill<T, E> {
    cell: Arc<Cell<T, E>>,
}

impl<T, E> Fulfill<T, E> {
    /// Fulfill with `value`, unless the promise already settled.
    pub fn fulfill(self, value: T) {
        settle_or_ignore(&self.cell, Ok(value))
    }
}

impl<T, E> Clone for Fulfill<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

/// The capability to reject a promise, handed to its work unit.
pub struct Reject<T, E> {
    cell: Arc<Cell<T, E>>,
}

impl<T, E> Reject<T, E> {
    /// Reject with `error`, unless the promise already settled.
    pub fn reject(self, error: E) {
        settle_or_ignore(&self.cell, Err(error))
    }
}

impl<T, E> Clone for Reject<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

/// A handle that does not keep the promise alive.
pub struct WeakPromise<T, E> {
    cell: Weak<Cell<T, E>>,
}

impl<T, E> WeakPromise<T, E> {
    pub fn upgrade(&self) -> Option<Promise<T, E>> {
        self.cell.upgrade().map(|cell| Promise { cell })
    }
}

impl<T, E> Clone for WeakPromise<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

#[derive(Debug)]
enum WakerState {
    Fresh,
    Tainted,
}

/// Future returned by [`Promise::wait`].
pub struct Waiter<T, E> {
    cell: Arc<Cell<T, E>>,
    waker: Arc<Mutex<Result<Waker, WakerState>>>,
}

impl<T, E> Future for Waiter<T, E>
where
    T: Clone,
    E: Clone,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.cell.outcome() {
            return Poll::Ready(outcome.as_ref().clone());
        }

        let previous = mem::replace(&mut *lock(&self.waker), Ok(cx.waker().clone()));
        if let Err(WakerState::Fresh) = previous {
            let slot = self.waker.clone();
            self.cell.subscribe(Box::new(move |_| {
                if let Ok(waker) = mem::replace(&mut *lock(&slot), Err(WakerState::Tainted)) {
                    waker.wake()
                }
            }));
        }

        // Settlement may have raced the waker update.
        match self.cell.outcome() {
            Some(outcome) => Poll::Ready(outcome.as_ref().clone()),
            None => Poll::Pending,
        }
    }
}
