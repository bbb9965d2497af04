use std::{mem, sync::Arc, sync::Mutex};

use crate::{
    lock,
    registry::{Id, Registry},
    Error,
};

/// A committed outcome, shared by every observer of the cell.
pub(crate) type Outcome<T, E> = Arc<Result<T, E>>;

pub(crate) type Continuation<T, E> = Box<dyn FnOnce(&Outcome<T, E>) + Send>;

/// The settlement state machine behind a promise.
///
/// `outcome` moves from `None` to `Some` exactly once. Whoever makes that move
/// also takes the continuations and the registry entry, so both run once.
pub(crate) struct Cell<T, E> {
    inner: Mutex<Inner<T, E>>,
}

struct Inner<T, E> {
    outcome: Option<Outcome<T, E>>,
    continuations: Vec<Continuation<T, E>>,
    tracker: Option<Registry>,
}

impl<T, E> Cell<T, E> {
    pub fn pending() -> Self {
        Self {
            inner: Mutex::new(Inner {
                outcome: None,
                continuations: vec![],
                tracker: None,
            }),
        }
    }

    pub fn settled(result: Result<T, E>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                outcome: Some(Arc::new(result)),
                continuations: vec![],
                tracker: None,
            }),
        }
    }

    pub fn id(&self) -> Id {
        self as *const Self as *const () as Id
    }

    /// Put the cell in `registry` until it settles. Does nothing if it
    /// already has.
    pub fn track(self: &Arc<Self>, registry: &Registry)
    where
        T: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        let mut inner = lock(&self.inner);
        if inner.outcome.is_some() {
            return;
        }
        debug_assert!(inner.tracker.is_none(), "promise tracked twice");
        // Registered while holding the cell lock so settlement can't slip
        // between the two.
        registry.register(self.id(), self.clone());
        inner.tracker = Some(registry.clone());
    }

    pub fn settle(&self, result: Result<T, E>) -> Result<(), Error> {
        let (outcome, continuations, tracker) = {
            let mut inner = lock(&self.inner);
            if inner.outcome.is_some() {
                return Err(Error::AlreadySettled);
            }
            let outcome = Arc::new(result);
            inner.outcome = Some(outcome.clone());
            (
                outcome,
                mem::take(&mut inner.continuations),
                inner.tracker.take(),
            )
        };

        for continuation in continuations {
            continuation(&outcome);
        }
        // Deregister last: anything the continuations queued is visible to a
        // drain before the registry can look empty.
        if let Some(registry) = tracker {
            registry.deregister(self.id());
        }
        Ok(())
    }

    /// Run `continuation` once the cell settles, or right now if it already
    /// has.
    pub fn subscribe(&self, continuation: Continuation<T, E>) {
        let outcome = {
            let mut inner = lock(&self.inner);
            match inner.outcome.clone() {
                Some(outcome) => outcome,
                None => {
                    inner.continuations.push(continuation);
                    return;
                }
            }
        };
        continuation(&outcome)
    }

    pub fn outcome(&self) -> Option<Outcome<T, E>> {
        lock(&self.inner).outcome.clone()
    }
}
