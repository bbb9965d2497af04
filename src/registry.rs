//! The set of promises still waiting on their asynchronous work.
//!
//! An entry owns a strong reference to its promise's cell. That reference is
//! what keeps a promise alive after its creator dropped every handle, and
//! removing it at settlement is what lets the promise be reclaimed.
use std::{
    any::Any,
    collections::HashMap,
    sync::{Arc, Mutex, OnceLock},
};

use crate::lock;

/// Identity of a tracked cell: the address of its shared allocation.
pub(crate) type Id = usize;

type Entry = Arc<dyn Any + Send + Sync>;

/// A set of outstanding promises, see [`Registry::global`].
///
/// Cloning gives another handle to the same set.
#[derive(Clone, Default)]
pub struct Registry {
    outstanding: Arc<Mutex<HashMap<Id, Entry>>>,
}

impl Registry {
    /// A fresh registry, independent of the global one.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry that [`crate::Promise::new`] and
    /// [`crate::wait_for_promises`] use.
    pub fn global() -> Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new).clone()
    }

    pub(crate) fn register(&self, id: Id, entry: Entry) {
        let previous = lock(&self.outstanding).insert(id, entry);
        debug_assert!(previous.is_none(), "promise {id:#x} registered twice");
        log::trace!("registered promise {id:#x}");
    }

    /// Returns whether `id` was still registered. Removing an absent id is a
    /// no-op.
    pub(crate) fn deregister(&self, id: Id) -> bool {
        let removed = lock(&self.outstanding).remove(&id);
        // The entry may be the last reference to the cell; drop it outside
        // the lock.
        match removed {
            Some(entry) => {
                drop(entry);
                log::trace!("deregistered promise {id:#x}");
                true
            }
            None => false,
        }
    }

    /// Number of promises still pending. A snapshot: other threads may
    /// register or settle promises right after it is taken.
    pub fn len(&self) -> usize {
        lock(&self.outstanding).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.outstanding).is_empty()
    }

    #[cfg(test)]
    pub(crate) fn same_registry(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.outstanding, &other.outstanding)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("outstanding", &self.len())
            .finish()
    }
}
