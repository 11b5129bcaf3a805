// SPDX-License-Identifier: MIT OR Apache-2.0
//! Subscriber lists with handle-based removal.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct ObserverList<T> {
    next_id: u64,
    entries: Vec<(u64, Callback<T>)>,
}

/// A list of callbacks notified with a shared value
pub(crate) struct Observers<T> {
    inner: Arc<Mutex<ObserverList<T>>>,
}

impl<T> Clone for Observers<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Observers<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ObserverList {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a callback; it stays registered while the returned handle lives
    pub(crate) fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut list = self.inner.lock();
            let id = list.next_id;
            list.next_id += 1;
            list.entries.push((id, Arc::new(callback)));
            id
        };

        let weak: Weak<Mutex<ObserverList<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(list) = weak.upgrade() {
                    list.lock().entries.retain(|(entry_id, _)| *entry_id != id);
                }
            })),
        }
    }

    /// Call every subscriber. The list lock is released before the callbacks
    /// run, so subscribers may subscribe or unsubscribe re-entrantly.
    pub(crate) fn notify(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .inner
            .lock()
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in snapshot {
            callback(value);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

/// Handle keeping a subscriber registered.
///
/// Dropping the handle or calling [`Subscription::unsubscribe`] removes the
/// callback.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove the callback. Calling this more than once is harmless.
    pub fn unsubscribe(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }

    /// Whether the callback is still registered through this handle
    pub fn is_active(&self) -> bool {
        self.remove.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
