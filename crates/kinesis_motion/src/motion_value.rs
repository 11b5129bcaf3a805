// SPDX-License-Identifier: MIT OR Apache-2.0
//! Observable values driving visual properties.

use crate::observer::{Observers, Subscription};
use parking_lot::Mutex;
use std::sync::Arc;

struct ValueState<T> {
    current: T,
    previous: Option<T>,
}

struct MotionValueInner<T> {
    state: Mutex<ValueState<T>>,
    observers: Observers<T>,
}

/// Shared observable cell.
///
/// Every progress source publishes its output through a `MotionValue`.
/// Clones share the same value; setting an equal value does not notify.
pub struct MotionValue<T> {
    inner: Arc<MotionValueInner<T>>,
}

impl<T> Clone for MotionValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + Send + 'static> MotionValue<T> {
    /// Create a value
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(MotionValueInner {
                state: Mutex::new(ValueState {
                    current: initial,
                    previous: None,
                }),
                observers: Observers::new(),
            }),
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.inner.state.lock().current.clone()
    }

    /// Value before the most recent change
    pub fn previous(&self) -> Option<T> {
        self.inner.state.lock().previous.clone()
    }

    /// Replace the value and notify subscribers if it changed
    pub fn set(&self, value: T) {
        {
            let mut state = self.inner.state.lock();
            if state.current == value {
                return;
            }
            let old = std::mem::replace(&mut state.current, value.clone());
            state.previous = Some(old);
        }
        self.inner.observers.notify(&value);
    }

    /// Subscribe to changes
    pub fn on_change(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.inner.observers.subscribe(callback)
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.observers.len()
    }

    /// Derive a value that follows this one through `transform`
    pub fn derive<U>(&self, transform: impl Fn(&T) -> U + Send + Sync + 'static) -> DerivedValue<U>
    where
        U: Clone + PartialEq + Send + 'static,
    {
        let output = MotionValue::new(transform(&self.get()));
        let sink = output.clone();
        let subscription = self.on_change(move |value| sink.set(transform(value)));

        DerivedValue {
            value: output,
            _subscription: subscription,
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for MotionValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MotionValue")
            .field(&self.inner.state.lock().current)
            .finish()
    }
}

/// A value computed from another [`MotionValue`].
///
/// Stays connected to its source while alive.
#[derive(Debug)]
pub struct DerivedValue<U> {
    value: MotionValue<U>,
    _subscription: Subscription,
}

impl<U: Clone + PartialEq + Send + 'static> DerivedValue<U> {
    /// Current derived value
    pub fn get(&self) -> U {
        self.value.get()
    }

    /// The underlying observable output
    pub fn value(&self) -> MotionValue<U> {
        self.value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_notifies_only_on_change() {
        let value = MotionValue::new(0.0_f32);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = value.on_change(move |v| sink.lock().push(*v));

        value.set(0.5);
        value.set(0.5);
        value.set(1.0);

        assert_eq!(*seen.lock(), vec![0.5, 1.0]);
        assert_eq!(value.previous(), Some(0.5));
    }

    #[test]
    fn test_derived_follows_source() {
        let progress = MotionValue::new(0.0_f32);
        let doubled = progress.derive(|p| p * 2.0);

        progress.set(0.25);
        assert_eq!(doubled.get(), 0.5);

        drop(doubled);
        assert_eq!(progress.subscriber_count(), 0);
    }
}
