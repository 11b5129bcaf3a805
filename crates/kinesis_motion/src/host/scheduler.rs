// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deterministic timer and animation-frame scheduler.
//!
//! The scheduler owns a monotonic clock that only moves when
//! [`Scheduler::advance`] is called, either by a test, by the preview's
//! simulation loop or by a [`crate::host::FrameDriver`]. Within one advance,
//! due timers fire strictly in due-time order (ties in arming order) and
//! never overlap; one animation frame is delivered afterwards.

use crate::error::{ConfigurationError, Result};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a timer or frame callback registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub Uuid);

impl TimerId {
    /// Create a new random timer ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TimerId {
    fn default() -> Self {
        Self::new()
    }
}

type TimerCallback = Box<dyn FnMut() + Send>;
type FrameCallback = Box<dyn FnMut(Duration) + Send>;

struct TimerEntry {
    due: Duration,
    /// `None` for one-shot timers
    period: Option<Duration>,
    /// Arming order, breaks ties between timers due at the same instant
    seq: u64,
    /// Taken out while the callback runs
    callback: Option<TimerCallback>,
}

struct SchedulerInner {
    now: Duration,
    next_seq: u64,
    timers: IndexMap<TimerId, TimerEntry>,
    frames: IndexMap<TimerId, Option<FrameCallback>>,
}

impl SchedulerInner {
    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Earliest timer due at or before `limit`
    fn next_due(&self, limit: Duration) -> Option<TimerId> {
        self.timers
            .iter()
            .filter(|(_, t)| t.due <= limit && t.callback.is_some())
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(id, _)| *id)
    }
}

/// Host timer primitive.
///
/// Cloning yields another handle to the same clock and registry.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Mutex<SchedulerInner>>,
}

impl Scheduler {
    /// Create a scheduler with its clock at zero
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                now: Duration::ZERO,
                next_seq: 0,
                timers: IndexMap::new(),
                frames: IndexMap::new(),
            })),
        }
    }

    /// Current clock value
    pub fn now(&self) -> Duration {
        self.inner.lock().now
    }

    /// Register a repeating timer firing every `period`
    pub fn set_interval(
        &self,
        period: Duration,
        callback: impl FnMut() + Send + 'static,
    ) -> Result<TimerHandle> {
        if period.is_zero() {
            return Err(ConfigurationError::ZeroPeriod { what: "interval period" });
        }
        Ok(self.arm(period, Some(period), Box::new(callback)))
    }

    /// Register a one-shot timer firing once after `delay`.
    ///
    /// A zero delay fires on the next [`Scheduler::advance`], including
    /// `advance(Duration::ZERO)`.
    pub fn set_timeout(&self, delay: Duration, callback: impl FnMut() + Send + 'static) -> TimerHandle {
        self.arm(delay, None, Box::new(callback))
    }

    fn arm(&self, delay: Duration, period: Option<Duration>, callback: TimerCallback) -> TimerHandle {
        let id = TimerId::new();
        let mut inner = self.inner.lock();
        let due = inner.now + delay;
        let seq = inner.next_seq();
        inner.timers.insert(
            id,
            TimerEntry {
                due,
                period,
                seq,
                callback: Some(callback),
            },
        );
        tracing::trace!(?id, ?due, ?period, "Timer armed");

        TimerHandle {
            id,
            kind: HandleKind::Timer,
            scheduler: Arc::downgrade(&self.inner),
        }
    }

    /// Register a callback invoked once per animation frame with the clock value
    pub fn on_frame(&self, callback: impl FnMut(Duration) + Send + 'static) -> TimerHandle {
        let id = TimerId::new();
        self.inner.lock().frames.insert(id, Some(Box::new(callback)));

        TimerHandle {
            id,
            kind: HandleKind::Frame,
            scheduler: Arc::downgrade(&self.inner),
        }
    }

    /// Move the clock forward by `delta`, firing due timers then one frame
    pub fn advance(&self, delta: Duration) {
        let target = self.inner.lock().now + delta;

        loop {
            let (id, mut callback, one_shot) = {
                let mut inner = self.inner.lock();
                let Some(id) = inner.next_due(target) else {
                    break;
                };
                let seq = inner.next_seq();
                let Some(entry) = inner.timers.get_mut(&id) else {
                    break;
                };
                let due = entry.due;
                let callback = entry.callback.take();
                let one_shot = match entry.period {
                    Some(period) => {
                        entry.due = due + period;
                        entry.seq = seq;
                        false
                    }
                    None => true,
                };
                if one_shot {
                    inner.timers.shift_remove(&id);
                }
                inner.now = due;
                (id, callback, one_shot)
            };

            if let Some(cb) = callback.as_mut() {
                cb();
            }

            // Put the callback back unless the timer was cancelled meanwhile
            if !one_shot {
                if let Some(entry) = self.inner.lock().timers.get_mut(&id) {
                    entry.callback = callback;
                }
            }
        }

        self.inner.lock().now = target;
        self.run_frame(target);
    }

    fn run_frame(&self, now: Duration) {
        let ids: Vec<TimerId> = self.inner.lock().frames.keys().copied().collect();

        for id in ids {
            let callback = self.inner.lock().frames.get_mut(&id).and_then(Option::take);
            let Some(mut callback) = callback else {
                continue;
            };
            callback(now);
            if let Some(slot) = self.inner.lock().frames.get_mut(&id) {
                *slot = Some(callback);
            }
        }
    }

    /// Number of registered timers (repeating and pending one-shot)
    pub fn live_timers(&self) -> usize {
        self.inner.lock().timers.len()
    }

    /// Number of registered frame callbacks
    pub fn live_frame_callbacks(&self) -> usize {
        self.inner.lock().frames.len()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Scheduler")
            .field("now", &inner.now)
            .field("timers", &inner.timers.len())
            .field("frames", &inner.frames.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleKind {
    Timer,
    Frame,
}

/// Owned registration of a timer or frame callback.
///
/// [`TimerHandle::cancel`] is idempotent; dropping the handle cancels.
/// Once cancelled the callback never runs again.
#[must_use = "dropping a TimerHandle cancels the timer"]
pub struct TimerHandle {
    id: TimerId,
    kind: HandleKind,
    scheduler: Weak<Mutex<SchedulerInner>>,
}

impl TimerHandle {
    /// Registration ID
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Release the registration
    pub fn cancel(&mut self) {
        let Some(inner) = self.scheduler.upgrade() else {
            return;
        };
        let mut inner = inner.lock();
        let removed = match self.kind {
            HandleKind::Timer => inner.timers.shift_remove(&self.id).is_some(),
            HandleKind::Frame => inner.frames.shift_remove(&self.id).is_some(),
        };
        if removed {
            tracing::trace!(id = ?self.id, "Timer cancelled");
        }
        self.scheduler = Weak::new();
    }

    /// Whether the registration is still live (a fired one-shot is not)
    pub fn is_active(&self) -> bool {
        let Some(inner) = self.scheduler.upgrade() else {
            return false;
        };
        let inner = inner.lock();
        match self.kind {
            HandleKind::Timer => inner.timers.contains_key(&self.id),
            HandleKind::Frame => inner.frames.contains_key(&self.id),
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}
