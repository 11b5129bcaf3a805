// SPDX-License-Identifier: MIT OR Apache-2.0
//! Staggered entrance scheduling for item groups.
//!
//! A [`StaggerSchedule`] is the per-item delay list, computed once.
//! [`StaggeredReveal`] pairs it with a [`RevealTrigger`] on the group: when
//! the group becomes visible, item `i` starts `delay[i]` after that instant.

use crate::error::Result;
use crate::host::{Document, ElementId, Scheduler, TimerHandle};
use crate::reveal::{RevealOptions, RevealTrigger};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Per-item start delays, in item order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StaggerSchedule {
    delays: Vec<Duration>,
}

impl StaggerSchedule {
    /// `delay[i] = base + i * per_item`
    pub fn linear(count: usize, base: Duration, per_item: Duration) -> Self {
        Self::from_fn(count, |i| base + per_item.saturating_mul(u32::try_from(i).unwrap_or(u32::MAX)))
    }

    /// Delays from an arbitrary function of the item index
    pub fn from_fn(count: usize, delay: impl Fn(usize) -> Duration) -> Self {
        Self {
            delays: (0..count).map(delay).collect(),
        }
    }

    /// All delays
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Delay of item `index`
    pub fn delay(&self, index: usize) -> Option<Duration> {
        self.delays.get(index).copied()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.delays.len()
    }

    /// Whether the group is empty
    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    /// `(index, delay)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, Duration)> + '_ {
        self.delays.iter().copied().enumerate()
    }
}

/// Millisecond delays `base_ms + i * per_item_ms` for `i` in `0..count`
pub fn schedule(count: usize, base_ms: u64, per_item_ms: u64) -> Vec<u64> {
    (0..count as u64).map(|i| base_ms + i * per_item_ms).collect()
}

/// Reveal-gated group entrance
pub struct StaggeredReveal {
    trigger: RevealTrigger,
    pending: Arc<Mutex<Vec<TimerHandle>>>,
}

impl StaggeredReveal {
    /// Observe `group`; once visible, call `on_item(i)` after each item's delay
    pub fn arm(
        document: &Document,
        scheduler: &Scheduler,
        group: ElementId,
        options: RevealOptions,
        schedule: StaggerSchedule,
        on_item: impl Fn(usize) + Send + Sync + 'static,
    ) -> Result<Self> {
        let pending: Arc<Mutex<Vec<TimerHandle>>> = Arc::new(Mutex::new(Vec::new()));
        let on_item = Arc::new(on_item);

        let timers = Arc::clone(&pending);
        let scheduler = scheduler.clone();
        let trigger = RevealTrigger::observe(document, group, options, move || {
            tracing::debug!(items = schedule.len(), "Group revealed, staggering items");
            let handles: Vec<TimerHandle> = schedule
                .iter()
                .map(|(index, delay)| {
                    let on_item = Arc::clone(&on_item);
                    scheduler.set_timeout(delay, move || on_item(index))
                })
                .collect();
            *timers.lock() = handles;
        })?;

        Ok(Self { trigger, pending })
    }

    /// Whether the group has been revealed
    pub fn has_fired(&self) -> bool {
        self.trigger.has_fired()
    }

    /// Items whose timeout has not run yet
    pub fn pending_items(&self) -> usize {
        self.pending.lock().iter().filter(|h| h.is_active()).count()
    }

    /// Stop observing and cancel items not yet started
    pub fn dispose(&mut self) {
        self.trigger.dispose();
        let handles = std::mem::take(&mut *self.pending.lock());
        drop(handles);
    }
}

impl Drop for StaggeredReveal {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for StaggeredReveal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaggeredReveal")
            .field("trigger", &self.trigger)
            .field("pending", &self.pending_items())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Rect, Size};

    #[test]
    fn test_schedule_linear() {
        assert_eq!(schedule(5, 0, 100), vec![0, 100, 200, 300, 400]);
        assert_eq!(schedule(3, 200, 150), vec![200, 350, 500]);
        assert!(schedule(0, 200, 150).is_empty());
    }

    #[test]
    fn test_stagger_schedule_matches_ms_schedule() {
        let s = StaggerSchedule::linear(4, Duration::from_millis(50), Duration::from_millis(100));
        let ms: Vec<u64> = s.delays().iter().map(|d| d.as_millis() as u64).collect();
        assert_eq!(ms, schedule(4, 50, 100));
        assert_eq!(s.delay(3), Some(Duration::from_millis(350)));
        assert_eq!(s.delay(4), None);
    }

    #[test]
    fn test_from_fn() {
        let s = StaggerSchedule::from_fn(3, |i| Duration::from_millis(300 - 100 * i as u64));
        assert_eq!(
            s.iter().collect::<Vec<_>>(),
            vec![
                (0, Duration::from_millis(300)),
                (1, Duration::from_millis(200)),
                (2, Duration::from_millis(100)),
            ]
        );
    }

    fn setup() -> (Document, Scheduler, ElementId) {
        let document = Document::new(Size::new(1000.0, 800.0));
        document.set_height(3000.0);
        let group = document.insert_element(Rect::new(0.0, 1200.0, 1000.0, 400.0));
        (document, Scheduler::new(), group)
    }

    #[test]
    fn test_items_start_after_reveal_in_order() {
        let (document, scheduler, group) = setup();
        let started = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&started);
        let schedule = StaggerSchedule::linear(3, Duration::ZERO, Duration::from_millis(100));
        let reveal = StaggeredReveal::arm(&document, &scheduler, group, RevealOptions::default(), schedule, move |i| {
            sink.lock().push(i);
        })
        .unwrap();

        scheduler.advance(Duration::from_millis(500));
        assert!(started.lock().is_empty());

        document.scroll_to(0.0, 800.0);
        assert!(reveal.has_fired());
        assert_eq!(reveal.pending_items(), 3);

        scheduler.advance(Duration::ZERO);
        assert_eq!(*started.lock(), vec![0]);
        scheduler.advance(Duration::from_millis(150));
        assert_eq!(*started.lock(), vec![0, 1]);
        scheduler.advance(Duration::from_millis(50));
        assert_eq!(*started.lock(), vec![0, 1, 2]);
        assert_eq!(reveal.pending_items(), 0);
    }

    #[test]
    fn test_dispose_cancels_pending_items() {
        let (document, scheduler, group) = setup();
        let started = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&started);
        let schedule = StaggerSchedule::linear(3, Duration::from_millis(100), Duration::from_millis(100));
        let mut reveal = StaggeredReveal::arm(&document, &scheduler, group, RevealOptions::default(), schedule, move |i| {
            sink.lock().push(i);
        })
        .unwrap();

        document.scroll_to(0.0, 800.0);
        scheduler.advance(Duration::from_millis(150));
        reveal.dispose();
        scheduler.advance(Duration::from_millis(500));

        assert_eq!(*started.lock(), vec![0]);
        assert_eq!(scheduler.live_timers(), 0);
        assert_eq!(document.live_listeners(), 0);
    }
}
