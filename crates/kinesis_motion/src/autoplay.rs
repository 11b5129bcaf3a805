// SPDX-License-Identifier: MIT OR Apache-2.0
//! Autoplay sequencer for carousels and rotators.
//!
//! States: `Stopped`, `Running(i)`, `Paused(i)`. A timer exists only while
//! running, so there is never more than one live timer per sequencer:
//! pausing, selecting or stopping cancels it, and resuming arms a fresh one
//! whose first tick is a full period away.
//!
//! Policies:
//! - out-of-range selection is a [`ConfigurationError`], never clamped
//! - `start` on a started sequencer is a [`ConfigurationError`]
//! - `resume` while stopped does nothing
//! - whether leaving a hovered item resumes playback is a [`HoverPolicy`]

use crate::error::{ConfigurationError, Result};
use crate::host::{Scheduler, TimerHandle};
use crate::observer::{Observers, Subscription};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequencerId(pub Uuid);

impl SequencerId {
    /// Create a new random sequencer ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SequencerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequencerState {
    /// Not started, or stopped
    #[default]
    Stopped,
    /// Advancing every period
    Running(usize),
    /// Holding an index
    Paused(usize),
}

impl SequencerState {
    /// Active index, if started
    pub fn active_index(&self) -> Option<usize> {
        match *self {
            Self::Running(i) | Self::Paused(i) => Some(i),
            Self::Stopped => None,
        }
    }

    /// Is currently advancing
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    /// Is holding an index
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused(_))
    }

    /// Is stopped
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// What happens when the pointer leaves an item that paused playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HoverPolicy {
    /// Resume automatically on leave
    #[default]
    ResumeOnLeave,
    /// Stay paused until [`AutoplaySequencer::resume`] is called
    ExplicitResume,
}

/// Why the active index changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    /// Sequencer started at index 0
    Start,
    /// Timer advanced the index
    Tick,
    /// Manual selection or navigation
    Select,
    /// Pointer entered an item
    Hover,
}

/// Notification sent to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexChange {
    /// Index before the change (`None` when starting from `Stopped`)
    pub previous: Option<usize>,
    /// Index after the change
    pub current: usize,
    /// Cause of the change
    pub cause: ChangeCause,
}

struct Core {
    state: SequencerState,
    len: usize,
    period: Duration,
    hover_policy: HoverPolicy,
    /// The current pause was caused by `hover_enter`
    hover_paused: bool,
    timer: Option<TimerHandle>,
}

impl Core {
    fn cancel_timer(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

/// Timer-driven index cycler.
///
/// All methods take `&self`; the timer callback shares the state. Only the
/// owning component is expected to call the mutating methods. Dropping the
/// sequencer stops it and releases its timer.
pub struct AutoplaySequencer {
    id: SequencerId,
    core: Arc<Mutex<Core>>,
    observers: Observers<IndexChange>,
    state_observers: Observers<SequencerState>,
    scheduler: Scheduler,
}

impl AutoplaySequencer {
    /// Create a stopped sequencer on a scheduler
    pub fn new(scheduler: &Scheduler) -> Self {
        Self {
            id: SequencerId::new(),
            core: Arc::new(Mutex::new(Core {
                state: SequencerState::Stopped,
                len: 0,
                period: Duration::ZERO,
                hover_policy: HoverPolicy::default(),
                hover_paused: false,
                timer: None,
            })),
            observers: Observers::new(),
            state_observers: Observers::new(),
            scheduler: scheduler.clone(),
        }
    }

    /// Set the hover policy
    pub fn with_hover_policy(self, policy: HoverPolicy) -> Self {
        self.core.lock().hover_policy = policy;
        self
    }

    /// Sequencer ID
    pub fn id(&self) -> SequencerId {
        self.id
    }

    /// `Stopped -> Running(0)` cycling over `len` items every `period`
    pub fn start(&self, len: usize, period: Duration) -> Result<()> {
        if len == 0 {
            return Err(ConfigurationError::ZeroCount { what: "sequence length" });
        }
        if period.is_zero() {
            return Err(ConfigurationError::ZeroPeriod { what: "autoplay period" });
        }

        {
            let mut core = self.core.lock();
            if !core.state.is_stopped() {
                return Err(ConfigurationError::AlreadyStarted);
            }
            core.len = len;
            core.period = period;
            core.state = SequencerState::Running(0);
            core.hover_paused = false;
            self.arm(&mut core)?;
        }

        tracing::debug!(id = ?self.id, len, ?period, "Autoplay started");
        self.observers.notify(&IndexChange {
            previous: None,
            current: 0,
            cause: ChangeCause::Start,
        });
        self.state_observers.notify(&SequencerState::Running(0));
        Ok(())
    }

    /// `Running(i) -> Paused(i)`; no-op otherwise
    pub fn pause(&self) {
        let paused = {
            let mut core = self.core.lock();
            core.hover_paused = false;
            match core.state {
                SequencerState::Running(i) => {
                    core.state = SequencerState::Paused(i);
                    core.cancel_timer();
                    Some(core.state)
                }
                _ => None,
            }
        };

        if let Some(state) = paused {
            tracing::debug!(id = ?self.id, index = ?state.active_index(), "Autoplay paused");
            self.state_observers.notify(&state);
        }
    }

    /// `Paused(i) -> Running(i)`, next tick one full period from now; no-op otherwise
    pub fn resume(&self) {
        let resumed = {
            let mut core = self.core.lock();
            core.hover_paused = false;
            match core.state {
                SequencerState::Paused(i) => {
                    core.state = SequencerState::Running(i);
                    if let Err(e) = self.arm(&mut core) {
                        tracing::warn!(id = ?self.id, "Failed to re-arm autoplay timer: {e}");
                        core.state = SequencerState::Paused(i);
                        return;
                    }
                    Some(core.state)
                }
                SequencerState::Running(_) => None,
                SequencerState::Stopped => {
                    tracing::trace!(id = ?self.id, "Resume ignored while stopped");
                    None
                }
            }
        };

        if let Some(state) = resumed {
            tracing::debug!(id = ?self.id, index = ?state.active_index(), "Autoplay resumed");
            self.state_observers.notify(&state);
        }
    }

    /// Toggle between running and paused
    pub fn toggle(&self) {
        let state = self.state();
        match state {
            SequencerState::Running(_) => self.pause(),
            SequencerState::Paused(_) => self.resume(),
            SequencerState::Stopped => {}
        }
    }

    /// Any state `-> Paused(index)`
    pub fn select_index(&self, index: usize) -> Result<()> {
        self.select(index, ChangeCause::Select)
    }

    fn select(&self, index: usize, cause: ChangeCause) -> Result<()> {
        let before = {
            let mut core = self.core.lock();
            if index >= core.len {
                return Err(ConfigurationError::IndexOutOfRange { index, len: core.len });
            }
            let before = core.state;
            core.cancel_timer();
            core.state = SequencerState::Paused(index);
            core.hover_paused = false;
            before
        };

        tracing::debug!(id = ?self.id, index, ?cause, "Autoplay index selected");
        let previous = before.active_index();
        if previous != Some(index) {
            self.observers.notify(&IndexChange {
                previous,
                current: index,
                cause,
            });
        }
        if before != SequencerState::Paused(index) {
            self.state_observers.notify(&SequencerState::Paused(index));
        }
        Ok(())
    }

    /// Select the following item (wrapping) and pause
    pub fn next(&self) -> Result<()> {
        let (index, len) = self.started_index()?;
        self.select((index + 1) % len, ChangeCause::Select)
    }

    /// Select the preceding item (wrapping) and pause
    pub fn previous(&self) -> Result<()> {
        let (index, len) = self.started_index()?;
        self.select((index + len - 1) % len, ChangeCause::Select)
    }

    fn started_index(&self) -> Result<(usize, usize)> {
        let core = self.core.lock();
        core.state
            .active_index()
            .map(|i| (i, core.len))
            .ok_or(ConfigurationError::NotStarted)
    }

    /// Pointer entered item `index`: select it and pause
    pub fn hover_enter(&self, index: usize) -> Result<()> {
        self.select(index, ChangeCause::Hover)?;
        self.core.lock().hover_paused = true;
        Ok(())
    }

    /// Pointer left the hovered item
    pub fn hover_leave(&self) {
        let resume = {
            let core = self.core.lock();
            core.hover_paused && core.hover_policy == HoverPolicy::ResumeOnLeave
        };
        if resume {
            self.resume();
        }
    }

    /// Any state `-> Stopped`, releasing the timer. Idempotent.
    pub fn stop(&self) {
        let stopped = {
            let mut core = self.core.lock();
            core.cancel_timer();
            core.hover_paused = false;
            let was_started = !core.state.is_stopped();
            core.state = SequencerState::Stopped;
            was_started
        };

        if stopped {
            tracing::debug!(id = ?self.id, "Autoplay stopped");
            self.state_observers.notify(&SequencerState::Stopped);
        }
    }

    /// Subscribe to index changes
    pub fn subscribe(&self, callback: impl Fn(&IndexChange) + Send + Sync + 'static) -> Subscription {
        self.observers.subscribe(callback)
    }

    /// Subscribe to state transitions, including pause and resume at the same
    /// index and every tick
    pub fn on_state_change(&self, callback: impl Fn(&SequencerState) + Send + Sync + 'static) -> Subscription {
        self.state_observers.subscribe(callback)
    }

    /// Current state
    pub fn state(&self) -> SequencerState {
        self.core.lock().state
    }

    /// Active index, if started
    pub fn active_index(&self) -> Option<usize> {
        self.state().active_index()
    }

    /// Number of items (0 before the first start)
    pub fn len(&self) -> usize {
        self.core.lock().len
    }

    /// Whether the sequence has no items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advance period
    pub fn period(&self) -> Duration {
        self.core.lock().period
    }

    /// Hover policy
    pub fn hover_policy(&self) -> HoverPolicy {
        self.core.lock().hover_policy
    }

    /// Whether a timer is currently registered for this sequencer
    pub fn has_live_timer(&self) -> bool {
        self.core.lock().timer.as_ref().is_some_and(TimerHandle::is_active)
    }

    /// Register the tick timer. Caller holds the core lock.
    fn arm(&self, core: &mut Core) -> Result<()> {
        core.cancel_timer();

        let weak: Weak<Mutex<Core>> = Arc::downgrade(&self.core);
        let observers = self.observers.clone();
        let state_observers = self.state_observers.clone();
        let id = self.id;

        let timer = self.scheduler.set_interval(core.period, move || {
            let Some(core) = weak.upgrade() else {
                return;
            };
            let change = {
                let mut core = core.lock();
                match core.state {
                    SequencerState::Running(i) => {
                        let next = (i + 1) % core.len;
                        core.state = SequencerState::Running(next);
                        IndexChange {
                            previous: Some(i),
                            current: next,
                            cause: ChangeCause::Tick,
                        }
                    }
                    SequencerState::Paused(_) | SequencerState::Stopped => return,
                }
            };
            tracing::trace!(?id, index = change.current, "Autoplay tick");
            observers.notify(&change);
            state_observers.notify(&SequencerState::Running(change.current));
        })?;

        core.timer = Some(timer);
        Ok(())
    }
}

impl Drop for AutoplaySequencer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for AutoplaySequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.core.lock();
        f.debug_struct("AutoplaySequencer")
            .field("id", &self.id)
            .field("state", &core.state)
            .field("len", &core.len)
            .field("period", &core.period)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(5000);

    fn started(len: usize) -> (Scheduler, AutoplaySequencer) {
        let scheduler = Scheduler::new();
        let sequencer = AutoplaySequencer::new(&scheduler);
        sequencer.start(len, PERIOD).unwrap();
        (scheduler, sequencer)
    }

    fn ticks(scheduler: &Scheduler, n: u32) {
        for _ in 0..n {
            scheduler.advance(PERIOD);
        }
    }

    #[test]
    fn test_wraps_after_len_ticks() {
        let (scheduler, sequencer) = started(4);
        ticks(&scheduler, 3);
        assert_eq!(sequencer.active_index(), Some(3));
        ticks(&scheduler, 1);
        assert_eq!(sequencer.active_index(), Some(0));
    }

    #[test]
    fn test_index_is_ticks_mod_len() {
        for len in 1..6 {
            let (scheduler, sequencer) = started(len);
            for k in 0..13_u32 {
                assert_eq!(sequencer.active_index(), Some(k as usize % len));
                ticks(&scheduler, 1);
            }
        }
    }

    #[test]
    fn test_long_advance_fires_every_tick() {
        let (scheduler, sequencer) = started(4);
        scheduler.advance(PERIOD * 7);
        assert_eq!(sequencer.active_index(), Some(3));
    }

    #[test]
    fn test_start_rejects_bad_input() {
        let scheduler = Scheduler::new();
        let sequencer = AutoplaySequencer::new(&scheduler);
        assert!(matches!(sequencer.start(0, PERIOD), Err(ConfigurationError::ZeroCount { .. })));
        assert!(matches!(
            sequencer.start(3, Duration::ZERO),
            Err(ConfigurationError::ZeroPeriod { .. })
        ));
        assert!(sequencer.state().is_stopped());
    }

    #[test]
    fn test_double_start_rejected_without_second_timer() {
        let (scheduler, sequencer) = started(4);
        assert_eq!(sequencer.start(4, PERIOD), Err(ConfigurationError::AlreadyStarted));
        assert_eq!(scheduler.live_timers(), 1);

        sequencer.pause();
        assert_eq!(sequencer.start(4, PERIOD), Err(ConfigurationError::AlreadyStarted));
        assert_eq!(scheduler.live_timers(), 0);
    }

    #[test]
    fn test_pause_freezes_index() {
        let (scheduler, sequencer) = started(4);
        ticks(&scheduler, 1);
        sequencer.pause();
        sequencer.pause();

        scheduler.advance(PERIOD * 3);
        assert_eq!(sequencer.state(), SequencerState::Paused(1));
        assert!(!sequencer.has_live_timer());
    }

    #[test]
    fn test_resume_waits_full_period() {
        let (scheduler, sequencer) = started(4);
        scheduler.advance(Duration::from_millis(4000));
        sequencer.pause();
        sequencer.resume();
        sequencer.resume();

        scheduler.advance(Duration::from_millis(4000));
        assert_eq!(sequencer.active_index(), Some(0));
        scheduler.advance(Duration::from_millis(1000));
        assert_eq!(sequencer.state(), SequencerState::Running(1));
        assert_eq!(scheduler.live_timers(), 1);
    }

    #[test]
    fn test_select_mid_run_then_resume() {
        let (scheduler, sequencer) = started(5);
        ticks(&scheduler, 1);
        scheduler.advance(Duration::from_millis(2500));

        sequencer.select_index(2).unwrap();
        assert_eq!(sequencer.state(), SequencerState::Paused(2));
        scheduler.advance(PERIOD * 2);
        assert_eq!(sequencer.active_index(), Some(2));

        sequencer.resume();
        ticks(&scheduler, 1);
        assert_eq!(sequencer.state(), SequencerState::Running(3));
    }

    #[test]
    fn test_select_out_of_range_is_error() {
        let (_scheduler, sequencer) = started(3);
        assert_eq!(
            sequencer.select_index(3),
            Err(ConfigurationError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(sequencer.state(), SequencerState::Running(0));

        let never_started = AutoplaySequencer::new(&Scheduler::new());
        assert!(never_started.select_index(0).is_err());
    }

    #[test]
    fn test_select_from_stopped_after_run() {
        let (scheduler, sequencer) = started(3);
        sequencer.stop();
        sequencer.select_index(1).unwrap();
        assert_eq!(sequencer.state(), SequencerState::Paused(1));

        sequencer.resume();
        ticks(&scheduler, 1);
        assert_eq!(sequencer.state(), SequencerState::Running(2));
    }

    #[test]
    fn test_stop_is_idempotent_and_releases_timer() {
        let (scheduler, sequencer) = started(4);
        sequencer.stop();
        sequencer.stop();
        assert_eq!(scheduler.live_timers(), 0);
        ticks(&scheduler, 3);
        assert!(sequencer.state().is_stopped());

        sequencer.resume();
        assert!(sequencer.state().is_stopped());
        assert_eq!(scheduler.live_timers(), 0);
    }

    #[test]
    fn test_restart_after_stop() {
        let (scheduler, sequencer) = started(4);
        ticks(&scheduler, 2);
        sequencer.stop();
        sequencer.start(2, PERIOD).unwrap();
        assert_eq!(sequencer.active_index(), Some(0));
        ticks(&scheduler, 3);
        assert_eq!(sequencer.active_index(), Some(1));
    }

    #[test]
    fn test_drop_releases_timer() {
        let scheduler = Scheduler::new();
        {
            let sequencer = AutoplaySequencer::new(&scheduler);
            sequencer.start(4, PERIOD).unwrap();
            assert_eq!(scheduler.live_timers(), 1);
        }
        assert_eq!(scheduler.live_timers(), 0);
        ticks(&scheduler, 2);
    }

    #[test]
    fn test_hover_resume_on_leave() {
        let (scheduler, sequencer) = started(4);
        sequencer.hover_enter(2).unwrap();
        assert_eq!(sequencer.state(), SequencerState::Paused(2));

        sequencer.hover_leave();
        assert_eq!(sequencer.state(), SequencerState::Running(2));
        ticks(&scheduler, 1);
        assert_eq!(sequencer.active_index(), Some(3));
    }

    #[test]
    fn test_hover_explicit_resume_policy() {
        let scheduler = Scheduler::new();
        let sequencer = AutoplaySequencer::new(&scheduler).with_hover_policy(HoverPolicy::ExplicitResume);
        sequencer.start(4, PERIOD).unwrap();

        sequencer.hover_enter(1).unwrap();
        sequencer.hover_leave();
        ticks(&scheduler, 2);
        assert_eq!(sequencer.state(), SequencerState::Paused(1));

        sequencer.resume();
        assert!(sequencer.state().is_running());
    }

    #[test]
    fn test_hover_leave_respects_explicit_pause() {
        let (_scheduler, sequencer) = started(4);
        sequencer.hover_enter(1).unwrap();
        sequencer.pause();
        sequencer.hover_leave();
        assert_eq!(sequencer.state(), SequencerState::Paused(1));
    }

    #[test]
    fn test_next_previous_wrap() {
        let (_scheduler, sequencer) = started(3);
        sequencer.previous().unwrap();
        assert_eq!(sequencer.state(), SequencerState::Paused(2));
        sequencer.next().unwrap();
        assert_eq!(sequencer.state(), SequencerState::Paused(0));

        sequencer.stop();
        assert_eq!(sequencer.next(), Err(ConfigurationError::NotStarted));
    }

    #[test]
    fn test_toggle() {
        let (_scheduler, sequencer) = started(3);
        sequencer.toggle();
        assert!(sequencer.state().is_paused());
        sequencer.toggle();
        assert!(sequencer.state().is_running());
    }

    #[test]
    fn test_subscribers_see_changes() {
        let (scheduler, sequencer) = started(3);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = sequencer.subscribe(move |change| sink.lock().push((change.current, change.cause)));

        ticks(&scheduler, 1);
        sequencer.select_index(1).unwrap();
        sequencer.hover_enter(0).unwrap();

        assert_eq!(
            *seen.lock(),
            vec![(1, ChangeCause::Tick), (0, ChangeCause::Hover)]
        );
    }

    #[test]
    fn test_state_observers_see_every_transition() {
        let (scheduler, sequencer) = started(3);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = sequencer.on_state_change(move |state| sink.lock().push(*state));

        ticks(&scheduler, 1);
        sequencer.pause();
        sequencer.pause();
        sequencer.resume();
        sequencer.select_index(1).unwrap();
        sequencer.select_index(1).unwrap();
        sequencer.hover_enter(2).unwrap();
        sequencer.hover_leave();
        sequencer.stop();
        sequencer.stop();

        assert_eq!(
            *seen.lock(),
            vec![
                SequencerState::Running(1),
                SequencerState::Paused(1),
                SequencerState::Running(1),
                SequencerState::Paused(1),
                SequencerState::Paused(2),
                SequencerState::Running(2),
                SequencerState::Stopped,
            ]
        );
    }

    #[test]
    fn test_subscriber_may_pause_reentrantly() {
        let scheduler = Scheduler::new();
        let sequencer = Arc::new(AutoplaySequencer::new(&scheduler));
        let weak = Arc::downgrade(&sequencer);
        let _sub = sequencer.subscribe(move |change| {
            if change.current == 2 {
                if let Some(s) = weak.upgrade() {
                    s.pause();
                }
            }
        });

        sequencer.start(4, PERIOD).unwrap();
        ticks(&scheduler, 5);
        assert_eq!(sequencer.state(), SequencerState::Paused(2));
        assert_eq!(scheduler.live_timers(), 0);
    }
}
