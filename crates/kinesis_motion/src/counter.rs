// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reveal-gated animated counters.

use crate::error::{ensure_finite, Result};
use crate::host::{Document, ElementId, Scheduler};
use crate::motion_value::{DerivedValue, MotionValue};
use crate::reveal::{RevealOptions, RevealTrigger};
use crate::spring::{Spring, SpringFollower};

/// Compact display form: `1.5M`, `12K`, `999`, followed by `suffix`.
///
/// Millions keep one decimal, thousands none; smaller values are floored.
/// Rounding is half away from zero.
pub fn format_compact(value: f32, suffix: &str) -> String {
    let value = f64::from(value);
    if value >= 1_000_000.0 {
        let tenths = (value / 100_000.0).round();
        format!("{:.1}M{suffix}", tenths / 10.0)
    } else if value >= 1000.0 {
        format!("{}K{suffix}", (value / 1000.0).round() as i64)
    } else {
        format!("{}{suffix}", value.floor() as i64)
    }
}

/// A number that springs from 0 to its target once its element is visible
pub struct Counter {
    target: f32,
    source: MotionValue<f32>,
    follower: SpringFollower,
    text: DerivedValue<String>,
    trigger: RevealTrigger,
}

impl Counter {
    /// Mount a counter on `element`
    pub fn mount(
        document: &Document,
        scheduler: &Scheduler,
        element: ElementId,
        target: f32,
        suffix: impl Into<String>,
        options: RevealOptions,
    ) -> Result<Self> {
        Self::mount_with_spring(document, scheduler, element, target, suffix, options, Spring::counter())
    }

    /// Mount with custom spring parameters
    pub fn mount_with_spring(
        document: &Document,
        scheduler: &Scheduler,
        element: ElementId,
        target: f32,
        suffix: impl Into<String>,
        options: RevealOptions,
        spring: Spring,
    ) -> Result<Self> {
        ensure_finite("counter target", target)?;
        let suffix = suffix.into();

        let source = MotionValue::new(0.0_f32);
        let follower = SpringFollower::follow(scheduler, &source, spring)?;
        let text = follower.value().derive(move |value| format_compact(*value, &suffix));

        let start = source.clone();
        let trigger = RevealTrigger::observe(document, element, options, move || {
            tracing::debug!(value = target, "Counter revealed");
            start.set(target);
        })?;

        Ok(Self {
            target,
            source,
            follower,
            text,
            trigger,
        })
    }

    /// Final value
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Current animated value
    pub fn value(&self) -> f32 {
        self.follower.get()
    }

    /// Current display text
    pub fn text(&self) -> String {
        self.text.get()
    }

    /// Observable display text
    pub fn text_value(&self) -> MotionValue<String> {
        self.text.value()
    }

    /// Whether counting has started
    pub fn is_revealed(&self) -> bool {
        self.trigger.has_fired()
    }

    /// Whether the counter has reached its target
    pub fn is_finished(&self) -> bool {
        self.is_revealed() && self.source.get() == self.target && self.follower.is_at_rest()
    }
}

impl std::fmt::Debug for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Counter")
            .field("target", &self.target)
            .field("value", &self.value())
            .field("trigger", &self.trigger)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Rect, Size};
    use std::time::Duration;

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(0.0, ""), "0");
        assert_eq!(format_compact(999.9, "+"), "999+");
        assert_eq!(format_compact(1000.0, ""), "1K");
        assert_eq!(format_compact(2500.0, "+"), "3K+");
        assert_eq!(format_compact(15_000.0, "+"), "15K+");
        assert_eq!(format_compact(1_000_000.0, ""), "1.0M");
        assert_eq!(format_compact(2_500_000.0, "+"), "2.5M+");
    }

    #[test]
    fn test_counter_waits_for_reveal_then_counts() {
        let document = Document::new(Size::new(1000.0, 800.0));
        document.set_height(3000.0);
        let scheduler = Scheduler::new();
        let element = document.insert_element(Rect::new(0.0, 1500.0, 300.0, 100.0));
        let counter = Counter::mount(&document, &scheduler, element, 15_000.0, "+", RevealOptions::default()).unwrap();

        for _ in 0..60 {
            scheduler.advance(Duration::from_millis(16));
        }
        assert_eq!(counter.text(), "0+");
        assert!(!counter.is_revealed());

        document.scroll_to(0.0, 1000.0);
        scheduler.advance(Duration::from_millis(16));
        assert!(counter.is_revealed());
        assert!(counter.value() > 0.0);

        for _ in 0..800 {
            scheduler.advance(Duration::from_millis(16));
        }
        assert_eq!(counter.text(), "15K+");
        assert!(counter.is_finished());
    }

    #[test]
    fn test_rejects_non_finite_target() {
        let document = Document::new(Size::new(1000.0, 800.0));
        let element = document.insert_element(Rect::new(0.0, 0.0, 10.0, 10.0));
        let result = Counter::mount(&document, &Scheduler::new(), element, f32::NAN, "", RevealOptions::default());
        assert!(result.is_err());
    }
}
