// SPDX-License-Identifier: MIT OR Apache-2.0
//! One-shot visibility latch.
//!
//! A [`RevealTrigger`] fires its callback the first time enough of an element
//! is inside the (optionally inset) viewport, then stops observing for good.
//! Removing the element before that releases the observation without firing.

use crate::error::{ensure_finite, ensure_fraction, Result};
use crate::host::{Document, ElementId, EventKind, HostEvent, ListenerHandle, Point, Rect, Size};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::Arc;

/// Viewport margin, like a root margin of `-100px` or `-10%`.
///
/// Positive values grow the viewport on every side, negative values shrink it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Margin {
    /// Pixels
    Px(f32),
    /// Percent of the viewport width (left, right) and height (top, bottom)
    Percent(f32),
}

impl Default for Margin {
    fn default() -> Self {
        Margin::Px(0.0)
    }
}

impl Margin {
    /// Horizontal and vertical margin in pixels for `viewport`
    pub fn resolve(&self, viewport: Size) -> (f32, f32) {
        match *self {
            Margin::Px(px) => (px, px),
            Margin::Percent(pct) => (viewport.width * pct / 100.0, viewport.height * pct / 100.0),
        }
    }

    fn amount(&self) -> f32 {
        match *self {
            Margin::Px(v) | Margin::Percent(v) => v,
        }
    }
}

/// Visibility options
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealOptions {
    /// Fraction of the element's area that must be visible; `0` means any
    pub threshold: f32,
    /// Viewport margin
    pub margin: Margin,
}

impl RevealOptions {
    /// Options with a threshold and no margin
    pub fn threshold(threshold: f32) -> Self {
        Self {
            threshold,
            margin: Margin::default(),
        }
    }

    /// Set the viewport margin
    pub fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = margin;
        self
    }

    /// Check ranges
    pub fn validate(&self) -> Result<()> {
        ensure_fraction("reveal threshold", self.threshold)?;
        ensure_finite("reveal margin", self.margin.amount())
    }

    fn is_met(&self, fraction: f32) -> bool {
        if self.threshold <= 0.0 {
            fraction > 0.0
        } else {
            fraction >= self.threshold
        }
    }
}

/// Fraction of `element`'s area inside the viewport at `scroll`, with the
/// viewport inflated by `margin`. Zero-area elements report 0.
pub fn visible_fraction(element: Rect, viewport: Size, scroll: Point, margin: Margin) -> f32 {
    let area = element.area();
    if area <= 0.0 {
        return 0.0;
    }
    let (dx, dy) = margin.resolve(viewport);
    let root = Rect::new(scroll.x, scroll.y, viewport.width, viewport.height).inflate_xy(dx, dy);
    element
        .intersection(&root)
        .map_or(0.0, |visible| (visible.area() / area).clamp(0.0, 1.0))
}

/// Trigger lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    /// Waiting for the element to become visible
    Observing,
    /// Callback has run
    Fired,
    /// Released without firing (element removed or trigger disposed)
    Detached,
}

type RevealCallback = Box<dyn FnOnce() + Send>;

/// Fires a callback exactly once, the first time an element is visible
pub struct RevealTrigger {
    element: ElementId,
    state: Arc<Mutex<RevealState>>,
    listener: Option<ListenerHandle>,
}

impl RevealTrigger {
    /// Start observing `element`.
    ///
    /// If the element is already visible the callback runs before this returns.
    pub fn observe(
        document: &Document,
        element: ElementId,
        options: RevealOptions,
        on_reveal: impl FnOnce() + Send + 'static,
    ) -> Result<Self> {
        options.validate()?;
        let rect = document.require_element(element)?;

        let state = Arc::new(Mutex::new(RevealState::Observing));

        if options.is_met(visible_fraction(rect, document.viewport(), document.scroll(), options.margin)) {
            *state.lock() = RevealState::Fired;
            tracing::debug!(?element, "Element visible on mount, revealed");
            on_reveal();
            return Ok(Self {
                element,
                state,
                listener: None,
            });
        }

        let latch = Arc::clone(&state);
        let mut callback: Option<RevealCallback> = Some(Box::new(on_reveal));
        let listener = document.listen(
            &[EventKind::Scroll, EventKind::Resize, EventKind::Layout],
            move |event, doc| {
                if *event == HostEvent::ElementRemoved(element) {
                    *latch.lock() = RevealState::Detached;
                    tracing::debug!(?element, "Observed element removed before reveal");
                    return ControlFlow::Break(());
                }
                let Some(rect) = doc.element_rect(element) else {
                    return ControlFlow::Continue(());
                };
                if !options.is_met(visible_fraction(rect, doc.viewport(), doc.scroll(), options.margin)) {
                    return ControlFlow::Continue(());
                }

                {
                    let mut state = latch.lock();
                    if *state != RevealState::Observing {
                        return ControlFlow::Break(());
                    }
                    *state = RevealState::Fired;
                }
                tracing::debug!(?element, "Element revealed");
                if let Some(callback) = callback.take() {
                    callback();
                }
                ControlFlow::Break(())
            },
        );

        Ok(Self {
            element,
            state,
            listener: Some(listener),
        })
    }

    /// Observed element
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// Current lifecycle state
    pub fn state(&self) -> RevealState {
        *self.state.lock()
    }

    /// Whether the callback has run
    pub fn has_fired(&self) -> bool {
        self.state() == RevealState::Fired
    }

    /// Whether the trigger still holds a live listener
    pub fn is_observing(&self) -> bool {
        self.listener.as_ref().is_some_and(ListenerHandle::is_active)
    }

    /// Stop observing. A trigger that has not fired never will.
    pub fn dispose(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            listener.cancel();
        }
        let mut state = self.state.lock();
        if *state == RevealState::Observing {
            *state = RevealState::Detached;
        }
    }
}

impl Drop for RevealTrigger {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for RevealTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealTrigger")
            .field("element", &self.element)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn document() -> Document {
        let document = Document::new(Size::new(1000.0, 800.0));
        document.set_height(4000.0);
        document
    }

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_fires_once_across_visibility_changes() {
        let document = document();
        let element = document.insert_element(Rect::new(0.0, 1500.0, 1000.0, 200.0));
        let (count, cb) = counter();
        let trigger = RevealTrigger::observe(&document, element, RevealOptions::default(), cb).unwrap();

        assert_eq!(trigger.state(), RevealState::Observing);
        document.scroll_to(0.0, 1000.0);
        document.scroll_to(0.0, 0.0);
        document.scroll_to(0.0, 1000.0);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(trigger.has_fired());
        assert!(!trigger.is_observing());
        assert_eq!(document.live_listeners(), 0);
    }

    #[test]
    fn test_visible_on_mount_fires_immediately() {
        let document = document();
        let element = document.insert_element(Rect::new(0.0, 100.0, 500.0, 100.0));
        let (count, cb) = counter();
        let trigger = RevealTrigger::observe(&document, element, RevealOptions::default(), cb).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(trigger.has_fired());
        assert_eq!(document.live_listeners(), 0);
    }

    #[test]
    fn test_removed_before_visible_never_fires() {
        let document = document();
        let element = document.insert_element(Rect::new(0.0, 2000.0, 1000.0, 200.0));
        let (count, cb) = counter();
        let trigger = RevealTrigger::observe(&document, element, RevealOptions::default(), cb).unwrap();

        document.remove_element(element);
        document.scroll_to(0.0, 2000.0);

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(trigger.state(), RevealState::Detached);
        assert_eq!(document.live_listeners(), 0);
    }

    #[test]
    fn test_dispose_before_visible() {
        let document = document();
        let element = document.insert_element(Rect::new(0.0, 2000.0, 1000.0, 200.0));
        let (count, cb) = counter();
        let mut trigger = RevealTrigger::observe(&document, element, RevealOptions::default(), cb).unwrap();

        trigger.dispose();
        trigger.dispose();
        document.scroll_to(0.0, 2000.0);

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(trigger.state(), RevealState::Detached);
        assert_eq!(document.live_listeners(), 0);
    }

    #[test]
    fn test_drop_releases_listener() {
        let document = document();
        let element = document.insert_element(Rect::new(0.0, 2000.0, 1000.0, 200.0));
        let (_count, cb) = counter();
        {
            let _trigger = RevealTrigger::observe(&document, element, RevealOptions::default(), cb).unwrap();
            assert_eq!(document.live_listeners(), 1);
        }
        assert_eq!(document.live_listeners(), 0);
    }

    #[test]
    fn test_threshold_fraction() {
        let document = document();
        let element = document.insert_element(Rect::new(0.0, 1000.0, 1000.0, 200.0));
        let (count, cb) = counter();
        let _trigger = RevealTrigger::observe(&document, element, RevealOptions::threshold(0.5), cb).unwrap();

        document.scroll_to(0.0, 250.0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        document.scroll_to(0.0, 300.0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_negative_margin_insets_viewport() {
        let document = document();
        let element = document.insert_element(Rect::new(0.0, 850.0, 1000.0, 100.0));
        let (count, cb) = counter();
        let options = RevealOptions::default().with_margin(Margin::Px(-100.0));
        let _trigger = RevealTrigger::observe(&document, element, options, cb).unwrap();

        document.scroll_to(0.0, 100.0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        document.scroll_to(0.0, 250.0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_percent_margin_scales_with_viewport() {
        let document = document();
        let element = document.insert_element(Rect::new(0.0, 850.0, 1000.0, 100.0));
        let (count, cb) = counter();
        let options = RevealOptions::default().with_margin(Margin::Percent(-10.0));
        let _trigger = RevealTrigger::observe(&document, element, options, cb).unwrap();

        // viewport 1000x800 inset by 100 horizontally and 80 vertically
        document.scroll_to(0.0, 100.0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        document.scroll_to(0.0, 200.0);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert_eq!(Margin::Percent(-10.0).resolve(Size::new(1000.0, 800.0)), (-100.0, -80.0));
        assert!(RevealOptions::default().with_margin(Margin::Percent(f32::NAN)).validate().is_err());
    }

    #[test]
    fn test_layout_change_can_reveal() {
        let document = document();
        let element = document.insert_element(Rect::new(0.0, 3000.0, 1000.0, 200.0));
        let (count, cb) = counter();
        let _trigger = RevealTrigger::observe(&document, element, RevealOptions::default(), cb).unwrap();

        document.set_element_rect(element, Rect::new(0.0, 400.0, 1000.0, 200.0));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rejects_bad_options_and_unknown_element() {
        let document = document();
        let element = document.insert_element(Rect::new(0.0, 0.0, 10.0, 10.0));

        let result = RevealTrigger::observe(&document, element, RevealOptions::threshold(1.5), || {});
        assert!(matches!(result, Err(ConfigurationError::FractionOutOfRange { .. })));

        document.remove_element(element);
        let result = RevealTrigger::observe(&document, element, RevealOptions::default(), || {});
        assert!(matches!(result, Err(ConfigurationError::UnknownElement)));
    }

    #[test]
    fn test_visible_fraction() {
        let viewport = Size::new(1000.0, 800.0);
        let element = Rect::new(0.0, 700.0, 1000.0, 200.0);
        let none = Margin::default();
        assert_eq!(visible_fraction(element, viewport, Point::default(), none), 0.5);
        assert_eq!(visible_fraction(element, viewport, Point::new(0.0, 100.0), none), 1.0);
        assert_eq!(visible_fraction(element, viewport, Point::default(), Margin::Px(-100.0)), 0.0);
        assert_eq!(visible_fraction(element, viewport, Point::default(), Margin::Percent(25.0)), 1.0);
        assert_eq!(visible_fraction(element, viewport, Point::default(), Margin::Percent(-25.0)), 0.0);
        assert_eq!(visible_fraction(Rect::new(0.0, 0.0, 0.0, 10.0), viewport, Point::default(), none), 0.0);
    }
}
