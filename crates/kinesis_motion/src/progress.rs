// SPDX-License-Identifier: MIT OR Apache-2.0
//! Progress sources: normalized `[0, 1]` signals from scroll, pointer and time.
//!
//! Each source owns its listener or frame registration exclusively and
//! publishes through a [`MotionValue<f32>`]. `dispose()` is idempotent and
//! dropping the source disposes it.

use crate::error::{ensure_finite, ConfigurationError, Result};
use crate::host::{Axis, Document, ElementId, EventKind, HostEvent, ListenerHandle, Rect, Scheduler, Size, TimerHandle};
use crate::motion_value::MotionValue;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

/// "Element edge meets viewport edge" scroll boundary.
///
/// `element` and `viewport` are fractions along the tracked axis: `0` is the
/// start (top) edge, `1` the end (bottom) edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollOffset {
    /// Point on the element
    pub element: f32,
    /// Point on the viewport
    pub viewport: f32,
}

impl ScrollOffset {
    /// Element top meets viewport bottom (element starts entering)
    pub const START_END: Self = Self::new(0.0, 1.0);
    /// Element bottom meets viewport top (element has left)
    pub const END_START: Self = Self::new(1.0, 0.0);
    /// Element top meets viewport top
    pub const START_START: Self = Self::new(0.0, 0.0);
    /// Element bottom meets viewport bottom
    pub const END_END: Self = Self::new(1.0, 1.0);

    /// Create an offset
    pub const fn new(element: f32, viewport: f32) -> Self {
        Self { element, viewport }
    }

    /// Scroll position at which this boundary is reached
    pub fn scroll_position(&self, element: Rect, viewport: Size) -> f32 {
        element.y + self.element * element.height - self.viewport * viewport.height
    }

    fn validate(&self) -> Result<()> {
        ensure_finite("scroll offset element fraction", self.element)?;
        ensure_finite("scroll offset viewport fraction", self.viewport)
    }
}

/// Progress of `scroll_y` between the `start` and `end` boundaries.
///
/// Coincident boundaries hold the progress at 0.
pub fn scroll_progress(element: Rect, viewport: Size, scroll_y: f32, start: ScrollOffset, end: ScrollOffset) -> f32 {
    let from = start.scroll_position(element, viewport);
    let to = end.scroll_position(element, viewport);
    let span = to - from;

    if span.abs() <= f32::EPSILON {
        return 0.0;
    }
    ((scroll_y - from) / span).clamp(0.0, 1.0)
}

/// Scroll-linked progress of an element (or of the whole page)
pub struct ScrollProgress {
    value: MotionValue<f32>,
    listener: Option<ListenerHandle>,
}

impl ScrollProgress {
    /// Track an element between two scroll boundaries
    pub fn track(document: &Document, element: ElementId, start: ScrollOffset, end: ScrollOffset) -> Result<Self> {
        start.validate()?;
        end.validate()?;
        let rect = document.require_element(element)?;
        if rect.is_empty() {
            return Err(ConfigurationError::ZeroSizedElement {
                width: rect.width,
                height: rect.height,
            });
        }
        let viewport = document.viewport();
        if viewport.height <= 0.0 {
            return Err(ConfigurationError::ZeroSizedViewport);
        }

        let value = MotionValue::new(scroll_progress(rect, viewport, document.scroll().y, start, end));
        let sink = value.clone();

        let listener = document.listen(
            &[EventKind::Scroll, EventKind::Resize, EventKind::Layout],
            move |event, doc| {
                if *event == HostEvent::ElementRemoved(element) {
                    tracing::debug!(?element, "Tracked element removed, scroll progress frozen");
                    return ControlFlow::Break(());
                }
                if let Some(rect) = doc.element_rect(element) {
                    sink.set(scroll_progress(rect, doc.viewport(), doc.scroll().y, start, end));
                }
                ControlFlow::Continue(())
            },
        );

        Ok(Self {
            value,
            listener: Some(listener),
        })
    }

    /// Track whole-page progress: `scroll_y / (document height - viewport height)`
    pub fn page(document: &Document) -> Result<Self> {
        if document.viewport().height <= 0.0 {
            return Err(ConfigurationError::ZeroSizedViewport);
        }

        let page_progress = |doc: &Document| {
            let range = doc.height() - doc.viewport().height;
            if range <= 0.0 {
                0.0
            } else {
                (doc.scroll().y / range).clamp(0.0, 1.0)
            }
        };

        let value = MotionValue::new(page_progress(document));
        let sink = value.clone();
        let listener = document.listen(&[EventKind::Scroll, EventKind::Resize, EventKind::Layout], move |_, doc| {
            sink.set(page_progress(doc));
            ControlFlow::Continue(())
        });

        Ok(Self {
            value,
            listener: Some(listener),
        })
    }

    /// Observable progress
    pub fn value(&self) -> MotionValue<f32> {
        self.value.clone()
    }

    /// Current progress
    pub fn get(&self) -> f32 {
        self.value.get()
    }

    /// Whether the underlying listener is still registered
    pub fn is_active(&self) -> bool {
        self.listener.as_ref().is_some_and(ListenerHandle::is_active)
    }

    /// Release the listener; the value stays at its last progress
    pub fn dispose(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            listener.cancel();
        }
    }
}

impl Drop for ScrollProgress {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Pointer position as a fraction of the viewport along one axis
pub struct PointerProgress {
    value: MotionValue<f32>,
    axis: Axis,
    listener: Option<ListenerHandle>,
}

impl PointerProgress {
    /// Track the pointer along `axis`
    pub fn track(document: &Document, axis: Axis) -> Result<Self> {
        if document.viewport().along(axis) <= 0.0 {
            return Err(ConfigurationError::ZeroSizedViewport);
        }

        let fraction = move |doc: &Document| {
            let extent = doc.viewport().along(axis);
            match doc.pointer() {
                Some(pointer) if extent > 0.0 => (pointer.along(axis) / extent).clamp(0.0, 1.0),
                _ => 0.0,
            }
        };

        let value = MotionValue::new(fraction(document));
        let sink = value.clone();
        let listener = document.listen(&[EventKind::PointerMove, EventKind::Resize], move |_, doc| {
            sink.set(fraction(doc));
            ControlFlow::Continue(())
        });

        Ok(Self {
            value,
            axis,
            listener: Some(listener),
        })
    }

    /// Tracked axis
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Observable progress
    pub fn value(&self) -> MotionValue<f32> {
        self.value.clone()
    }

    /// Current progress
    pub fn get(&self) -> f32 {
        self.value.get()
    }

    /// Whether the underlying listener is still registered
    pub fn is_active(&self) -> bool {
        self.listener.as_ref().is_some_and(ListenerHandle::is_active)
    }

    /// Release the listener
    pub fn dispose(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            listener.cancel();
        }
    }
}

impl Drop for PointerProgress {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[derive(Debug, Clone, Copy)]
struct Phase {
    start: Duration,
    held: bool,
}

/// Elapsed fraction of a repeating period, sampled every animation frame.
///
/// Rises linearly from 0 towards 1 and wraps back to 0 at each period
/// boundary. Drives the progress bar of an autoplaying slide; pausing holds
/// the value until [`IntervalProgress::resume`].
pub struct IntervalProgress {
    value: MotionValue<f32>,
    period: Duration,
    phase: Arc<Mutex<Phase>>,
    scheduler: Scheduler,
    frame: Option<TimerHandle>,
}

impl IntervalProgress {
    /// Track elapsed time modulo `period`
    pub fn track(scheduler: &Scheduler, period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(ConfigurationError::ZeroPeriod { what: "interval progress period" });
        }

        let value = MotionValue::new(0.0);
        let phase = Arc::new(Mutex::new(Phase {
            start: scheduler.now(),
            held: false,
        }));

        let sink = value.clone();
        let sampled = Arc::clone(&phase);
        let frame = scheduler.on_frame(move |now| {
            let phase = *sampled.lock();
            if phase.held {
                return;
            }
            let elapsed = now.saturating_sub(phase.start);
            let within = elapsed.as_nanos() % period.as_nanos();
            sink.set((within as f64 / period.as_nanos() as f64) as f32);
        });

        Ok(Self {
            value,
            period,
            phase,
            scheduler: scheduler.clone(),
            frame: Some(frame),
        })
    }

    /// Reset the phase so progress restarts from 0 now. A held value stays held.
    pub fn restart(&self) {
        self.phase.lock().start = self.scheduler.now();
        self.value.set(0.0);
    }

    /// Hold the current value; frames no longer advance it
    pub fn pause(&self) {
        self.phase.lock().held = true;
    }

    /// Release a hold and restart from 0 now
    pub fn resume(&self) {
        {
            let mut phase = self.phase.lock();
            phase.start = self.scheduler.now();
            phase.held = false;
        }
        self.value.set(0.0);
    }

    /// Whether the value is held
    pub fn is_paused(&self) -> bool {
        self.phase.lock().held
    }

    /// Period length
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Observable progress
    pub fn value(&self) -> MotionValue<f32> {
        self.value.clone()
    }

    /// Current progress
    pub fn get(&self) -> f32 {
        self.value.get()
    }

    /// Whether the frame callback is still registered
    pub fn is_active(&self) -> bool {
        self.frame.as_ref().is_some_and(TimerHandle::is_active)
    }

    /// Release the frame callback
    pub fn dispose(&mut self) {
        if let Some(mut frame) = self.frame.take() {
            frame.cancel();
        }
    }
}

impl Drop for IntervalProgress {
    fn drop(&mut self) {
        self.dispose();
    }
}
