// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scroll-position flags for sticky headers and back-to-top buttons.

use crate::error::{ensure_finite, Result};
use crate::host::{Document, EventKind, HostEvent, ListenerHandle};
use crate::motion_value::MotionValue;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::Arc;

/// Scroll offsets (pixels) at which each flag switches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollThresholds {
    /// Past this the header is drawn in its scrolled style
    pub scrolled: f32,
    /// Past this, scrolling down hides the header
    pub hide_after: f32,
    /// Past this the back-to-top button shows
    pub back_to_top: f32,
}

impl Default for ScrollThresholds {
    fn default() -> Self {
        Self {
            scrolled: 20.0,
            hide_after: 100.0,
            back_to_top: 300.0,
        }
    }
}

impl ScrollThresholds {
    /// Reject non-finite thresholds
    pub fn validate(&self) -> Result<()> {
        ensure_finite("scrolled threshold", self.scrolled)?;
        ensure_finite("hide threshold", self.hide_after)?;
        ensure_finite("back-to-top threshold", self.back_to_top)
    }
}

/// Derived scroll flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollFlags {
    /// Page is scrolled past the top
    pub scrolled: bool,
    /// Header should hide (scrolling down past `hide_after`)
    pub hidden: bool,
    /// Back-to-top button should show
    pub show_back_to_top: bool,
}

impl ScrollFlags {
    /// Flags for a move from `previous` to `latest`
    pub fn compute(latest: f32, previous: f32, thresholds: &ScrollThresholds) -> Self {
        Self {
            scrolled: latest > thresholds.scrolled,
            hidden: latest > thresholds.hide_after && latest > previous,
            show_back_to_top: latest > thresholds.back_to_top,
        }
    }
}

/// Publishes [`ScrollFlags`] on every vertical scroll
pub struct ScrollWatcher {
    flags: MotionValue<ScrollFlags>,
    listener: Option<ListenerHandle>,
}

impl ScrollWatcher {
    /// Watch a document's scroll offset
    pub fn watch(document: &Document, thresholds: ScrollThresholds) -> Result<Self> {
        thresholds.validate()?;

        let y = document.scroll().y;
        let flags = MotionValue::new(ScrollFlags::compute(y, y, &thresholds));
        let sink = flags.clone();
        let previous = Arc::new(Mutex::new(y));

        let listener = document.listen(&[EventKind::Scroll], move |event, _| {
            if let HostEvent::Scroll(position) = event {
                let last = std::mem::replace(&mut *previous.lock(), position.y);
                if last != position.y {
                    sink.set(ScrollFlags::compute(position.y, last, &thresholds));
                }
            }
            ControlFlow::Continue(())
        });

        Ok(Self {
            flags,
            listener: Some(listener),
        })
    }

    /// Observable flags
    pub fn flags(&self) -> MotionValue<ScrollFlags> {
        self.flags.clone()
    }

    /// Current flags
    pub fn get(&self) -> ScrollFlags {
        self.flags.get()
    }

    /// Stop watching
    pub fn dispose(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            listener.cancel();
        }
    }
}

impl Drop for ScrollWatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for ScrollWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollWatcher").field("flags", &self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Size;

    fn document() -> Document {
        let document = Document::new(Size::new(1000.0, 800.0));
        document.set_height(4000.0);
        document
    }

    #[test]
    fn test_compute_flags() {
        let t = ScrollThresholds::default();
        assert_eq!(ScrollFlags::compute(0.0, 0.0, &t), ScrollFlags::default());
        assert!(ScrollFlags::compute(21.0, 0.0, &t).scrolled);
        assert!(!ScrollFlags::compute(21.0, 0.0, &t).hidden);
        assert!(ScrollFlags::compute(150.0, 120.0, &t).hidden);
        assert!(!ScrollFlags::compute(150.0, 200.0, &t).hidden);
        assert!(ScrollFlags::compute(301.0, 400.0, &t).show_back_to_top);
    }

    #[test]
    fn test_header_hides_down_shows_up() {
        let document = document();
        let watcher = ScrollWatcher::watch(&document, ScrollThresholds::default()).unwrap();

        document.scroll_to(0.0, 50.0);
        assert_eq!(
            watcher.get(),
            ScrollFlags {
                scrolled: true,
                hidden: false,
                show_back_to_top: false,
            }
        );

        document.scroll_to(0.0, 500.0);
        assert!(watcher.get().hidden);
        assert!(watcher.get().show_back_to_top);

        document.scroll_to(0.0, 450.0);
        assert!(!watcher.get().hidden);
        assert!(watcher.get().scrolled);
    }

    #[test]
    fn test_custom_thresholds_and_dispose() {
        let document = document();
        let thresholds = ScrollThresholds {
            scrolled: 0.0,
            hide_after: 1000.0,
            back_to_top: 2000.0,
        };
        let mut watcher = ScrollWatcher::watch(&document, thresholds).unwrap();

        document.scroll_to(0.0, 900.0);
        assert!(watcher.get().scrolled && !watcher.get().hidden);

        watcher.dispose();
        document.scroll_to(0.0, 2500.0);
        assert!(!watcher.get().show_back_to_top);
        assert_eq!(document.live_listeners(), 0);
    }
}
