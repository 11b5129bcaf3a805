// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scroll-linked animation and carousel coordination.
//!
//! This crate provides the motion primitives page components share:
//! - Progress sources (scroll, pointer, elapsed time)
//! - Range mapping from progress to numbers, colours and discrete values
//! - Autoplay sequencing for carousels with pause, select and hover
//! - One-shot reveal triggers
//! - Staggered group entrances
//! - Spring smoothing and animated counters
//!
//! ## Architecture
//!
//! The primitives are built on:
//! - A deterministic host model ([`host::Scheduler`], [`host::Document`])
//! - Observable [`MotionValue`]s with handle-based subscriptions
//! - Owned registrations that are released on `dispose()` or drop
//! - RON configuration for shared defaults

pub mod autoplay;
pub mod config;
pub mod counter;
pub mod error;
pub mod host;
pub mod keyframe;
pub mod motion_value;
mod observer;
pub mod progress;
pub mod range;
pub mod reveal;
pub mod scroll_watch;
pub mod spring;
pub mod stagger;

pub use autoplay::{AutoplaySequencer, ChangeCause, HoverPolicy, IndexChange, SequencerId, SequencerState};
pub use config::{AutoplayConfig, MotionConfig, StaggerConfig};
pub use counter::{format_compact, Counter};
pub use error::{ConfigLoadError, ConfigurationError, Result};
pub use keyframe::{Color, Easing, Interpolation, KeyframeValue, Keyframes};
pub use motion_value::{DerivedValue, MotionValue};
pub use observer::Subscription;
pub use progress::{scroll_progress, IntervalProgress, PointerProgress, ScrollOffset, ScrollProgress};
pub use range::{word_windows, RangeMapper, RangeSpec};
pub use reveal::{visible_fraction, Margin, RevealOptions, RevealState, RevealTrigger};
pub use scroll_watch::{ScrollFlags, ScrollThresholds, ScrollWatcher};
pub use spring::{Spring, SpringFollower, SpringValue};
pub use stagger::{schedule, StaggerSchedule, StaggeredReveal};
