// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host environment primitives.
//!
//! The motion primitives never touch a real browser or windowing system.
//! They consume three host capabilities, modelled here so that every
//! registration is an owned handle and teardown can be observed:
//! - [`Scheduler`]: monotonic clock, repeating/one-shot timers and
//!   animation-frame callbacks
//! - [`Document`]: viewport, scroll offset, pointer and element layout with
//!   change listeners
//! - [`FrameDriver`]: a tokio task advancing a scheduler in real time

pub mod document;
pub mod driver;
pub mod geometry;
pub mod scheduler;

pub use document::{Document, ElementId, EventKind, HostEvent, ListenerHandle, ListenerId};
pub use driver::FrameDriver;
pub use geometry::{Axis, Point, Rect, Size};
pub use scheduler::{Scheduler, TimerHandle, TimerId};
