// SPDX-License-Identifier: MIT OR Apache-2.0
//! Real-time frame driver.
//!
//! Advances a [`Scheduler`] by the wall-clock time elapsed between frames on
//! a tokio task. Stopping or dropping the driver aborts the task, after which
//! the scheduler's clock no longer moves on its own.

use crate::error::{ConfigurationError, Result};
use crate::host::scheduler::Scheduler;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Roughly 60 frames per second
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Owned handle to a running frame loop
#[must_use = "dropping a FrameDriver stops the frame loop"]
pub struct FrameDriver {
    task: Option<JoinHandle<()>>,
    frame_interval: Duration,
}

impl FrameDriver {
    /// Spawn a frame loop on the current tokio runtime
    pub fn spawn(scheduler: Scheduler, frame_interval: Duration) -> Result<Self> {
        if frame_interval.is_zero() {
            return Err(ConfigurationError::ZeroPeriod { what: "frame interval" });
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| ConfigurationError::NoAsyncRuntime)?;

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(frame_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last = Instant::now();

            loop {
                ticker.tick().await;
                let now = Instant::now();
                scheduler.advance(now - last);
                last = now;
            }
        });

        tracing::debug!(?frame_interval, "Frame driver started");
        Ok(Self {
            task: Some(task),
            frame_interval,
        })
    }

    /// Interval between frames
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Abort the frame loop. Calling this more than once is harmless.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Frame driver stopped");
        }
    }

    /// Whether the loop is still running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for FrameDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
