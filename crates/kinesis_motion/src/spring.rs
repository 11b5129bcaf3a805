// SPDX-License-Identifier: MIT OR Apache-2.0
//! Damped spring smoothing.
//!
//! [`SpringValue`] integrates a mass on a damped spring towards a target with
//! semi-implicit Euler steps of at most 1/240 s. [`SpringFollower`] runs one
//! per animation frame so a value eases after a [`MotionValue`] source.

use crate::error::{ConfigurationError, Result};
use crate::host::{Scheduler, TimerHandle};
use crate::motion_value::MotionValue;
use crate::observer::Subscription;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const MAX_STEP: f64 = 1.0 / 240.0;
const REST_DELTA: f64 = 0.01;
const REST_SPEED: f64 = 0.01;

/// Spring parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spring {
    /// Pull towards the target
    pub stiffness: f32,
    /// Velocity drag
    pub damping: f32,
    /// Inertia
    pub mass: f32,
}

impl Default for Spring {
    fn default() -> Self {
        Self {
            stiffness: 100.0,
            damping: 10.0,
            mass: 1.0,
        }
    }
}

impl Spring {
    /// Create validated spring parameters
    pub fn new(stiffness: f32, damping: f32, mass: f32) -> Result<Self> {
        let spring = Self {
            stiffness,
            damping,
            mass,
        };
        spring.validate()?;
        Ok(spring)
    }

    /// Overdamped counter spring (no overshoot)
    pub fn counter() -> Self {
        Self {
            stiffness: 50.0,
            damping: 20.0,
            mass: 1.0,
        }
    }

    /// Snappy pointer-follow spring
    pub fn cursor() -> Self {
        Self {
            stiffness: 300.0,
            damping: 20.0,
            mass: 0.5,
        }
    }

    /// Reject non-positive or non-finite parameters
    pub fn validate(&self) -> Result<()> {
        for (what, value) in [
            ("stiffness", self.stiffness),
            ("damping", self.damping),
            ("mass", self.mass),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigurationError::InvalidSpring { what, value });
            }
        }
        Ok(())
    }
}

/// Position and velocity of a spring-driven value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringValue {
    spring: Spring,
    /// f64 integration state
    position: f64,
    velocity: f64,
    target: f64,
}

impl SpringValue {
    /// A value at rest at `initial`
    pub fn new(spring: Spring, initial: f32) -> Self {
        let initial = f64::from(initial);
        Self {
            spring,
            position: initial,
            velocity: 0.0,
            target: initial,
        }
    }

    /// Current position
    pub fn position(&self) -> f32 {
        self.position as f32
    }

    /// Current velocity (units per second)
    pub fn velocity(&self) -> f32 {
        self.velocity as f32
    }

    /// Target position
    pub fn target(&self) -> f32 {
        self.target as f32
    }

    /// Move the target; the value keeps its velocity
    pub fn set_target(&mut self, target: f32) {
        self.target = f64::from(target);
    }

    /// Teleport to `position` and stop
    pub fn jump(&mut self, position: f32) {
        self.position = f64::from(position);
        self.target = self.position;
        self.velocity = 0.0;
    }

    /// Whether the value has settled on its target
    pub fn is_at_rest(&self) -> bool {
        self.position == self.target && self.velocity == 0.0
    }

    /// Integrate over `dt` and return the new position
    pub fn step(&mut self, dt: Duration) -> f32 {
        if self.is_at_rest() {
            return self.position();
        }

        let stiffness = f64::from(self.spring.stiffness);
        let damping = f64::from(self.spring.damping);
        let mass = f64::from(self.spring.mass);

        let mut remaining = dt.as_secs_f64();
        while remaining > 0.0 {
            let h = remaining.min(MAX_STEP);
            let force = -stiffness * (self.position - self.target) - damping * self.velocity;
            self.velocity += force / mass * h;
            self.position += self.velocity * h;
            remaining -= h;
        }

        if (self.position - self.target).abs() < REST_DELTA && self.velocity.abs() < REST_SPEED {
            self.position = self.target;
            self.velocity = 0.0;
        }
        self.position()
    }
}

/// Frame-driven spring that follows a source value
pub struct SpringFollower {
    output: MotionValue<f32>,
    state: Arc<Mutex<SpringValue>>,
    _source: Subscription,
    frame: Option<TimerHandle>,
}

impl SpringFollower {
    /// Follow `source` with `spring`, starting at rest at its current value
    pub fn follow(scheduler: &Scheduler, source: &MotionValue<f32>, spring: Spring) -> Result<Self> {
        spring.validate()?;

        let initial = source.get();
        let output = MotionValue::new(initial);
        let state = Arc::new(Mutex::new(SpringValue::new(spring, initial)));

        let target = Arc::clone(&state);
        let source_subscription = source.on_change(move |value| target.lock().set_target(*value));

        let sink = output.clone();
        let stepper = Arc::clone(&state);
        let mut last = scheduler.now();
        let frame = scheduler.on_frame(move |now| {
            let dt = now.saturating_sub(last);
            last = now;
            let position = stepper.lock().step(dt);
            sink.set(position);
        });

        Ok(Self {
            output,
            state,
            _source: source_subscription,
            frame: Some(frame),
        })
    }

    /// Smoothed output
    pub fn value(&self) -> MotionValue<f32> {
        self.output.clone()
    }

    /// Current smoothed position
    pub fn get(&self) -> f32 {
        self.output.get()
    }

    /// Whether the spring has settled on the source value
    pub fn is_at_rest(&self) -> bool {
        self.state.lock().is_at_rest()
    }

    /// Stop stepping; the output keeps its last value
    pub fn dispose(&mut self) {
        if let Some(mut frame) = self.frame.take() {
            frame.cancel();
        }
    }
}

impl Drop for SpringFollower {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for SpringFollower {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpringFollower")
            .field("state", &*self.state.lock())
            .finish()
    }
}
