// SPDX-License-Identifier: MIT OR Apache-2.0
//! Range mapping from progress to visual property values.
//!
//! A [`RangeMapper`] pairs non-decreasing domain breakpoints with one output
//! value each. Numeric and colour outputs interpolate between the two
//! bracketing breakpoints; discrete outputs step. Outside the domain the
//! nearest boundary output is returned, never an extrapolation.

use crate::error::{ensure_finite, ConfigurationError, Result};
use crate::keyframe::{Color, Easing, Interpolation, KeyframeValue, Keyframes};
use crate::motion_value::{DerivedValue, MotionValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum Outputs {
    Numeric(Vec<f32>),
    Color(Vec<[f32; 4]>),
    Discrete(Vec<String>),
}

/// Validated, immutable mapping from a progress value to an output value
#[derive(Debug, Clone, PartialEq)]
pub struct RangeMapper {
    breakpoints: Vec<f32>,
    outputs: Outputs,
    easing: Easing,
}

impl RangeMapper {
    /// Build a mapper, rejecting empty, mismatched or unordered input
    pub fn new(breakpoints: impl Into<Vec<f32>>, values: Keyframes) -> Result<Self> {
        let breakpoints = breakpoints.into();

        if breakpoints.is_empty() || values.is_empty() {
            return Err(ConfigurationError::EmptyKeyframes);
        }
        if breakpoints.len() != values.len() {
            return Err(ConfigurationError::LengthMismatch {
                breakpoints: breakpoints.len(),
                values: values.len(),
            });
        }
        for value in &breakpoints {
            ensure_finite("breakpoint", *value)?;
        }
        if let Some(index) = breakpoints.windows(2).position(|pair| pair[1] < pair[0]) {
            return Err(ConfigurationError::UnorderedBreakpoints {
                index: index + 1,
                value: breakpoints[index + 1],
            });
        }

        let outputs = match values {
            Keyframes::Numeric(values) => {
                for value in &values {
                    ensure_finite("keyframe value", *value)?;
                }
                Outputs::Numeric(values)
            }
            Keyframes::Color(colors) => {
                let resolved: Vec<[f32; 4]> = colors.iter().map(Color::to_rgba).collect();
                for channel in resolved.iter().flatten() {
                    ensure_finite("colour channel", *channel)?;
                }
                Outputs::Color(resolved)
            }
            Keyframes::Discrete(values) => Outputs::Discrete(values),
        };

        Ok(Self {
            breakpoints,
            outputs,
            easing: Easing::Linear,
        })
    }

    /// Shorthand for a numeric mapping
    pub fn numeric(breakpoints: impl Into<Vec<f32>>, values: impl Into<Vec<f32>>) -> Result<Self> {
        Self::new(breakpoints, Keyframes::Numeric(values.into()))
    }

    /// Apply an easing curve within each segment
    pub fn with_easing(mut self, easing: Easing) -> Result<Self> {
        easing.validate()?;
        self.easing = easing;
        Ok(self)
    }

    /// Domain breakpoints
    pub fn breakpoints(&self) -> &[f32] {
        &self.breakpoints
    }

    /// Lowest and highest breakpoint
    pub fn domain(&self) -> (f32, f32) {
        let first = self.breakpoints[0];
        let last = self.breakpoints[self.breakpoints.len() - 1];
        (first, last)
    }

    /// Map a progress value. Pure: equal inputs give equal outputs.
    pub fn map(&self, progress: f32) -> KeyframeValue {
        match &self.outputs {
            Outputs::Numeric(values) => {
                let (a, b, t) = self.segment(progress);
                KeyframeValue::Numeric(Interpolation::lerp(values[a], values[b], t))
            }
            Outputs::Color(values) => {
                let (a, b, t) = self.segment(progress);
                KeyframeValue::Color(Interpolation::lerp_rgba(values[a], values[b], t))
            }
            Outputs::Discrete(values) => KeyframeValue::Discrete(values[self.step(progress)].clone()),
        }
    }

    /// Map to a number; `None` if the outputs are not numeric
    pub fn map_numeric(&self, progress: f32) -> Option<f32> {
        match &self.outputs {
            Outputs::Numeric(values) => {
                let (a, b, t) = self.segment(progress);
                Some(Interpolation::lerp(values[a], values[b], t))
            }
            _ => None,
        }
    }

    /// Bracketing indices and eased local fraction
    fn segment(&self, progress: f32) -> (usize, usize, f32) {
        let last = self.breakpoints.len() - 1;
        if progress.is_nan() || progress <= self.breakpoints[0] {
            return (0, 0, 0.0);
        }
        if progress >= self.breakpoints[last] {
            return (last, last, 0.0);
        }

        // breakpoints[i - 1] <= progress < breakpoints[i]
        let i = self.breakpoints.partition_point(|b| *b <= progress);
        let (lo, hi) = (self.breakpoints[i - 1], self.breakpoints[i]);
        let t = self.easing.apply((progress - lo) / (hi - lo));
        (i - 1, i, t)
    }

    /// Index of the highest breakpoint at or below `progress`
    fn step(&self, progress: f32) -> usize {
        if progress.is_nan() {
            return 0;
        }
        self.breakpoints
            .partition_point(|b| *b <= progress)
            .saturating_sub(1)
    }

    /// Follow a progress source, producing mapped values
    pub fn drive(self, source: &MotionValue<f32>) -> DerivedValue<KeyframeValue> {
        let mapper = Arc::new(self);
        source.derive(move |progress| mapper.map(*progress))
    }
}

/// Map a single progress value through breakpoints and outputs.
///
/// Validates on every call; build a [`RangeMapper`] once for per-frame use.
pub fn map(progress: f32, breakpoints: &[f32], values: Keyframes) -> Result<KeyframeValue> {
    Ok(RangeMapper::new(breakpoints.to_vec(), values)?.map(progress))
}

/// Numeric shorthand for [`map`]
pub fn map_numeric(progress: f32, breakpoints: &[f32], values: &[f32]) -> Result<f32> {
    let mapper = RangeMapper::numeric(breakpoints.to_vec(), values.to_vec())?;
    Ok(mapper.map_numeric(progress).unwrap_or_default())
}

/// Serializable description of a [`RangeMapper`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSpec {
    /// Domain breakpoints
    pub breakpoints: Vec<f32>,
    /// Output values
    pub values: Keyframes,
    /// Per-segment easing
    #[serde(default)]
    pub easing: Easing,
}

impl TryFrom<RangeSpec> for RangeMapper {
    type Error = ConfigurationError;

    fn try_from(range: RangeSpec) -> Result<Self> {
        RangeMapper::new(range.breakpoints, range.values)?.with_easing(range.easing)
    }
}

/// Split `[0, 1]` into `count` consecutive equal windows.
///
/// Each word of a paragraph fades in over its own window as the paragraph
/// scrolls through the viewport.
pub fn word_windows(count: usize) -> Result<Vec<(f32, f32)>> {
    if count == 0 {
        return Err(ConfigurationError::ZeroCount { what: "word count" });
    }
    let n = count as f32;
    Ok((0..count)
        .map(|i| {
            let start = i as f32 / n;
            (start, start + 1.0 / n)
        })
        .collect())
}
