// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types.
//!
//! Every invalid parameter is reported synchronously as a
//! [`ConfigurationError`] at setup time. There are no recoverable runtime
//! failures in the motion primitives themselves; only loading a config file
//! from disk can fail for environmental reasons ([`ConfigLoadError`]).

use thiserror::Error;

/// Invalid or structurally inconsistent parameters supplied by a caller
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// A count that must be positive was zero
    #[error("{what} must be greater than zero")]
    ZeroCount {
        /// Name of the offending parameter
        what: &'static str,
    },

    /// A period or frame interval of zero length
    #[error("{what} must be a non-zero duration")]
    ZeroPeriod {
        /// Name of the offending parameter
        what: &'static str,
    },

    /// No keyframes were given
    #[error("keyframe list is empty")]
    EmptyKeyframes,

    /// Breakpoint and value lists differ in length
    #[error("{breakpoints} breakpoints but {values} output values")]
    LengthMismatch {
        /// Number of domain breakpoints
        breakpoints: usize,
        /// Number of output values
        values: usize,
    },

    /// Breakpoints are not non-decreasing
    #[error("breakpoint {index} ({value}) is smaller than the one before it")]
    UnorderedBreakpoints {
        /// Index of the first out-of-order breakpoint
        index: usize,
        /// Its value
        value: f32,
    },

    /// A NaN or infinite number where a finite one is required
    #[error("{what} must be finite, got {value}")]
    NonFinite {
        /// Name of the offending parameter
        what: &'static str,
        /// The rejected value
        value: f32,
    },

    /// A fraction outside `[0, 1]`
    #[error("{what} must lie in [0, 1], got {value}")]
    FractionOutOfRange {
        /// Name of the offending parameter
        what: &'static str,
        /// The rejected value
        value: f32,
    },

    /// Tracked element has zero width or height
    #[error("element has zero-sized bounds ({width}x{height})")]
    ZeroSizedElement {
        /// Element width
        width: f32,
        /// Element height
        height: f32,
    },

    /// Viewport has zero extent along the tracked axis
    #[error("viewport has zero extent along the tracked axis")]
    ZeroSizedViewport,

    /// Element id is not part of the document
    #[error("element is not attached to the document")]
    UnknownElement,

    /// Selected index is outside the sequence
    #[error("index {index} is out of range for a sequence of {len} items")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Sequence length
        len: usize,
    },

    /// `start` called on a sequencer that is already running or paused
    #[error("sequencer is already started")]
    AlreadyStarted,

    /// Operation needs a started sequencer
    #[error("sequencer has not been started")]
    NotStarted,

    /// Colour string could not be parsed
    #[error("invalid colour: {0}")]
    InvalidColor(String),

    /// Cubic-bezier control points produce a non-monotonic time curve
    #[error("cubic-bezier x control points must lie in [0, 1]")]
    InvalidEasing,

    /// Spring parameters are not physical
    #[error("spring {what} must be positive, got {value}")]
    InvalidSpring {
        /// Name of the offending parameter
        what: &'static str,
        /// The rejected value
        value: f32,
    },

    /// Async driver spawned outside a tokio runtime
    #[error("frame driver requires a running tokio runtime")]
    NoAsyncRuntime,

    /// Named range missing from configuration
    #[error("no range named `{0}` in configuration")]
    UnknownRange(String),
}

/// Result type for motion primitives
pub type Result<T> = std::result::Result<T, ConfigurationError>;

/// Errors raised while loading a [`crate::config::MotionConfig`]
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// Reading the file failed
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid RON for the config schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The config could not be written as RON
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),

    /// The file parsed but holds invalid values
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigurationError),
}

/// Reject NaN and infinities
pub(crate) fn ensure_finite(what: &'static str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::NonFinite { what, value })
    }
}

/// Reject values outside `[0, 1]` (and NaN)
pub(crate) fn ensure_fraction(what: &'static str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigurationError::FractionOutOfRange { what, value })
    }
}
