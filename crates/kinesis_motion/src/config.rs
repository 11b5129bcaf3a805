// SPDX-License-Identifier: MIT OR Apache-2.0
//! Motion configuration stored as RON.
//!
//! Groups the defaults a page uses when it instantiates the primitives:
//! - autoplay period and hover behaviour
//! - reveal threshold and margin
//! - stagger base and per-item delay
//! - spring parameters and scroll thresholds
//! - named range mappings

use crate::autoplay::HoverPolicy;
use crate::error::{ConfigLoadError, ConfigurationError, Result};
use crate::range::{RangeMapper, RangeSpec};
use crate::reveal::RevealOptions;
use crate::scroll_watch::ScrollThresholds;
use crate::spring::Spring;
use crate::stagger::StaggerSchedule;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Autoplay defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoplayConfig {
    /// Advance period in milliseconds
    pub period_ms: u64,
    /// Hover behaviour
    pub hover_policy: HoverPolicy,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            period_ms: 5000,
            hover_policy: HoverPolicy::ResumeOnLeave,
        }
    }
}

impl AutoplayConfig {
    /// Period as a duration
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// Stagger defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaggerConfig {
    /// Delay of the first item in milliseconds
    pub base_ms: u64,
    /// Added delay per item in milliseconds
    pub per_item_ms: u64,
}

impl Default for StaggerConfig {
    fn default() -> Self {
        Self {
            base_ms: 0,
            per_item_ms: 100,
        }
    }
}

impl StaggerConfig {
    /// Linear schedule for `count` items
    pub fn schedule(&self, count: usize) -> StaggerSchedule {
        StaggerSchedule::linear(
            count,
            Duration::from_millis(self.base_ms),
            Duration::from_millis(self.per_item_ms),
        )
    }
}

/// Complete motion configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Carousel autoplay
    pub autoplay: AutoplayConfig,
    /// Reveal triggers
    pub reveal: RevealOptions,
    /// Staggered groups
    pub stagger: StaggerConfig,
    /// Spring followers
    pub spring: Spring,
    /// Scroll flags
    pub scroll: ScrollThresholds,
    /// Named range mappings
    pub ranges: IndexMap<String, RangeSpec>,
}

impl MotionConfig {
    /// Parse and validate a RON string
    pub fn from_ron_str(source: &str) -> std::result::Result<Self, ConfigLoadError> {
        let config: MotionConfig = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a RON file
    pub fn load(path: &Path) -> std::result::Result<Self, ConfigLoadError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&content)?;
        tracing::info!("Loaded motion config from {}", path.display());
        Ok(config)
    }

    /// Pretty RON representation
    pub fn to_ron_string(&self) -> std::result::Result<String, ConfigLoadError> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Write as RON
    pub fn save(&self, path: &Path) -> std::result::Result<(), ConfigLoadError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    /// Check every group and range
    pub fn validate(&self) -> Result<()> {
        if self.autoplay.period_ms == 0 {
            return Err(ConfigurationError::ZeroPeriod { what: "autoplay period" });
        }
        self.reveal.validate()?;
        self.spring.validate()?;
        self.scroll.validate()?;
        for range in self.ranges.values() {
            RangeMapper::try_from(range.clone())?;
        }
        Ok(())
    }

    /// Build the named range mapper
    pub fn range(&self, name: &str) -> Result<RangeMapper> {
        let range = self
            .ranges
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownRange(name.to_string()))?;
        RangeMapper::try_from(range.clone())
    }
}
