#![forbid(unsafe_code)]

//! Swipe configuration: drag bounds, commit thresholds, and spring tuning.
//!
//! [`SwipeConfig`] is plain data with a `Default` sized for a 100 px trash
//! affordance (commit past 80 px, affordance revealed past 20 px). [`SwipeConfig::validate`] rejects values that cannot drive a
//! controller instead of silently clamping them.
//!
//! # Loading
//!
//! With the `config-file` feature, configs load from TOML or JSON:
//!
//! ```toml
//! min_offset = -120.0
//! threshold_offset = -96.0
//! fling_velocity_threshold = 500.0
//!
//! [commit_spring]
//! stiffness = 300.0
//! damping = 34.6
//! mass = 1.0
//! ```
//!
//! Missing fields take their defaults.

#[cfg(feature = "config-file")]
use std::path::Path;

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default affordance width in logical pixels.
pub const DEFAULT_AFFORDANCE_WIDTH: f64 = 100.0;

/// Fraction of `min_offset` past which a release commits by distance.
pub const DEFAULT_THRESHOLD_FRACTION: f64 = 0.8;

/// Default fling velocity (px/s, magnitude) that commits a short flick.
pub const DEFAULT_FLING_VELOCITY: f64 = 600.0;

/// Default offset a fling must pass before velocity alone can commit.
pub const DEFAULT_ENGAGEMENT_OFFSET: f64 = -20.0;

/// Default offset past which the destructive affordance fades in.
pub const DEFAULT_REVEAL_OFFSET: f64 = -20.0;

/// Default settle epsilon as a fraction of the travel range.
pub const DEFAULT_SETTLE_EPSILON: f64 = 1e-2;

// ---------------------------------------------------------------------------
// SpringParams
// ---------------------------------------------------------------------------

/// Stiffness, damping and mass of a settle spring.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct SpringParams {
    /// Restoring force per pixel of displacement.
    pub stiffness: f64,
    /// Drag per px/s of velocity.
    pub damping: f64,
    /// Inertia of the row.
    pub mass: f64,
}

impl SpringParams {
    /// Critically damped parameters for the given stiffness and mass:
    /// `damping = 2·√(stiffness·mass)`.
    #[must_use]
    pub fn critical(stiffness: f64, mass: f64) -> Self {
        Self {
            stiffness,
            damping: 2.0 * (stiffness * mass).sqrt(),
            mass,
        }
    }

    /// Damping ratio ζ. `1.0` is critical, `< 1.0` overshoots.
    #[must_use]
    pub fn damping_ratio(&self) -> f64 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }

    fn validate(&self, spring: &'static str) -> Result<(), ConfigError> {
        for (param, value) in [
            ("stiffness", self.stiffness),
            ("damping", self.damping),
            ("mass", self.mass),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::SpringParam {
                    spring,
                    param,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for SpringParams {
    fn default() -> Self {
        Self::critical(170.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// SwipeConfig
// ---------------------------------------------------------------------------

/// Tunable parameters for one row's swipe interaction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct SwipeConfig {
    /// Drag bound in the dismiss direction (negative).
    pub min_offset: f64,
    /// Releasing at or past this offset commits.
    pub threshold_offset: f64,
    /// Release velocity magnitude (px/s) at which a fling commits.
    pub fling_velocity_threshold: f64,
    /// A fling only commits once the row is at or past this offset.
    pub engagement_offset: f64,
    /// The affordance fades in once the row is past this offset.
    pub reveal_offset: f64,
    /// Spring returning the row to rest.
    pub cancel_spring: SpringParams,
    /// Spring carrying the row through to `min_offset`.
    pub commit_spring: SpringParams,
    /// Spring driving the affordance opacity.
    pub affordance_spring: SpringParams,
    /// Settle completes when displacement and velocity fall to this fraction
    /// of the travel range.
    pub settle_epsilon: f64,
    /// Seed the settle spring with the release velocity when it points
    /// toward the settle target.
    pub carry_release_velocity: bool,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self::with_affordance_width(DEFAULT_AFFORDANCE_WIDTH)
    }
}

impl SwipeConfig {
    /// Defaults derived from an affordance width: `min_offset = -width`,
    /// `threshold_offset = 0.8 · min_offset`.
    #[must_use]
    pub fn with_affordance_width(width: f64) -> Self {
        let min_offset = -width;
        Self {
            min_offset,
            threshold_offset: min_offset * DEFAULT_THRESHOLD_FRACTION,
            fling_velocity_threshold: DEFAULT_FLING_VELOCITY,
            engagement_offset: DEFAULT_ENGAGEMENT_OFFSET.max(min_offset),
            reveal_offset: DEFAULT_REVEAL_OFFSET.max(min_offset),
            cancel_spring: SpringParams::default(),
            commit_spring: SpringParams::default(),
            affordance_spring: SpringParams::default(),
            settle_epsilon: DEFAULT_SETTLE_EPSILON,
            carry_release_velocity: true,
        }
    }

    /// Set the commit distance (builder pattern).
    #[must_use]
    pub fn threshold(mut self, threshold_offset: f64) -> Self {
        self.threshold_offset = threshold_offset;
        self
    }

    /// Set the fling velocity threshold (builder pattern).
    #[must_use]
    pub fn fling_velocity(mut self, threshold: f64) -> Self {
        self.fling_velocity_threshold = threshold;
        self
    }

    /// Use the same spring for cancel and commit settles (builder pattern).
    #[must_use]
    pub fn settle_spring(mut self, params: SpringParams) -> Self {
        self.cancel_spring = params;
        self.commit_spring = params;
        self
    }

    /// Check every parameter, returning the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let min_offset = self.min_offset;
        if !min_offset.is_finite() || min_offset >= 0.0 {
            return Err(ConfigError::MinOffset { value: min_offset });
        }

        let in_range = |v: f64| v.is_finite() && (min_offset..=0.0).contains(&v);
        if !in_range(self.threshold_offset) {
            return Err(ConfigError::ThresholdOutOfRange {
                value: self.threshold_offset,
                min_offset,
            });
        }
        if !in_range(self.engagement_offset) {
            return Err(ConfigError::EngagementOutOfRange {
                value: self.engagement_offset,
                min_offset,
            });
        }
        if !in_range(self.reveal_offset) {
            return Err(ConfigError::RevealOutOfRange {
                value: self.reveal_offset,
                min_offset,
            });
        }

        let fling = self.fling_velocity_threshold;
        if !fling.is_finite() || fling <= 0.0 {
            return Err(ConfigError::FlingVelocity { value: fling });
        }

        self.cancel_spring.validate("cancel")?;
        self.commit_spring.validate("commit")?;
        self.affordance_spring.validate("affordance")?;

        let eps = self.settle_epsilon;
        if !(eps > 0.0 && eps < 1.0) {
            return Err(ConfigError::SettleEpsilon { value: eps });
        }
        Ok(())
    }

    /// Load from a TOML string and validate.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file on disk and validate.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string and validate.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file on disk and validate.
    #[cfg(feature = "config-file")]
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Serialize to a TOML string.
    #[cfg(feature = "config-file")]
    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
