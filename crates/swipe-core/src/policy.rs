#![forbid(unsafe_code)]

//! Commit decision: does a released gesture delete the row or spring back?
//!
//! Two rules, either of which commits:
//!
//! - **Distance**: `offset <= threshold_offset`, whatever the velocity.
//! - **Fling**: `velocity <= -fling_velocity_threshold` once the row has been
//!   pulled at least to `engagement_offset`. A quick flick commits without
//!   travelling the full distance; a stray fast tap at rest does not.
//!
//! Everything else cancels. The policy is pure and deterministic.

use crate::config::SwipeConfig;

/// Outcome of a released gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Carry through to the dismissed offset and fire the commit callback.
    Commit,
    /// Return to rest.
    Cancel,
}

impl Verdict {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Commit => "commit",
            Verdict::Cancel => "cancel",
        }
    }
}

/// Thresholds for [`decide`](CommitPolicy::decide).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommitPolicy {
    pub threshold_offset: f64,
    pub fling_velocity_threshold: f64,
    pub engagement_offset: f64,
}

impl CommitPolicy {
    #[must_use]
    pub fn new(threshold_offset: f64, fling_velocity_threshold: f64, engagement_offset: f64) -> Self {
        Self {
            threshold_offset,
            fling_velocity_threshold,
            engagement_offset,
        }
    }

    #[must_use]
    pub fn from_config(config: &SwipeConfig) -> Self {
        Self::new(
            config.threshold_offset,
            config.fling_velocity_threshold,
            config.engagement_offset,
        )
    }

    /// Map a release `(offset, velocity)` to a verdict.
    #[must_use]
    pub fn decide(&self, offset: f64, velocity: f64) -> Verdict {
        if offset <= self.threshold_offset {
            return Verdict::Commit;
        }
        let flung = velocity <= -self.fling_velocity_threshold;
        let engaged = offset <= self.engagement_offset;
        if flung && engaged {
            Verdict::Commit
        } else {
            Verdict::Cancel
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
