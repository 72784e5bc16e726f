#![forbid(unsafe_code)]

//! Spring-smoothed opacity for the destructive affordance behind a row.
//!
//! The affordance fades in once the row has been pulled past
//! `reveal_offset` and fades out when it moves back. The fade runs on its
//! own spring so it never pops when the pointer jitters around the
//! threshold.

use std::time::Duration;

use super::spring::Spring;
use crate::config::SwipeConfig;

const OPACITY_REST: f64 = 1e-3;
const OPACITY_VELOCITY_REST: f64 = 1e-2;

#[derive(Debug, Clone)]
pub struct AffordanceFade {
    spring: Spring,
    reveal_offset: f64,
}

impl AffordanceFade {
    #[must_use]
    pub fn new(config: &SwipeConfig) -> Self {
        Self {
            spring: Spring::resting(0.0, config.affordance_spring)
                .with_rest_threshold(OPACITY_REST)
                .with_velocity_threshold(OPACITY_VELOCITY_REST),
            reveal_offset: config.reveal_offset,
        }
    }

    /// Point the fade at 1 or 0 depending on where the row is.
    pub fn track(&mut self, offset: f64) {
        let target = if offset < self.reveal_offset { 1.0 } else { 0.0 };
        self.spring.set_target(target);
    }

    pub fn advance(&mut self, dt: Duration) {
        self.spring.advance(dt);
    }

    /// Current opacity in `[0, 1]`.
    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.spring.position().clamp(0.0, 1.0)
    }

    /// Whether the fade still needs ticks.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        !self.spring.is_at_rest()
    }
}
