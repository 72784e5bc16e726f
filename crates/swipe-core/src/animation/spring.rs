#![forbid(unsafe_code)]

//! Damped harmonic oscillator with mass.
//!
//! Models the row as a mass on a spring anchored at the target offset:
//!
//!   m·a = -stiffness × (position - target) - damping × velocity
//!
//! # Parameters
//!
//! - **stiffness** (k): restoring force per pixel of displacement.
//! - **damping** (c): drag per px/s. `c = 2√(k·m)` is critical damping,
//!   the fastest approach that never crosses the target from rest.
//! - **mass** (m): inertia. Heavier rows respond more slowly to the same k.
//!
//! # Integration
//!
//! Semi-implicit Euler, time-based. [`advance`](Spring::advance) takes the
//! elapsed `Duration` and subdivides it into steps of at most 4 ms, so the
//! trajectory depends on elapsed time rather than on how often the host
//! ticks.
//!
//! # Invariants
//!
//! 1. A spring at rest stays put until [`set_target`](Spring::set_target)
//!    wakes it.
//! 2. On coming to rest the position snaps exactly to the target and the
//!    velocity to 0.
//! 3. Stiffness and mass are kept strictly positive; damping non-negative.
//!    (Callers validate parameters up front; this only guards the integrator.)

use std::time::Duration;

use crate::config::SpringParams;

/// Maximum integration step in seconds.
const MAX_STEP_SECS: f64 = 0.004;

const DEFAULT_REST_THRESHOLD: f64 = 0.001;
const DEFAULT_VELOCITY_THRESHOLD: f64 = 0.01;

/// Floor for stiffness and mass so the integrator never divides by zero.
const MIN_POSITIVE: f64 = 1e-6;

/// A spring moving a scalar position toward a target.
#[derive(Debug, Clone)]
pub struct Spring {
    position: f64,
    velocity: f64,
    target: f64,
    stiffness: f64,
    damping: f64,
    mass: f64,
    rest_threshold: f64,
    velocity_threshold: f64,
    at_rest: bool,
}

impl Spring {
    /// Spring at `initial`, heading for `target`, critically damped with
    /// k = 170 and m = 1.
    #[must_use]
    pub fn new(initial: f64, target: f64) -> Self {
        Self::with_params(initial, target, SpringParams::default())
    }

    #[must_use]
    pub fn with_params(initial: f64, target: f64, params: SpringParams) -> Self {
        Self {
            position: initial,
            velocity: 0.0,
            target,
            stiffness: params.stiffness.max(MIN_POSITIVE),
            damping: params.damping.max(0.0),
            mass: params.mass.max(MIN_POSITIVE),
            rest_threshold: DEFAULT_REST_THRESHOLD,
            velocity_threshold: DEFAULT_VELOCITY_THRESHOLD,
            at_rest: false,
        }
    }

    /// Spring already resting at `position`.
    #[must_use]
    pub fn resting(position: f64, params: SpringParams) -> Self {
        let mut spring = Self::with_params(position, position, params);
        spring.at_rest = true;
        spring
    }

    /// Start with the given velocity (builder pattern).
    #[must_use]
    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = if velocity.is_finite() { velocity } else { 0.0 };
        self
    }

    /// Position tolerance for coming to rest (builder pattern).
    #[must_use]
    pub fn with_rest_threshold(mut self, threshold: f64) -> Self {
        self.rest_threshold = threshold.abs();
        self
    }

    /// Velocity tolerance for coming to rest (builder pattern).
    #[must_use]
    pub fn with_velocity_threshold(mut self, threshold: f64) -> Self {
        self.velocity_threshold = threshold.abs();
        self
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.at_rest
    }

    /// Critical damping coefficient `2√(k·m)` for this spring.
    #[must_use]
    pub fn critical_damping(&self) -> f64 {
        2.0 * (self.stiffness * self.mass).sqrt()
    }

    /// Retarget. Wakes the spring if the target actually moved.
    pub fn set_target(&mut self, target: f64) {
        if (self.target - target).abs() > self.rest_threshold {
            self.target = target;
            self.at_rest = false;
        }
    }

    fn step(&mut self, dt: f64) {
        let displacement = self.position - self.target;
        let force = -self.stiffness * displacement - self.damping * self.velocity;
        let acceleration = force / self.mass;

        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
    }

    /// Advance by `dt`, subdividing into small steps. No-op at rest or for a
    /// zero duration.
    pub fn advance(&mut self, dt: Duration) {
        if self.at_rest {
            return;
        }
        let total = dt.as_secs_f64();
        if total <= 0.0 {
            return;
        }

        let mut remaining = total;
        while remaining > 0.0 {
            let h = remaining.min(MAX_STEP_SECS);
            self.step(h);
            remaining -= h;
        }

        let settled = (self.position - self.target).abs() <= self.rest_threshold
            && self.velocity.abs() <= self.velocity_threshold;
        if settled {
            self.position = self.target;
            self.velocity = 0.0;
            self.at_rest = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
