#![forbid(unsafe_code)]

//! Raw pointer samples delivered by the host input layer.

use web_time::Instant;

/// One pointer sample for a row's active gesture.
///
/// `translation` is measured from the pointer-down point of the current
/// gesture, so it is independent of where the row was resting when the
/// gesture began. Velocity is in px/s, negative in the dismiss direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSample {
    pub translation: f64,
    pub velocity: f64,
    pub timestamp: Instant,
}

impl GestureSample {
    #[must_use]
    pub fn new(translation: f64, velocity: f64, timestamp: Instant) -> Self {
        Self {
            translation,
            velocity,
            timestamp,
        }
    }

    /// Whether translation and velocity are usable numbers.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.velocity.is_finite()
    }
}
