#![forbid(unsafe_code)]

//! Gesture tracking: maps raw pointer samples onto a bounded row offset.
//!
//! [`GestureTracker`] records where the row was when the gesture began and
//! adds each sample's translation to that origin, so a gesture that starts
//! while the row is already displaced (e.g. interrupting a settle) continues
//! from there instead of jumping back to 0.
//!
//! # Invariants
//!
//! 1. The offset written by [`on_gesture_update`](GestureTracker::on_gesture_update)
//!    is always within `[min_offset, 0]`, even transiently.
//! 2. Samples are only applied while the row is `Dragging`; anything else is
//!    dropped, never queued.
//! 3. A sample older than the last accepted one is dropped.
//! 4. [`on_gesture_end`](GestureTracker::on_gesture_end) does not change the
//!    phase; the controller decides what comes next.

use web_time::Instant;

use crate::sample::GestureSample;
use crate::state::{Phase, RowInteractionState};

/// Offset and velocity at the moment the pointer lifted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    pub offset: f64,
    pub velocity: f64,
}

/// Result of feeding one sample to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDisposition {
    /// The offset was updated.
    Applied,
    /// The row is not dragging; the sample was dropped.
    NotDragging,
    /// The sample predates the last accepted one.
    OutOfOrder,
    /// Translation or velocity was NaN or infinite.
    NonFinite,
}

/// Per-row gesture tracker.
#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    last_velocity: f64,
    last_timestamp: Option<Instant>,
}

impl GestureTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a gesture from the row's current offset.
    pub fn on_gesture_start(&mut self, state: &mut RowInteractionState) {
        state.set_gesture_origin(state.offset());
        state.set_phase(Phase::Dragging);
        self.last_velocity = 0.0;
        self.last_timestamp = None;
    }

    /// Apply a sample: `offset = clamp(gesture_origin + translation)`.
    pub fn on_gesture_update(
        &mut self,
        state: &mut RowInteractionState,
        sample: &GestureSample,
    ) -> SampleDisposition {
        if state.phase() != Phase::Dragging {
            return SampleDisposition::NotDragging;
        }
        if !sample.is_finite() {
            return SampleDisposition::NonFinite;
        }
        if self
            .last_timestamp
            .is_some_and(|last| sample.timestamp < last)
        {
            return SampleDisposition::OutOfOrder;
        }

        state.set_offset(state.gesture_origin() + sample.translation);
        self.last_velocity = sample.velocity;
        self.last_timestamp = Some(sample.timestamp);
        SampleDisposition::Applied
    }

    /// Last known offset and velocity. Leaves the phase untouched.
    #[must_use]
    pub fn on_gesture_end(&self, state: &RowInteractionState) -> Release {
        Release {
            offset: state.offset(),
            velocity: self.last_velocity,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const MIN: f64 = -100.0;

    fn sample(translation: f64, velocity: f64, t: Instant) -> GestureSample {
        GestureSample::new(translation, velocity, t)
    }

    fn dragging() -> (GestureTracker, RowInteractionState) {
        let mut tracker = GestureTracker::new();
        let mut state = RowInteractionState::new(MIN);
        tracker.on_gesture_start(&mut state);
        (tracker, state)
    }

    #[test]
    fn start_records_origin_and_enters_dragging() {
        let (_, state) = dragging();
        assert_eq!(state.phase(), Phase::Dragging);
        assert_eq!(state.gesture_origin(), 0.0);
    }

    #[test]
    fn update_follows_translation() {
        let (mut tracker, mut state) = dragging();
        let t = Instant::now();
        let d = tracker.on_gesture_update(&mut state, &sample(-35.0, -120.0, t));
        assert_eq!(d, SampleDisposition::Applied);
        assert_eq!(state.offset(), -35.0);
    }

    #[test]
    fn update_clamps_past_min() {
        let (mut tracker, mut state) = dragging();
        tracker.on_gesture_update(&mut state, &sample(-400.0, 0.0, Instant::now()));
        assert_eq!(state.offset(), MIN);
    }

    #[test]
    fn update_clamps_rightward_drag_to_zero() {
        let (mut tracker, mut state) = dragging();
        tracker.on_gesture_update(&mut state, &sample(60.0, 300.0, Instant::now()));
        assert_eq!(state.offset(), 0.0);
    }

    #[test]
    fn second_gesture_composes_with_origin() {
        let (mut tracker, mut state) = dragging();
        let t = Instant::now();
        tracker.on_gesture_update(&mut state, &sample(-40.0, 0.0, t));

        // Restart from the displaced offset; translation is relative again.
        tracker.on_gesture_start(&mut state);
        assert_eq!(state.gesture_origin(), -40.0);
        tracker.on_gesture_update(&mut state, &sample(-25.0, 0.0, t));
        assert_eq!(state.offset(), -65.0);
        tracker.on_gesture_update(&mut state, &sample(30.0, 0.0, t));
        assert_eq!(state.offset(), -10.0);
    }

    #[test]
    fn samples_ignored_when_not_dragging() {
        let mut tracker = GestureTracker::new();
        let mut state = RowInteractionState::new(MIN);
        let d = tracker.on_gesture_update(&mut state, &sample(-50.0, 0.0, Instant::now()));
        assert_eq!(d, SampleDisposition::NotDragging);
        assert_eq!(state.offset(), 0.0);
    }

    #[test]
    fn out_of_order_sample_dropped() {
        let (mut tracker, mut state) = dragging();
        let t = Instant::now();
        tracker.on_gesture_update(
            &mut state,
            &sample(-30.0, -10.0, t + Duration::from_millis(32)),
        );
        let d = tracker.on_gesture_update(
            &mut state,
            &sample(-80.0, -900.0, t + Duration::from_millis(16)),
        );
        assert_eq!(d, SampleDisposition::OutOfOrder);
        assert_eq!(state.offset(), -30.0);
        assert_eq!(tracker.on_gesture_end(&state).velocity, -10.0);
    }

    #[test]
    fn equal_timestamps_accepted() {
        let (mut tracker, mut state) = dragging();
        let t = Instant::now();
        tracker.on_gesture_update(&mut state, &sample(-10.0, 0.0, t));
        let d = tracker.on_gesture_update(&mut state, &sample(-20.0, 0.0, t));
        assert_eq!(d, SampleDisposition::Applied);
        assert_eq!(state.offset(), -20.0);
    }

    #[test]
    fn non_finite_sample_dropped() {
        let (mut tracker, mut state) = dragging();
        let t = Instant::now();
        tracker.on_gesture_update(&mut state, &sample(-10.0, 0.0, t));
        let d = tracker.on_gesture_update(&mut state, &sample(f64::NAN, 0.0, t));
        assert_eq!(d, SampleDisposition::NonFinite);
        let d = tracker.on_gesture_update(&mut state, &sample(-20.0, f64::INFINITY, t));
        assert_eq!(d, SampleDisposition::NonFinite);
        assert_eq!(state.offset(), -10.0);
    }

    #[test]
    fn end_reports_last_pair_and_keeps_phase() {
        let (mut tracker, mut state) = dragging();
        let t = Instant::now();
        tracker.on_gesture_update(&mut state, &sample(-20.0, -100.0, t));
        tracker.on_gesture_update(&mut state, &sample(-90.0, -250.0, t));
        let release = tracker.on_gesture_end(&state);
        assert_eq!(
            release,
            Release {
                offset: -90.0,
                velocity: -250.0
            }
        );
        assert_eq!(state.phase(), Phase::Dragging);
    }

    #[test]
    fn end_without_samples_has_zero_velocity() {
        let (tracker, state) = dragging();
        assert_eq!(tracker.on_gesture_end(&state).velocity, 0.0);
    }
}
