#![forbid(unsafe_code)]

//! Per-row interaction state and the snapshot handed to renderers.
//!
//! # Invariants
//!
//! 1. `offset` is always within `[min_offset, 0]`; every write goes through
//!    [`RowInteractionState::set_offset`], which clamps.
//! 2. `callback_fired` goes false→true at most once and never resets.
//! 3. `phase` only moves along `Idle → Dragging → Settling → {Idle | Committed}`
//!    plus the interrupt edge `Settling → Dragging`. `Committed` is terminal.

use crate::observable::Versioned;
use crate::policy::Verdict;

/// Where a row is in its gesture lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// At rest, waiting for a gesture.
    Idle,
    /// Following the pointer.
    Dragging,
    /// Animating toward rest or toward the dismissed offset.
    Settling,
    /// Commit fired. Terminal; the row is expected to unmount.
    Committed,
}

impl Phase {
    /// Whether the state machine permits moving from `self` to `to`.
    ///
    /// `Dragging → Dragging` is allowed for re-anchoring a restarted gesture.
    #[must_use]
    pub fn can_transition_to(self, to: Phase) -> bool {
        matches!(
            (self, to),
            (Phase::Idle, Phase::Dragging)
                | (Phase::Dragging, Phase::Dragging)
                | (Phase::Dragging, Phase::Settling)
                | (Phase::Settling, Phase::Dragging)
                | (Phase::Settling, Phase::Idle)
                | (Phase::Settling, Phase::Committed)
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Dragging => "dragging",
            Phase::Settling => "settling",
            Phase::Committed => "committed",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable interaction state for one row.
///
/// Owned exclusively by that row's controller. Readers outside the
/// controller see [`RowSnapshot`] values instead.
#[derive(Debug, Clone)]
pub struct RowInteractionState {
    offset: f64,
    phase: Phase,
    gesture_origin: f64,
    callback_fired: bool,
    min_offset: f64,
}

impl RowInteractionState {
    /// Fresh state for a newly mounted row: offset 0, `Idle`.
    #[must_use]
    pub fn new(min_offset: f64) -> Self {
        Self {
            offset: 0.0,
            phase: Phase::Idle,
            gesture_origin: 0.0,
            callback_fired: false,
            min_offset,
        }
    }

    #[inline]
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    #[must_use]
    pub fn gesture_origin(&self) -> f64 {
        self.gesture_origin
    }

    #[inline]
    #[must_use]
    pub fn callback_fired(&self) -> bool {
        self.callback_fired
    }

    #[inline]
    #[must_use]
    pub fn min_offset(&self) -> f64 {
        self.min_offset
    }

    /// `clamp01(offset / min_offset)`.
    #[must_use]
    pub fn reveal_progress(&self) -> f64 {
        reveal_progress(self.offset, self.min_offset)
    }

    /// Write a new offset, clamped to `[min_offset, 0]`.
    pub(crate) fn set_offset(&mut self, raw: f64) {
        self.offset = clamp_offset(raw, self.min_offset);
    }

    pub(crate) fn set_gesture_origin(&mut self, origin: f64) {
        self.gesture_origin = clamp_offset(origin, self.min_offset);
    }

    pub(crate) fn set_phase(&mut self, to: Phase) {
        debug_assert!(
            self.phase.can_transition_to(to),
            "illegal phase transition {} -> {}",
            self.phase,
            to
        );
        self.phase = to;
    }

    /// Flip the commit guard. Returns `false` if it was already set.
    pub(crate) fn mark_callback_fired(&mut self) -> bool {
        if self.callback_fired {
            return false;
        }
        self.callback_fired = true;
        true
    }
}

/// Clamp an offset to `[min_offset, 0]`. NaN collapses to 0.
#[inline]
#[must_use]
pub fn clamp_offset(raw: f64, min_offset: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(min_offset, 0.0)
}

/// Fraction of the drag range covered by `offset`, in `[0, 1]`.
#[inline]
#[must_use]
pub fn reveal_progress(offset: f64, min_offset: f64) -> f64 {
    if min_offset >= 0.0 {
        return 0.0;
    }
    (offset / min_offset).clamp(0.0, 1.0)
}

/// Immutable view of a row published after every engine update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSnapshot {
    /// Horizontal transform for the row, in `[min_offset, 0]`.
    pub offset: f64,
    /// `clamp01(offset / min_offset)`.
    pub reveal_progress: f64,
    /// Spring-smoothed opacity of the destructive affordance, in `[0, 1]`.
    pub affordance_opacity: f64,
    pub phase: Phase,
    /// Verdict of the settle in flight or completed, if any.
    pub verdict: Option<Verdict>,
    /// Increments by one per publication.
    pub version: u64,
}

impl RowSnapshot {
    /// Snapshot of a freshly mounted row.
    #[must_use]
    pub fn resting() -> Self {
        Self {
            offset: 0.0,
            reveal_progress: 0.0,
            affordance_opacity: 0.0,
            phase: Phase::Idle,
            verdict: None,
            version: 0,
        }
    }
}

impl Versioned for RowSnapshot {
    fn version(&self) -> u64 {
        self.version
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
