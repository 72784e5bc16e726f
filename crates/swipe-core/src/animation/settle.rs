#![forbid(unsafe_code)]

//! Settle animation: springs a released row to rest or through to dismissal.
//!
//! [`SettleAnimator::start`] aims a [`Spring`] at `0` (cancel) or
//! `min_offset` (commit) and returns a [`SettleHandle`]. Each
//! [`advance`](SettleAnimator::advance) integrates the spring by the elapsed
//! time and writes the clamped position into the row state. When the spring
//! comes to rest the animator reports [`SettleProgress::Settled`] exactly
//! once and drops the animation.
//!
//! # Completion
//!
//! The spring is at rest once both displacement and velocity are at or below
//! `settle_epsilon × travel_range` (floored at [`MIN_REST_THRESHOLD`] so a
//! zero-length settle still completes).
//!
//! # Invariants
//!
//! 1. At most one animation drives a row's offset. Starting a new settle
//!    cancels the previous handle first.
//! 2. A handle moves from `Running` to exactly one of `Settled` or
//!    `Cancelled`, never both.
//! 3. The offset written into the state is clamped, so spring overshoot past
//!    `0` or `min_offset` is never observed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use tracing::trace;

use super::spring::Spring;
use crate::config::{SpringParams, SwipeConfig};
use crate::logging::TARGET;
use crate::policy::Verdict;
use crate::state::RowInteractionState;

/// Absolute floor (px and px/s) for the rest thresholds.
pub const MIN_REST_THRESHOLD: f64 = 1e-3;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

const RUNNING: u8 = 0;
const SETTLED: u8 = 1;
const CANCELLED: u8 = 2;

// ---------------------------------------------------------------------------
// SettleHandle
// ---------------------------------------------------------------------------

/// Lifecycle of one settle animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStatus {
    Running,
    Settled,
    Cancelled,
}

/// A cloneable, thread-safe view of one settle animation.
///
/// Hosts may hold on to a handle to learn whether the animation it names
/// finished or was interrupted. Handles never drive the animation.
#[derive(Clone)]
pub struct SettleHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    id: u64,
    verdict: Verdict,
    status: AtomicU8,
}

impl std::fmt::Debug for SettleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettleHandle")
            .field("id", &self.inner.id)
            .field("verdict", &self.inner.verdict)
            .field("status", &self.status())
            .finish()
    }
}

impl SettleHandle {
    fn new(verdict: Verdict) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
                verdict,
                status: AtomicU8::new(RUNNING),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[must_use]
    pub fn verdict(&self) -> Verdict {
        self.inner.verdict
    }

    #[must_use]
    pub fn status(&self) -> SettleStatus {
        match self.inner.status.load(Ordering::Acquire) {
            RUNNING => SettleStatus::Running,
            SETTLED => SettleStatus::Settled,
            _ => SettleStatus::Cancelled,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status() == SettleStatus::Running
    }

    /// Move out of `Running`. Returns `false` if already finished.
    fn finish(&self, to: u8) -> bool {
        self.inner
            .status
            .compare_exchange(RUNNING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

// ---------------------------------------------------------------------------
// SettleAnimator
// ---------------------------------------------------------------------------

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleProgress {
    /// No settle in flight.
    Idle,
    /// The spring moved and has not come to rest.
    Running,
    /// The spring came to rest on this tick. Reported once per settle.
    Settled(Verdict),
}

struct ActiveSettle {
    spring: Spring,
    handle: SettleHandle,
}

/// Drives a row's offset through one settle at a time.
pub struct SettleAnimator {
    active: Option<ActiveSettle>,
    cancel_spring: SpringParams,
    commit_spring: SpringParams,
    settle_epsilon: f64,
    carry_release_velocity: bool,
}

impl std::fmt::Debug for SettleAnimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettleAnimator")
            .field("running", &self.is_running())
            .field("verdict", &self.verdict())
            .finish()
    }
}

impl SettleAnimator {
    #[must_use]
    pub fn new(config: &SwipeConfig) -> Self {
        Self {
            active: None,
            cancel_spring: config.cancel_spring,
            commit_spring: config.commit_spring,
            settle_epsilon: config.settle_epsilon,
            carry_release_velocity: config.carry_release_velocity,
        }
    }

    /// Begin settling from the row's current offset.
    ///
    /// Any settle already in flight is cancelled first.
    pub fn start(
        &mut self,
        state: &mut RowInteractionState,
        verdict: Verdict,
        release_velocity: f64,
    ) -> SettleHandle {
        self.cancel();

        let (target, params) = match verdict {
            Verdict::Commit => (state.min_offset(), self.commit_spring),
            Verdict::Cancel => (0.0, self.cancel_spring),
        };
        let from = state.offset();
        let threshold = (self.settle_epsilon * (target - from).abs()).max(MIN_REST_THRESHOLD);
        // Release velocity pointing away from the target is discarded.
        let toward_target = (target - from) * release_velocity > 0.0;
        let velocity = if self.carry_release_velocity && toward_target {
            release_velocity
        } else {
            0.0
        };

        let spring = Spring::with_params(from, target, params)
            .with_velocity(velocity)
            .with_rest_threshold(threshold)
            .with_velocity_threshold(threshold);
        let handle = SettleHandle::new(verdict);
        trace!(
            target: TARGET,
            handle = handle.id(),
            verdict = verdict.as_str(),
            from,
            target,
            velocity,
            "settle spring started"
        );
        self.active = Some(ActiveSettle {
            spring,
            handle: handle.clone(),
        });
        handle
    }

    /// Stop the settle in flight, leaving the offset where it is.
    pub fn cancel(&mut self) -> Option<SettleHandle> {
        let active = self.active.take()?;
        active.handle.finish(CANCELLED);
        trace!(target: TARGET, handle = active.handle.id(), "settle spring cancelled");
        Some(active.handle)
    }

    /// Integrate by `dt` and write the clamped position into `state`.
    pub fn advance(&mut self, state: &mut RowInteractionState, dt: Duration) -> SettleProgress {
        let Some(active) = self.active.as_mut() else {
            return SettleProgress::Idle;
        };

        active.spring.advance(dt);
        state.set_offset(active.spring.position());
        if !active.spring.is_at_rest() {
            return SettleProgress::Running;
        }

        let done = self.active.take().map(|a| a.handle);
        match done {
            Some(handle) if handle.finish(SETTLED) => SettleProgress::Settled(handle.verdict()),
            _ => SettleProgress::Idle,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Verdict of the settle in flight.
    #[must_use]
    pub fn verdict(&self) -> Option<Verdict> {
        self.active.as_ref().map(|a| a.handle.verdict())
    }

    #[must_use]
    pub fn handle(&self) -> Option<SettleHandle> {
        self.active.as_ref().map(|a| a.handle.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
