#![forbid(unsafe_code)]

//! Per-row interaction controller: the state machine and the commit guard.
//!
//! A [`RowController`] owns one row's [`RowInteractionState`], its
//! [`GestureTracker`], [`SettleAnimator`] and [`AffordanceFade`], and the
//! row's commit callback. Input events and frame ticks may arrive on
//! different threads; all of them run inside one per-row critical section.
//!
//! # Transitions
//!
//! | From     | Event           | To        | Effect                                   |
//! |----------|-----------------|-----------|------------------------------------------|
//! | Idle     | start           | Dragging  | origin = offset                          |
//! | Dragging | update          | Dragging  | offset = clamp(origin + translation)     |
//! | Dragging | start           | Dragging  | re-anchor origin at current offset       |
//! | Dragging | end             | Settling  | decide verdict, start settle             |
//! | Dragging | cancel          | Settling  | settle back to rest                      |
//! | Settling | start           | Dragging  | cancel settle, origin = animated offset  |
//! | Settling | settled, Cancel | Idle      |                                          |
//! | Settling | settled, Commit | Committed | fire callback if not yet fired           |
//! | Committed| any             | Committed | ignored                                  |
//!
//! # Commit delivery
//!
//! The callback is an owned `FnOnce`. It is taken out of the controller
//! inside the critical section on the tick that completes a commit settle
//! and invoked after the lock is released. A second invocation cannot be
//! expressed, and the callback may call back into the controller.
//!
//! # Publication
//!
//! Every mutation that changes what a renderer would draw publishes a new
//! [`RowSnapshot`] (version + 1) before the lock is released. Subscribers
//! are notified after it is released.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, error, info};
use web_time::Instant;

use crate::animation::{AffordanceFade, SettleAnimator, SettleHandle, SettleProgress};
use crate::config::SwipeConfig;
use crate::error::Result;
use crate::logging::{self, TARGET};
use crate::observable::{Observable, Subscription};
use crate::policy::{CommitPolicy, Verdict};
use crate::sample::GestureSample;
use crate::state::{Phase, RowInteractionState, RowSnapshot, reveal_progress};
use crate::tracker::{GestureTracker, SampleDisposition};

/// Destructive side effect run once when a row commits.
pub type CommitCallback = Box<dyn FnOnce() + Send + 'static>;

static NEXT_ROW_ID: AtomicU64 = AtomicU64::new(1);

/// Why an event was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgnoreReason {
    /// A sample arrived while the row was not dragging.
    StaleSample,
    /// A sample older than the last accepted one.
    OutOfOrderSample,
    /// A sample with a NaN or infinite component.
    NonFiniteSample,
    /// End or cancel without a gesture in progress.
    NotDragging,
    /// The row has committed; nothing moves it any more.
    Terminal,
}

impl IgnoreReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IgnoreReason::StaleSample => "stale_sample",
            IgnoreReason::OutOfOrderSample => "out_of_order_sample",
            IgnoreReason::NonFiniteSample => "non_finite_sample",
            IgnoreReason::NotDragging => "not_dragging",
            IgnoreReason::Terminal => "terminal",
        }
    }
}

/// What the controller did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Handled; the row is now in this phase.
    Applied(Phase),
    /// Dropped without any state change.
    Ignored(IgnoreReason),
}

impl EventOutcome {
    #[inline]
    #[must_use]
    pub fn is_applied(self) -> bool {
        matches!(self, EventOutcome::Applied(_))
    }

    /// Phase after the event, if it was applied.
    #[must_use]
    pub fn phase(self) -> Option<Phase> {
        match self {
            EventOutcome::Applied(phase) => Some(phase),
            EventOutcome::Ignored(_) => None,
        }
    }
}

struct Inner {
    row: u64,
    state: RowInteractionState,
    tracker: GestureTracker,
    animator: SettleAnimator,
    fade: AffordanceFade,
    verdict: Option<Verdict>,
    last_frame: Option<Instant>,
    on_commit: Option<CommitCallback>,
    pending_commit: Option<CommitCallback>,
    published: RowSnapshot,
}

impl Inner {
    fn applied(&self) -> EventOutcome {
        EventOutcome::Applied(self.state.phase())
    }

    fn begin_gesture(&mut self) {
        if let Some(handle) = self.animator.cancel() {
            debug!(
                target: TARGET,
                row = self.row,
                handle = handle.id(),
                offset = self.state.offset(),
                "settle interrupted"
            );
        }
        self.tracker.on_gesture_start(&mut self.state);
        self.verdict = None;
    }

    fn begin_settle(&mut self, verdict: Verdict, velocity: f64) {
        self.state.set_phase(Phase::Settling);
        let handle = self.animator.start(&mut self.state, verdict, velocity);
        self.verdict = Some(verdict);
        self.last_frame = None;
        logging::record_settle_started();
        debug!(
            target: TARGET,
            row = self.row,
            handle = handle.id(),
            verdict = verdict.as_str(),
            offset = self.state.offset(),
            velocity,
            "settle started"
        );
    }

    /// Advance animations by `dt` and apply any settle completion.
    fn step(&mut self, dt: Duration) {
        let progress = self.animator.advance(&mut self.state, dt);
        self.fade.track(self.state.offset());
        self.fade.advance(dt);

        match progress {
            SettleProgress::Idle | SettleProgress::Running => {}
            SettleProgress::Settled(Verdict::Cancel) => {
                self.state.set_phase(Phase::Idle);
                debug!(target: TARGET, row = self.row, "settled at rest");
            }
            SettleProgress::Settled(Verdict::Commit) => self.commit(),
        }
    }

    fn commit(&mut self) {
        self.state.set_phase(Phase::Committed);
        let first = self.state.mark_callback_fired();
        if !first {
            error!(
                target: TARGET,
                row = self.row,
                "commit reached twice; callback suppressed"
            );
        }
        debug_assert!(first, "double commit attempt on row {}", self.row);
        if first {
            self.pending_commit = self.on_commit.take();
        }
    }

    fn needs_tick(&self) -> bool {
        self.state.phase() != Phase::Committed
            && (self.animator.is_running() || self.fade.is_moving())
    }

    /// Publish a new snapshot if anything a renderer draws has changed.
    fn publish(&mut self, cell: &Observable<RowSnapshot>) {
        let next = RowSnapshot {
            offset: self.state.offset(),
            reveal_progress: reveal_progress(self.state.offset(), self.state.min_offset()),
            affordance_opacity: self.fade.opacity(),
            phase: self.state.phase(),
            verdict: self.verdict,
            version: self.published.version,
        };
        if next == self.published {
            return;
        }
        self.published = RowSnapshot {
            version: self.published.version + 1,
            ..next
        };
        cell.publish(self.published);
    }
}

/// Interaction controller for a single row. `Send + Sync`.
pub struct RowController {
    id: u64,
    config: Arc<SwipeConfig>,
    policy: CommitPolicy,
    inner: Mutex<Inner>,
    snapshot: Observable<RowSnapshot>,
}

impl std::fmt::Debug for RowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("RowController")
            .field("id", &self.id)
            .field("phase", &snapshot.phase)
            .field("offset", &snapshot.offset)
            .field("version", &snapshot.version)
            .finish()
    }
}

impl RowController {
    /// Validate `config` and create a controller at rest.
    ///
    /// # Errors
    ///
    /// [`SwipeError::InvalidConfiguration`](crate::SwipeError::InvalidConfiguration)
    /// when `config` fails [`SwipeConfig::validate`].
    pub fn new(config: SwipeConfig, on_commit: impl FnOnce() + Send + 'static) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_validated(Arc::new(config), Box::new(on_commit)))
    }

    /// Create a controller sharing an already validated config.
    pub(crate) fn with_validated(config: Arc<SwipeConfig>, on_commit: CommitCallback) -> Self {
        let id = NEXT_ROW_ID.fetch_add(1, Ordering::Relaxed);
        let inner = Inner {
            row: id,
            state: RowInteractionState::new(config.min_offset),
            tracker: GestureTracker::new(),
            animator: SettleAnimator::new(&config),
            fade: AffordanceFade::new(&config),
            verdict: None,
            last_frame: None,
            on_commit: Some(on_commit),
            pending_commit: None,
            published: RowSnapshot::resting(),
        };
        Self {
            id,
            policy: CommitPolicy::from_config(&config),
            config,
            inner: Mutex::new(inner),
            snapshot: Observable::new(RowSnapshot::resting()),
        }
    }

    /// Process-unique identifier used in log events.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> &SwipeConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` in the critical section, then notify and fire outside it.
    fn dispatch(
        &self,
        event: &'static str,
        f: impl FnOnce(&mut Inner, &CommitPolicy) -> EventOutcome,
    ) -> EventOutcome {
        let (outcome, fire) = {
            let mut inner = self.lock();
            let outcome = if inner.state.phase() == Phase::Committed {
                EventOutcome::Ignored(IgnoreReason::Terminal)
            } else {
                f(&mut *inner, &self.policy)
            };
            // A row with nothing in motion forgets its frame baseline, so
            // the next tick after it wakes starts from zero elapsed time.
            if !inner.needs_tick() {
                inner.last_frame = None;
            }
            if outcome.is_applied() {
                inner.publish(&self.snapshot);
            }
            (outcome, inner.pending_commit.take())
        };

        if let EventOutcome::Ignored(reason) = outcome {
            logging::record_ignored();
            debug!(
                target: TARGET,
                row = self.id,
                event,
                reason = reason.as_str(),
                "event ignored"
            );
        }

        self.snapshot.notify();

        if let Some(callback) = fire {
            logging::record_commit();
            info!(target: TARGET, row = self.id, "row committed");
            callback();
        }
        outcome
    }

    /// Pointer down on the row, or a new gesture interrupting a settle.
    pub fn gesture_start(&self) -> EventOutcome {
        self.dispatch("gesture_start", |inner, _| {
            inner.begin_gesture();
            inner.applied()
        })
    }

    /// Apply one pointer sample.
    pub fn gesture_update(&self, sample: GestureSample) -> EventOutcome {
        self.dispatch("gesture_update", |inner, _| {
            match inner.tracker.on_gesture_update(&mut inner.state, &sample) {
                SampleDisposition::Applied => {
                    inner.fade.track(inner.state.offset());
                    inner.applied()
                }
                SampleDisposition::NotDragging => EventOutcome::Ignored(IgnoreReason::StaleSample),
                SampleDisposition::OutOfOrder => {
                    EventOutcome::Ignored(IgnoreReason::OutOfOrderSample)
                }
                SampleDisposition::NonFinite => EventOutcome::Ignored(IgnoreReason::NonFiniteSample),
            }
        })
    }

    /// Pointer up: decide a verdict and start settling.
    pub fn gesture_end(&self) -> EventOutcome {
        self.dispatch("gesture_end", |inner, policy| {
            if inner.state.phase() != Phase::Dragging {
                return EventOutcome::Ignored(IgnoreReason::NotDragging);
            }
            let release = inner.tracker.on_gesture_end(&inner.state);
            let verdict = policy.decide(release.offset, release.velocity);
            inner.begin_settle(verdict, release.velocity);
            inner.applied()
        })
    }

    /// The host took the gesture away (e.g. the list started scrolling).
    /// Settles back to rest without consulting the policy.
    pub fn gesture_cancel(&self) -> EventOutcome {
        self.dispatch("gesture_cancel", |inner, _| {
            if inner.state.phase() != Phase::Dragging {
                return EventOutcome::Ignored(IgnoreReason::NotDragging);
            }
            inner.begin_settle(Verdict::Cancel, 0.0);
            inner.applied()
        })
    }

    /// Frame tick at `now`. The first tick after a settle starts, or after
    /// the row came to rest, only records the baseline.
    pub fn tick(&self, now: Instant) -> EventOutcome {
        self.dispatch("tick", |inner, _| {
            let dt = match inner.last_frame.replace(now) {
                Some(prev) => now.saturating_duration_since(prev),
                None => Duration::ZERO,
            };
            inner.step(dt);
            inner.applied()
        })
    }

    /// Advance animations by an explicit `dt`.
    pub fn advance(&self, dt: Duration) -> EventOutcome {
        self.dispatch("advance", |inner, _| {
            inner.step(dt);
            inner.applied()
        })
    }

    /// Latest published snapshot. Wait-free.
    #[must_use]
    pub fn snapshot(&self) -> RowSnapshot {
        *self.snapshot.load()
    }

    /// Phase as of the latest snapshot.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.snapshot.load().phase
    }

    /// Receive every published snapshot. Runs outside the row's lock.
    pub fn subscribe(
        &self,
        callback: impl Fn(&RowSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        self.snapshot.subscribe(callback)
    }

    /// Whether a settle or fade is in motion.
    #[must_use]
    pub fn needs_tick(&self) -> bool {
        self.lock().needs_tick()
    }

    /// Handle for the settle in flight.
    #[must_use]
    pub fn settle_handle(&self) -> Option<SettleHandle> {
        self.lock().animator.handle()
    }

    /// Whether the commit callback has been released.
    #[must_use]
    pub fn has_committed(&self) -> bool {
        self.lock().state.callback_fired()
    }

    /// Offset recorded when the current gesture began.
    #[must_use]
    pub fn gesture_origin(&self) -> f64 {
        self.lock().state.gesture_origin()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
