#![forbid(unsafe_code)]

//! Structured logging targets, event counters, and the optional JSON
//! subscriber.
//!
//! All engine events are emitted through `tracing` under [`TARGET`]:
//!
//! | Level   | Event                                      |
//! |---------|--------------------------------------------|
//! | `debug` | ignored input, release verdicts, interrupts |
//! | `info`  | commit callback fired                      |
//! | `error` | at-most-once guard tripped                 |
//!
//! The counters below are process-wide and monotonic.

use std::sync::atomic::{AtomicU64, Ordering};

/// `tracing` target for row interaction events.
pub const TARGET: &str = "swipe.row";

/// Environment variable read by [`init_json_subscriber`].
pub const LOG_ENV: &str = "SWIPE_LOG";

static COMMITS_TOTAL: AtomicU64 = AtomicU64::new(0);
static SETTLES_STARTED_TOTAL: AtomicU64 = AtomicU64::new(0);
static IGNORED_EVENTS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Commit callbacks fired.
#[must_use]
pub fn commits_total() -> u64 {
    COMMITS_TOTAL.load(Ordering::Relaxed)
}

/// Settle animations started, either verdict.
#[must_use]
pub fn settles_started_total() -> u64 {
    SETTLES_STARTED_TOTAL.load(Ordering::Relaxed)
}

/// Events the controller dropped.
#[must_use]
pub fn ignored_events_total() -> u64 {
    IGNORED_EVENTS_TOTAL.load(Ordering::Relaxed)
}

pub(crate) fn record_commit() {
    COMMITS_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_settle_started() {
    SETTLES_STARTED_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_ignored() {
    IGNORED_EVENTS_TOTAL.fetch_add(1, Ordering::Relaxed);
}

/// Install a global JSON subscriber filtered by `SWIPE_LOG`
/// (default `info`).
///
/// Fails if a global subscriber is already set.
#[cfg(feature = "tracing-json")]
pub fn init_json_subscriber() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .try_init()
}
