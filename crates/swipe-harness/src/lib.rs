#![forbid(unsafe_code)]

//! Deterministic test harness for `swipe-core`.
//!
//! - [`script`]: serializable gesture scripts.
//! - [`driver`]: replays a script on a synthetic clock and records a
//!   [`Trace`] with a BLAKE3 checksum and JSONL export.
//! - [`storm`]: seeded gesture storms for fault injection.
//!
//! Determinism knobs follow the environment:
//!
//! | Variable              | Effect                                   |
//! |-----------------------|------------------------------------------|
//! | `SWIPE_HARNESS_SEED`  | Overrides the default seed in [`fixture_seed`] |

pub mod driver;
mod rng;
pub mod script;
pub mod storm;

pub use driver::{FrameDriver, Trace, TraceFrame};
pub use script::{GestureScript, Step};
pub use storm::{GestureStormConfig, generate_storm};

/// Seed from `SWIPE_HARNESS_SEED`, or `default_seed`.
#[must_use]
pub fn fixture_seed(default_seed: u64) -> u64 {
    std::env::var("SWIPE_HARNESS_SEED")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default_seed)
}
