#![forbid(unsafe_code)]

//! Frame driver: replays a [`GestureScript`] against a fresh row on a
//! synthetic clock and records a [`Trace`].
//!
//! The clock starts at an arbitrary `Instant` and only moves when the script
//! asks for frames, so the same script, config and seed always produce the
//! same trace and the same checksum.
//!
//! # JSONL Schema
//!
//! ```json
//! {"event":"trace_start","name":"scenario_a","seed":7,"frame_us":16000,"jitter_us":0}
//! {"event":"frame","idx":0,"step":0,"op":"start","outcome":"applied","phase":"dragging","offset":0.0,...}
//! {"event":"trace_complete","frames":58,"commits":1,"checksum":"blake3:..."}
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use swipe_core::{
    EventOutcome, GestureSample, Phase, RowController, RowSnapshot, SwipeConfig, SwipeError,
};
use tracing::info_span;
use web_time::Instant;

use crate::rng::Rng;
use crate::script::{GestureScript, Step};

/// Checksum prefix for clarity in logs.
pub const CHECKSUM_PREFIX: &str = "blake3:";

/// 60 Hz.
pub const DEFAULT_FRAME: Duration = Duration::from_micros(16_000);

/// One row observation, taken after every script event and every frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceFrame {
    pub idx: usize,
    /// Index of the script step that produced this observation.
    pub step: usize,
    pub op: &'static str,
    pub outcome: String,
    pub phase: &'static str,
    pub offset: f64,
    pub reveal_progress: f64,
    pub affordance_opacity: f64,
    pub verdict: Option<&'static str>,
    pub version: u64,
    /// Microseconds on the synthetic clock.
    pub clock_us: u64,
}

/// Everything observed while replaying one script.
#[derive(Debug, Clone)]
pub struct Trace {
    pub name: String,
    pub seed: u64,
    pub frame_us: u64,
    pub jitter_us: u64,
    pub frames: Vec<TraceFrame>,
    /// Times the commit callback ran.
    pub commits: usize,
    pub final_snapshot: RowSnapshot,
}

impl Trace {
    /// BLAKE3 over the observable fields of every frame, prefixed `blake3:`.
    #[must_use]
    pub fn checksum(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for f in &self.frames {
            hasher.update(&(f.step as u64).to_le_bytes());
            hasher.update(f.op.as_bytes());
            hasher.update(f.outcome.as_bytes());
            hasher.update(f.phase.as_bytes());
            hasher.update(&f.offset.to_bits().to_le_bytes());
            hasher.update(&f.affordance_opacity.to_bits().to_le_bytes());
            hasher.update(f.verdict.unwrap_or("-").as_bytes());
            hasher.update(&f.version.to_le_bytes());
            hasher.update(&f.clock_us.to_le_bytes());
        }
        hasher.update(&(self.commits as u64).to_le_bytes());
        format!("{CHECKSUM_PREFIX}{}", hasher.finalize().to_hex())
    }

    /// Offsets in observation order.
    pub fn offsets(&self) -> impl Iterator<Item = f64> + '_ {
        self.frames.iter().map(|f| f.offset)
    }

    /// First frame in `phase`, if any.
    #[must_use]
    pub fn first_in_phase(&self, phase: Phase) -> Option<&TraceFrame> {
        self.frames.iter().find(|f| f.phase == phase.as_str())
    }

    /// One JSON object per line: start, frames, completion.
    pub fn to_jsonl(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        let start = json!({
            "event": "trace_start",
            "name": self.name,
            "seed": self.seed,
            "frame_us": self.frame_us,
            "jitter_us": self.jitter_us,
        });
        out.push_str(&start.to_string());
        out.push('\n');
        for frame in &self.frames {
            let mut value = serde_json::to_value(frame)?;
            if let Some(obj) = value.as_object_mut() {
                obj.insert("event".to_string(), json!("frame"));
            }
            out.push_str(&value.to_string());
            out.push('\n');
        }
        let complete = json!({
            "event": "trace_complete",
            "frames": self.frames.len(),
            "commits": self.commits,
            "checksum": self.checksum(),
        });
        out.push_str(&complete.to_string());
        out.push('\n');
        Ok(out)
    }
}

fn outcome_label(outcome: EventOutcome) -> String {
    match outcome {
        EventOutcome::Applied(_) => "applied".to_string(),
        EventOutcome::Ignored(reason) => format!("ignored:{}", reason.as_str()),
    }
}

/// Replays scripts at a fixed cadence with optional seeded jitter.
#[derive(Debug, Clone)]
pub struct FrameDriver {
    frame: Duration,
    jitter: Duration,
    seed: u64,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME)
    }
}

impl FrameDriver {
    #[must_use]
    pub fn new(frame: Duration) -> Self {
        Self {
            frame,
            jitter: Duration::ZERO,
            seed: 0,
        }
    }

    /// Perturb each frame by up to ±`jitter`, drawn from `seed`.
    #[must_use]
    pub fn with_jitter(mut self, jitter: Duration, seed: u64) -> Self {
        self.jitter = jitter;
        self.seed = seed;
        self
    }

    fn frame_us(&self) -> u64 {
        self.frame.as_micros() as u64
    }

    fn jitter_us(&self) -> u64 {
        (self.jitter.as_micros() as u64).min(self.frame_us().saturating_sub(1))
    }

    /// Replay `script` on a new row built from `config`.
    ///
    /// # Errors
    ///
    /// Propagates `InvalidConfiguration` from the controller.
    pub fn run(&self, script: &GestureScript, config: SwipeConfig) -> Result<Trace, SwipeError> {
        let commits = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&commits);
        let row = RowController::new(config, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })?;

        let _span = info_span!("swipe.harness.run", script = %script.name, seed = self.seed).entered();

        let mut run = Run {
            row: &row,
            rng: Rng::new(self.seed),
            frame_us: self.frame_us(),
            jitter_us: self.jitter_us(),
            origin: Instant::now(),
            clock_us: 0,
            frames: Vec::new(),
        };
        for (step_idx, step) in script.steps.iter().enumerate() {
            run.apply(step_idx, step);
        }

        Ok(Trace {
            name: script.name.clone(),
            seed: self.seed,
            frame_us: self.frame_us(),
            jitter_us: self.jitter_us(),
            frames: run.frames,
            commits: commits.load(Ordering::SeqCst),
            final_snapshot: row.snapshot(),
        })
    }
}

struct Run<'a> {
    row: &'a RowController,
    rng: Rng,
    frame_us: u64,
    jitter_us: u64,
    origin: Instant,
    clock_us: u64,
    frames: Vec<TraceFrame>,
}

impl Run<'_> {
    fn now(&self) -> Instant {
        self.origin + Duration::from_micros(self.clock_us)
    }

    fn next_frame_us(&mut self) -> u64 {
        if self.jitter_us == 0 {
            return self.frame_us;
        }
        let spread = self.rng.below(2 * self.jitter_us + 1);
        self.frame_us + spread - self.jitter_us
    }

    fn tick(&mut self, step_idx: usize, op: &'static str) {
        self.clock_us += self.next_frame_us();
        let outcome = self.row.tick(self.now());
        self.record(step_idx, op, outcome);
    }

    fn apply(&mut self, step_idx: usize, step: &Step) {
        let op = step.name();
        match *step {
            Step::Start => {
                let outcome = self.row.gesture_start();
                self.record(step_idx, op, outcome);
            }
            Step::Move {
                translation,
                velocity,
            } => {
                let sample = GestureSample::new(translation, velocity, self.now());
                let outcome = self.row.gesture_update(sample);
                self.record(step_idx, op, outcome);
            }
            Step::End => {
                let outcome = self.row.gesture_end();
                self.record(step_idx, op, outcome);
            }
            Step::Cancel => {
                let outcome = self.row.gesture_cancel();
                self.record(step_idx, op, outcome);
            }
            Step::Frames { count } => {
                for _ in 0..count {
                    self.tick(step_idx, op);
                }
            }
            Step::Settle { max_frames } => {
                for _ in 0..max_frames {
                    if !self.row.needs_tick() {
                        break;
                    }
                    self.tick(step_idx, op);
                }
            }
        }
    }

    fn record(&mut self, step: usize, op: &'static str, outcome: EventOutcome) {
        let snap = self.row.snapshot();
        self.frames.push(TraceFrame {
            idx: self.frames.len(),
            step,
            op,
            outcome: outcome_label(outcome),
            phase: snap.phase.as_str(),
            offset: snap.offset,
            reveal_progress: snap.reveal_progress,
            affordance_opacity: snap.affordance_opacity,
            verdict: snap.verdict.map(|v| v.as_str()),
            version: snap.version,
            clock_us: self.clock_us,
        });
    }
}
