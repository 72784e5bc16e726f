#![forbid(unsafe_code)]

//! Gesture scripts: a serializable list of input events and frame requests.
//!
//! # JSON Schema
//!
//! ```json
//! {"name":"commit_by_distance","steps":[
//!   {"op":"start"},
//!   {"op":"move","translation":-45.0,"velocity":-300.0},
//!   {"op":"move","translation":-90.0,"velocity":0.0},
//!   {"op":"end"},
//!   {"op":"settle","max_frames":600}
//! ]}
//! ```

use serde::{Deserialize, Serialize};

/// Default frame cap for [`Step::Settle`].
pub const DEFAULT_SETTLE_FRAMES: usize = 600;

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Pointer down.
    Start,
    /// Pointer sample, translation relative to pointer down.
    Move { translation: f64, velocity: f64 },
    /// Pointer up.
    End,
    /// Host takes the gesture away.
    Cancel,
    /// Tick exactly `count` frames.
    Frames { count: usize },
    /// Tick until the row stops moving, at most `max_frames`.
    Settle { max_frames: usize },
}

impl Step {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Step::Start => "start",
            Step::Move { .. } => "move",
            Step::End => "end",
            Step::Cancel => "cancel",
            Step::Frames { .. } => "frames",
            Step::Settle { .. } => "settle",
        }
    }
}

/// A named sequence of [`Step`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureScript {
    pub name: String,
    pub steps: Vec<Step>,
}

impl GestureScript {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub fn start(mut self) -> Self {
        self.steps.push(Step::Start);
        self
    }

    #[must_use]
    pub fn sample(mut self, translation: f64, velocity: f64) -> Self {
        self.steps.push(Step::Move {
            translation,
            velocity,
        });
        self
    }

    /// `samples` evenly spaced moves from 0 to `to`, all at `velocity`.
    #[must_use]
    pub fn drag_to(mut self, to: f64, samples: usize, velocity: f64) -> Self {
        let n = samples.max(1);
        for i in 1..=n {
            let translation = to * i as f64 / n as f64;
            self.steps.push(Step::Move {
                translation,
                velocity,
            });
        }
        self
    }

    #[must_use]
    pub fn end(mut self) -> Self {
        self.steps.push(Step::End);
        self
    }

    #[must_use]
    pub fn cancel(mut self) -> Self {
        self.steps.push(Step::Cancel);
        self
    }

    #[must_use]
    pub fn frames(mut self, count: usize) -> Self {
        self.steps.push(Step::Frames { count });
        self
    }

    #[must_use]
    pub fn settle(mut self) -> Self {
        self.steps.push(Step::Settle {
            max_frames: DEFAULT_SETTLE_FRAMES,
        });
        self
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
