#![forbid(unsafe_code)]

//! Gesture storms for fault-injection testing.
//!
//! Generates deterministic [`GestureScript`]s that hammer one row with
//! adversarial input: jittery drags, flings in both directions, host
//! cancels, releases followed by an immediate re-grab, and stray samples
//! outside any gesture.
//!
//! | Knob            | Effect                                            |
//! |-----------------|---------------------------------------------------|
//! | `gestures`      | Number of press/release cycles                    |
//! | `max_samples`   | Upper bound on moves per gesture                  |
//! | `interrupt_pct` | Chance a settle is interrupted after a few frames |
//! | `cancel_pct`    | Chance the host cancels instead of a release      |
//! | `stray_pct`     | Chance of a sample arriving with no gesture       |

use crate::rng::Rng;
use crate::script::{GestureScript, Step};

/// Storm shape and seed.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureStormConfig {
    pub seed: u64,
    pub gestures: usize,
    pub max_samples: usize,
    /// Translations are drawn from `[-max_translation, max_translation / 2]`.
    pub max_translation: f64,
    pub max_speed: f64,
    pub interrupt_pct: u8,
    pub cancel_pct: u8,
    pub stray_pct: u8,
}

impl GestureStormConfig {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            gestures: 40,
            max_samples: 12,
            max_translation: 160.0,
            max_speed: 2500.0,
            interrupt_pct: 40,
            cancel_pct: 10,
            stray_pct: 10,
        }
    }

    #[must_use]
    pub fn gestures(mut self, gestures: usize) -> Self {
        self.gestures = gestures;
        self
    }
}

/// Build a storm script from `config`.
#[must_use]
pub fn generate_storm(config: &GestureStormConfig) -> GestureScript {
    let mut rng = Rng::new(config.seed);
    let mut script = GestureScript::new(format!("storm_seed{}", config.seed));

    for _ in 0..config.gestures {
        if rng.percent(config.stray_pct) {
            script.steps.push(random_move(&mut rng, config));
        }

        script.steps.push(Step::Start);
        let samples = 1 + rng.below(config.max_samples.max(1) as u64) as usize;
        for _ in 0..samples {
            script.steps.push(random_move(&mut rng, config));
        }

        if rng.percent(config.cancel_pct) {
            script.steps.push(Step::Cancel);
        } else {
            script.steps.push(Step::End);
        }

        if rng.percent(config.interrupt_pct) {
            // Re-grab while the settle is still moving.
            script.steps.push(Step::Frames {
                count: rng.below(6) as usize,
            });
        } else {
            script.steps.push(Step::Frames {
                count: 10 + rng.below(60) as usize,
            });
        }
    }

    script.steps.push(Step::Settle {
        max_frames: crate::script::DEFAULT_SETTLE_FRAMES,
    });
    script
}

fn random_move(rng: &mut Rng, config: &GestureStormConfig) -> Step {
    let span = config.max_translation * 1.5;
    let translation = rng.unit() * span - config.max_translation;
    let velocity = (rng.unit() * 2.0 - 1.0) * config.max_speed;
    Step::Move {
        translation,
        velocity,
    }
}
