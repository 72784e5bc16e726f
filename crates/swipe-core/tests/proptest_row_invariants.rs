//! Property tests for the row controller's safety guarantees:
//!
//! 1. **Bounded offset**: every published offset lies in `[min_offset, 0]`.
//! 2. **Decision laws**: distance and fling rules hold for any release.
//! 3. **At most once**: no event sequence fires the commit callback twice,
//!    and the callback fires only on a committed row.
//! 4. **Legal transitions**: each event moves the phase along an allowed
//!    edge or leaves it unchanged.
//! 5. **Interrupt origin**: an interrupted settle re-anchors at the animated
//!    offset.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use proptest::prelude::*;
use swipe_core::{
    CommitPolicy, GestureSample, Phase, RowController, SwipeConfig, Verdict,
};
use web_time::Instant;

#[derive(Debug, Clone)]
enum Op {
    Start,
    Update { translation: f64, velocity: f64 },
    End,
    Cancel,
    Advance { ms: u64 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Start),
        5 => (-400.0f64..200.0, -3000.0f64..3000.0)
            .prop_map(|(translation, velocity)| Op::Update { translation, velocity }),
        2 => Just(Op::End),
        1 => Just(Op::Cancel),
        4 => (0u64..120).prop_map(|ms| Op::Advance { ms }),
    ]
}

fn counting_row(config: SwipeConfig) -> (RowController, Arc<AtomicUsize>) {
    let fired = Arc::new(AtomicUsize::new(0));
    let f = Arc::clone(&fired);
    let row = RowController::new(config, move || {
        f.fetch_add(1, Ordering::SeqCst);
    })
    .expect("valid config");
    (row, fired)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn random_event_sequences_keep_invariants(
        ops in prop::collection::vec(op(), 1..80),
        width in 40.0f64..240.0,
    ) {
        let config = SwipeConfig::with_affordance_width(width);
        let min = config.min_offset;
        let (row, fired) = counting_row(config);
        let t0 = Instant::now();
        let mut n = 0u64;
        let mut prev = row.phase();

        for op in &ops {
            match *op {
                Op::Start => { row.gesture_start(); }
                Op::Update { translation, velocity } => {
                    n += 1;
                    let at = t0 + Duration::from_millis(n);
                    row.gesture_update(GestureSample::new(translation, velocity, at));
                }
                Op::End => { row.gesture_end(); }
                Op::Cancel => { row.gesture_cancel(); }
                Op::Advance { ms } => { row.advance(Duration::from_millis(ms)); }
            }

            let snap = row.snapshot();
            prop_assert!(snap.offset >= min && snap.offset <= 0.0, "offset {}", snap.offset);
            prop_assert!((0.0..=1.0).contains(&snap.reveal_progress));
            prop_assert!((0.0..=1.0).contains(&snap.affordance_opacity));
            prop_assert!(
                snap.phase == prev || prev.can_transition_to(snap.phase),
                "{prev} -> {}", snap.phase
            );
            let count = fired.load(Ordering::SeqCst);
            prop_assert!(count <= 1);
            prop_assert_eq!(count == 1, snap.phase == Phase::Committed);
            prev = snap.phase;
        }

        // Drain: whatever was in flight finishes, still at most once.
        for _ in 0..600 {
            row.advance(Duration::from_millis(16));
        }
        prop_assert!(fired.load(Ordering::SeqCst) <= 1);
        prop_assert!(!row.needs_tick());
    }

    #[test]
    fn update_offset_always_clamped(
        translations in prop::collection::vec(-1e6f64..1e6, 1..40),
    ) {
        let (row, _) = counting_row(SwipeConfig::default());
        row.gesture_start();
        let t0 = Instant::now();
        for (i, t) in translations.iter().enumerate() {
            let at = t0 + Duration::from_millis(i as u64);
            row.gesture_update(GestureSample::new(*t, 0.0, at));
            let offset = row.snapshot().offset;
            prop_assert!((-100.0..=0.0).contains(&offset));
            prop_assert_eq!(offset, t.clamp(-100.0, 0.0));
        }
    }

    #[test]
    fn distance_rule_commits_regardless_of_velocity(
        offset in -100.0f64..=-80.0,
        velocity in -5000.0f64..5000.0,
    ) {
        let policy = CommitPolicy::from_config(&SwipeConfig::default());
        prop_assert_eq!(policy.decide(offset, velocity), Verdict::Commit);
    }

    #[test]
    fn fling_rule_commits_past_engagement(
        offset in -80.0f64..=-20.0,
        speed in 600.0f64..5000.0,
    ) {
        let policy = CommitPolicy::from_config(&SwipeConfig::default());
        prop_assert_eq!(policy.decide(offset, -speed), Verdict::Commit);
    }

    #[test]
    fn slow_short_release_cancels(
        offset in -79.9f64..=0.0,
        velocity in -599.9f64..5000.0,
    ) {
        let policy = CommitPolicy::from_config(&SwipeConfig::default());
        prop_assert_eq!(policy.decide(offset, velocity), Verdict::Cancel);
    }

    #[test]
    fn decide_is_deterministic(offset in -100.0f64..=0.0, velocity in -3000.0f64..3000.0) {
        let policy = CommitPolicy::from_config(&SwipeConfig::default());
        prop_assert_eq!(policy.decide(offset, velocity), policy.decide(offset, velocity));
    }

    #[test]
    fn interrupt_origin_is_animated_offset(
        release in -100.0f64..0.0,
        velocity in -2000.0f64..2000.0,
        frames in 0usize..40,
    ) {
        let (row, fired) = counting_row(SwipeConfig::default());
        row.gesture_start();
        row.gesture_update(GestureSample::new(release, velocity, Instant::now()));
        row.gesture_end();
        for _ in 0..frames {
            row.advance(Duration::from_millis(16));
        }
        if row.phase() == Phase::Settling {
            let before = row.snapshot().offset;
            row.gesture_start();
            prop_assert_eq!(row.phase(), Phase::Dragging);
            prop_assert_eq!(row.gesture_origin(), before);
            prop_assert_eq!(fired.load(Ordering::SeqCst), 0);
        }
    }
}
