//! Benchmark: row controller hot paths.
//!
//! Run with: `cargo bench -p swipe-core --bench controller_bench`
//!
//! Measures the per-sample cost of `gesture_update` on the input cadence,
//! the per-frame cost of a settling tick, and snapshot reads under
//! concurrent input pressure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use swipe_core::{GestureSample, RowController, RowRegistry, SwipeConfig};
use web_time::Instant;

fn dragging_row() -> RowController {
    let row = RowController::new(SwipeConfig::default(), || {}).expect("default config");
    row.gesture_start();
    row
}

// ===========================================================================
// Input cadence
// ===========================================================================

fn bench_gesture_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("gesture_update");
    let now = Instant::now();

    // Alternating translations so every sample republishes.
    {
        let row = dragging_row();
        let mut flip = false;
        group.bench_function("changing_offset", |b| {
            b.iter(|| {
                flip = !flip;
                let t = if flip { -40.0 } else { -41.0 };
                black_box(row.gesture_update(GestureSample::new(t, -120.0, now)))
            });
        });
    }

    // Same translation: tracked, but no snapshot publication.
    {
        let row = dragging_row();
        row.gesture_update(GestureSample::new(-40.0, 0.0, now));
        group.bench_function("unchanged_offset", |b| {
            b.iter(|| black_box(row.gesture_update(GestureSample::new(-40.0, 0.0, now))));
        });
    }

    {
        let row = RowController::new(SwipeConfig::default(), || {}).expect("default config");
        group.bench_function("ignored_not_dragging", |b| {
            b.iter(|| black_box(row.gesture_update(GestureSample::new(-40.0, 0.0, now))));
        });
    }

    group.finish();
}

// ===========================================================================
// Frame cadence
// ===========================================================================

fn bench_settle_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("settle_tick");
    let frame = Duration::from_micros(16_667);

    group.bench_function("advance_one_frame", |b| {
        b.iter_batched(
            || {
                let row = dragging_row();
                row.gesture_update(GestureSample::new(-90.0, 0.0, Instant::now()));
                row.gesture_end();
                row
            },
            |row| black_box(row.advance(frame)),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("settle_to_rest", |b| {
        b.iter_batched(
            || {
                let row = dragging_row();
                row.gesture_update(GestureSample::new(-30.0, 0.0, Instant::now()));
                row.gesture_end();
                row
            },
            |row| {
                while row.needs_tick() {
                    row.advance(frame);
                }
                black_box(row.snapshot())
            },
            BatchSize::SmallInput,
        );
    });

    for rows in [16usize, 256] {
        group.bench_function(format!("registry_tick_all/{rows}"), |b| {
            b.iter_batched(
                || {
                    let mut registry = RowRegistry::new(SwipeConfig::default()).expect("config");
                    let start = Instant::now();
                    for key in 0..rows {
                        let row = registry.mount(key);
                        row.gesture_start();
                        row.gesture_update(GestureSample::new(-30.0, 0.0, start));
                        row.gesture_end();
                    }
                    registry.tick_all(start);
                    (registry, start)
                },
                |(registry, start)| black_box(registry.tick_all(start + frame)),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// ===========================================================================
// Snapshot reads
// ===========================================================================

fn bench_snapshot_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_read");

    {
        let row = dragging_row();
        group.bench_function("uncontended", |b| {
            b.iter(|| black_box(row.snapshot()));
        });
    }

    // One writer thread streaming samples while the bench thread reads.
    {
        let row = Arc::new(dragging_row());
        let stop = Arc::new(AtomicBool::new(false));
        let barrier = Arc::new(Barrier::new(2));
        let writer = {
            let row = Arc::clone(&row);
            let stop = Arc::clone(&stop);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let now = Instant::now();
                barrier.wait();
                let mut i = 0u32;
                while !stop.load(Ordering::Relaxed) {
                    i = i.wrapping_add(1);
                    let t = -f64::from(i % 100);
                    row.gesture_update(GestureSample::new(t, 0.0, now));
                }
            })
        };
        barrier.wait();
        group.bench_function("under_input_pressure", |b| {
            b.iter(|| black_box(row.snapshot()));
        });
        stop.store(true, Ordering::Relaxed);
        let _ = writer.join();
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_gesture_update,
    bench_settle_tick,
    bench_snapshot_read
);
criterion_main!(benches);
