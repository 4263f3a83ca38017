//! Notifier fan-out benchmarks
//!
//! Measures the cost of one broadcast pass over N registered observers, and
//! of the engine-side handoff into the dispatcher queue.
//!
//! Run with: `cargo bench --bench notifier_fanout`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::expect_used)] // Benchmarks can use expect for setup

use boxoffice_core::{SeatId, SeatUpdate};
use boxoffice_runtime::{AvailabilityNotifier, NotifierConfig, NotifierHandle, Observer};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use std::time::Duration;

fn update() -> SeatUpdate {
    SeatUpdate::new((1..=4).map(SeatId::new).collect())
}

/// One broadcast to N observers, draining each buffer so nobody is dropped.
fn bench_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("notifier_broadcast");
    group.measurement_time(Duration::from_secs(5));

    for observers in [1usize, 10, 100, 1_000] {
        let notifier = AvailabilityNotifier::new(&NotifierConfig::default());
        let mut receivers: Vec<Observer> = (0..observers).map(|_| notifier.subscribe()).collect();
        let update = update();

        group.bench_with_input(
            BenchmarkId::from_parameter(observers),
            &observers,
            |b, _| {
                b.iter(|| {
                    let report = notifier.broadcast(black_box(&update));
                    for receiver in &mut receivers {
                        black_box(receiver.try_recv());
                    }
                    report
                });
            },
        );
    }

    group.finish();
}

/// Engine-side cost of `notify` with a running dispatcher.
fn bench_handoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("notifier_handoff");
    group.measurement_time(Duration::from_secs(5));

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let notifier = Arc::new(AvailabilityNotifier::new(&NotifierConfig::default()));
    let handle: NotifierHandle = runtime.block_on(async {
        let (handle, _task) = notifier.spawn_dispatcher(1_024);
        handle
    });

    group.bench_function("notify_no_observers", |b| {
        b.to_async(&runtime).iter(|| async {
            black_box(handle.notify(vec![SeatId::new(1), SeatId::new(2)]));
            tokio::task::yield_now().await;
        });
    });

    group.finish();
}

criterion_group!(benches, bench_broadcast, bench_handoff);
criterion_main!(benches);
