use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use service_facility::prelude::*;
use service_facility::{LogSink, MinimumDelay};
use std::sync::Arc;
use std::time::Duration;

fn benchmark_room_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("room_admission");

    group.bench_function("fill_and_drain_1000", |b| {
        b.iter_batched(
            || WaitingRoom::new(1000),
            |room| {
                for id in 0..1000 {
                    room.try_enqueue(Client::new(id)).expect("seat available");
                }
                room.close();
                while let Some(client) = room.dequeue() {
                    black_box(client);
                }
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("reject_when_full_1000", |b| {
        let room = WaitingRoom::new(1);
        room.try_enqueue(Client::new(0)).expect("seat available");
        b.iter(|| {
            for id in 1..=1000 {
                black_box(room.try_enqueue(Client::new(id)).is_err());
            }
        });
    });

    group.finish();
}

fn benchmark_facility_day(c: &mut Criterion) {
    c.bench_function("facility_open_serve_close", |b| {
        b.iter(|| {
            let config = FacilityConfig::new(4)
                .with_capacity(100)
                .with_service_time(DelayRange::fixed(Duration::ZERO));
            let facility = Facility::builder(config)
                .event_sink(Arc::new(LogSink))
                .delay_source(Arc::new(MinimumDelay))
                .open()
                .expect("Failed to open facility");
            for id in 0..100 {
                let _ = facility.add_client(Client::new(id));
            }
            black_box(facility.close_for_day().expect("Failed to close"));
        });
    });
}

criterion_group!(benches, benchmark_room_admission, benchmark_facility_day);
criterion_main!(benches);
