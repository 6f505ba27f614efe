//! Broadcast throughput per dispatching policy.
//!
//! Run with: cargo bench -p herald-events --bench broadcast

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use herald_events::{
    Broadcaster, BroadcasterConfig, EventBroadcasting, EventDispatcher, EventTag,
    InlineDispatcher, KeyedQueueDispatcher, QueueDispatcher, QueueDispatcherConfig, TaggedEvent,
};

const TICK: EventTag = EventTag::from_static("Bench:tick");

fn broadcaster(
    dispatcher: Arc<dyn EventDispatcher>,
    subscribers: usize,
) -> Broadcaster<TaggedEvent<u64>> {
    let bus = Broadcaster::with_config(
        BroadcasterConfig::default()
            .with_name("bench")
            .with_dispatcher(dispatcher),
    );
    let total = Arc::new(AtomicU64::new(0));
    for _ in 0..subscribers {
        let total = Arc::clone(&total);
        bus.subscribe(TICK, move |ev: &TaggedEvent<u64>| {
            total.fetch_add(*ev.payload(), Ordering::Relaxed);
            Ok(())
        });
    }
    bus
}

fn dispatchers() -> Vec<(&'static str, Arc<dyn EventDispatcher>)> {
    let config = QueueDispatcherConfig::default().with_thread_name("bench-queue");
    let queue = QueueDispatcher::spawn(config).expect("failed to spawn bench queue");
    vec![
        ("inline", Arc::new(InlineDispatcher)),
        ("queue", Arc::new(queue)),
        ("keyed_queue", Arc::new(KeyedQueueDispatcher::with_prefix("bench-keyed"))),
    ]
}

fn bench_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast");

    for (name, dispatcher) in dispatchers() {
        for subscribers in [1usize, 16, 128] {
            let bus = broadcaster(Arc::clone(&dispatcher), subscribers);
            group.bench_with_input(BenchmarkId::new(name, subscribers), &subscribers, |b, _| {
                b.iter(|| {
                    bus.broadcast(TaggedEvent::new(TICK, black_box(1u64)))
                        .expect("bench handlers never fail")
                })
            });
        }
    }

    group.finish();
}

fn bench_subscribe(c: &mut Criterion) {
    let mut group = c.benchmark_group("subscribe");

    group.bench_function("subscribe_then_unsubscribe", |b| {
        let bus: Broadcaster<TaggedEvent<u64>> = Broadcaster::with_config(
            BroadcasterConfig::default().with_dispatcher(Arc::new(InlineDispatcher)),
        );
        b.iter(|| {
            let id = bus.subscribe(TICK, |_: &TaggedEvent<u64>| Ok(()));
            black_box(bus.unsubscribe(id, TICK))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_broadcast, bench_subscribe);
criterion_main!(benches);
