use common::AggregateId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Aggregate, LocaleItem, LocaleItemEvent};
use event_store::EventEnvelope;

const LANGS: [&str; 5] = ["en", "it", "de", "fr", "es"];

fn make_history(updates: usize) -> Vec<EventEnvelope> {
    let create = LocaleItemEvent::new_create_event("Hello", "home", "en", "bench").unwrap();
    let id: AggregateId = create.aggregate_id;

    let mut events = vec![create];
    for i in 0..updates {
        let lang = LANGS[i % LANGS.len()];
        events.push(
            LocaleItemEvent::new_update_event(id, format!("text {i}"), lang, "bench").unwrap(),
        );
    }
    events
}

fn bench_reduce_small(c: &mut Criterion) {
    let events = make_history(10);

    c.bench_function("domain/reduce_10_events", |b| {
        b.iter(|| LocaleItem::reduce(&events));
    });
}

fn bench_reduce_large(c: &mut Criterion) {
    let events = make_history(1000);

    c.bench_function("domain/reduce_1000_events", |b| {
        b.iter(|| LocaleItem::reduce(&events));
    });
}

fn bench_new_update_event(c: &mut Criterion) {
    let id = AggregateId::new();

    c.bench_function("domain/new_update_event", |b| {
        b.iter(|| LocaleItemEvent::new_update_event(id, "Hallo", "de", "bench").unwrap());
    });
}

criterion_group!(
    benches,
    bench_reduce_small,
    bench_reduce_large,
    bench_new_update_event,
);
criterion_main!(benches);
