//! Integration tests: event log → ProjectionRebuilder → both read models.

use std::sync::Arc;

use broker::Broker;
use common::AggregateId;
use domain::LocaleItemEvent;
use event_store::{EventEnvelope, EventStore, InMemoryEventRepository};
use projections::{
    DETAIL_TOPIC, DetailProjection, InMemoryDetailStore, InMemoryListStore, LIST_TOPIC,
    ListProjection, ProjectionRebuilder, RebuildReport,
};

struct Setup {
    repository: InMemoryEventRepository,
    broker: Broker,
    detail: Arc<DetailProjection<InMemoryDetailStore>>,
    list: Arc<ListProjection<InMemoryListStore>>,
    rebuilder: ProjectionRebuilder<InMemoryEventRepository>,
}

fn setup() -> Setup {
    let repository = InMemoryEventRepository::new();
    let broker = Broker::default();
    let detail = Arc::new(DetailProjection::new(
        InMemoryDetailStore::new(),
        broker.clone(),
    ));
    let list = Arc::new(ListProjection::new(InMemoryListStore::new(), broker.clone()));

    let mut rebuilder = ProjectionRebuilder::new(EventStore::new(repository.clone()));
    rebuilder.register(detail.clone());
    rebuilder.register(list.clone());

    Setup {
        repository,
        broker,
        detail,
        list,
        rebuilder,
    }
}

async fn append(repository: &InMemoryEventRepository, events: &[EventEnvelope]) {
    let store = EventStore::new(repository.clone());
    for event in events {
        store.add(event).await.unwrap();
    }
}

#[tokio::test]
async fn rebuild_populates_both_read_models() {
    let s = setup();
    let home = LocaleItemEvent::new_create_event("Hello", "home", "en", "alice").unwrap();
    let home_id = home.aggregate_id;
    let bye = LocaleItemEvent::new_create_event("Bye", "home", "en", "alice").unwrap();
    let menu = LocaleItemEvent::new_create_event("File", "menu", "en", "alice").unwrap();
    append(
        &s.repository,
        &[
            home,
            bye,
            LocaleItemEvent::new_update_event(home_id, "Ciao", "it", "bob").unwrap(),
            menu,
        ],
    )
    .await;

    let report = s.rebuilder.rebuild_all().await.unwrap();

    assert_eq!(
        report,
        RebuildReport {
            aggregates: 3,
            skipped: 0,
            failures: 0,
        }
    );
    assert_eq!(s.list.get_by_context("home").await.unwrap().len(), 3);
    assert_eq!(s.list.get_by_context("menu").await.unwrap().len(), 1);

    let detail = s.detail.get_by_id(home_id).await.unwrap().unwrap();
    assert_eq!(detail.translation("it").unwrap().content, "Ciao");
    assert_eq!(s.detail.store().len().await, 3);
}

#[tokio::test]
async fn rebuild_is_idempotent() {
    let s = setup();
    let create = LocaleItemEvent::new_create_event("Hello", "home", "en", "alice").unwrap();
    append(&s.repository, &[create]).await;

    s.rebuilder.rebuild_all().await.unwrap();
    let first = s.list.get_by_context("home").await.unwrap();
    s.rebuilder.rebuild_all().await.unwrap();
    let second = s.list.get_by_context("home").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(s.detail.store().len().await, 1);
}

#[tokio::test]
async fn rebuild_announces_each_aggregate() {
    let s = setup();
    let mut details = s.broker.subscribe(DETAIL_TOPIC).await;
    let mut lists = s.broker.subscribe(LIST_TOPIC).await;
    let create = LocaleItemEvent::new_create_event("Hello", "home", "en", "alice").unwrap();
    let id = create.aggregate_id;
    append(&s.repository, &[create]).await;

    s.rebuilder.rebuild_all().await.unwrap();

    assert_eq!(details.recv().await, Some(id.to_string()));
    assert_eq!(lists.recv().await.as_deref(), Some("home"));
}

#[tokio::test]
async fn rebuild_skips_aggregates_without_create() {
    let s = setup();
    let orphan = LocaleItemEvent::new_update_event(AggregateId::new(), "Hallo", "de", "bob").unwrap();
    append(&s.repository, &[orphan]).await;

    let report = s.rebuilder.rebuild_all().await.unwrap();

    assert_eq!(report.aggregates, 1);
    assert_eq!(report.skipped, 1);
    assert!(s.detail.store().is_empty().await);
    assert_eq!(s.list.store().len().await, 0);
}

#[tokio::test]
async fn rebuild_of_empty_log_does_nothing() {
    let s = setup();
    assert_eq!(s.rebuilder.projection_count(), 2);

    let report = s.rebuilder.rebuild_all().await.unwrap();
    assert_eq!(report, RebuildReport::default());
}
