//! End-to-end tests of the locale pipeline on in-memory storage.

use std::time::Duration;

use actor::{ActorError, BatchConfig};
use broker::Subscription;
use common::AggregateId;
use event_store::InMemoryEventRepository;
use locale_service::{Config, Error, LocaleRuntime, messages::aggregate_address};
use projections::{DETAIL_TOPIC, InMemoryDetailStore, InMemoryListStore, LIST_TOPIC};
use tokio::time::{Instant, timeout};

fn fast_config() -> Config {
    Config {
        batch: BatchConfig {
            max_size: 5,
            max_wait: Duration::from_millis(50),
        },
        request_timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

async fn start(config: Config) -> LocaleRuntime {
    LocaleRuntime::start_with(
        config,
        InMemoryEventRepository::new(),
        InMemoryDetailStore::new(),
        InMemoryListStore::new(),
    )
    .await
    .unwrap()
}

async fn next(subscription: &mut Subscription) -> String {
    timeout(Duration::from_secs(10), subscription.recv())
        .await
        .expect("no announcement in time")
        .expect("subscription closed")
}

#[tokio::test]
async fn create_then_update_flows_into_both_read_models() {
    let runtime = start(fast_config()).await;
    let client = runtime.client();
    let mut details = runtime.broker().subscribe(DETAIL_TOPIC).await;
    let mut lists = runtime.broker().subscribe(LIST_TOPIC).await;

    // create
    let created = client
        .create_locale_item("Hello", "greeting", "en", "alice")
        .await
        .unwrap();
    let id = created.aggregate_id;
    assert_eq!(next(&mut details).await, id.to_string());
    assert_eq!(next(&mut lists).await, "greeting");

    let item = client.get_detail(id).await.unwrap().unwrap();
    assert_eq!(item.context(), "greeting");
    assert_eq!(item.reference_lang(), "en");
    assert_eq!(item.translations().len(), 1);
    let en = item.translation("en").unwrap();
    assert_eq!(en.content, "Hello");
    assert_eq!(en.created_by, "alice");

    let rows = client.get_list_by_context("greeting").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_reference_lang);
    assert_eq!(rows[0].aggregate_id, id);

    // add a translation
    client.update_translation(id, "Ciao", "it", "bob").await.unwrap();
    assert_eq!(next(&mut details).await, id.to_string());
    assert_eq!(next(&mut lists).await, "greeting");

    let item = client.get_detail(id).await.unwrap().unwrap();
    assert_eq!(item.translations().len(), 2);
    let it = item.translation("it").unwrap();
    assert_eq!(it.content, "Ciao");
    assert_eq!(it.created_by, "bob");
    assert_eq!(it.updated_by, "bob");

    let rows = client.get_list_by_context("greeting").await.unwrap();
    assert_eq!(rows.len(), 2);
    let it_row = rows.iter().find(|row| row.lang == "it").unwrap();
    assert!(!it_row.is_reference_lang);

    // replace it
    client.update_translation(id, "Ciao2", "it", "carol").await.unwrap();
    assert_eq!(next(&mut details).await, id.to_string());
    assert_eq!(next(&mut lists).await, "greeting");

    let item = client.get_detail(id).await.unwrap().unwrap();
    assert_eq!(item.translations().len(), 2);
    let it = item.translation("it").unwrap();
    assert_eq!(it.content, "Ciao2");
    assert_eq!(it.created_by, "bob");
    assert_eq!(it.updated_by, "carol");

    assert_eq!(client.get_events(id).await.unwrap().len(), 3);

    runtime.shutdown().await;
}

#[tokio::test]
async fn unknown_items_are_absent() {
    let runtime = start(fast_config()).await;
    let client = runtime.client();
    let unknown = AggregateId::new();

    assert!("zzz".parse::<AggregateId>().is_err());
    assert!(client.get_detail(unknown).await.unwrap().is_none());
    assert!(client.get_list_by_context("nothing").await.unwrap().is_empty());

    let err = client
        .update_translation(unknown, "Ciao", "it", "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(id) if id == unknown));

    let err = client.get_events(unknown).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    runtime.shutdown().await;
}

#[tokio::test]
async fn invalid_commands_are_rejected_before_the_log() {
    let runtime = start(fast_config()).await;
    let client = runtime.client();

    let err = client
        .create_locale_item("", "greeting", "en", "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Domain(_)));

    let snapshot = runtime
        .snapshot(&locale_service::messages::event_store_address())
        .await
        .unwrap();
    assert_eq!(snapshot["appended"], 0);

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn rapid_updates_rebuild_once() {
    let runtime = start(Config {
        batch: BatchConfig::default(),
        ..fast_config()
    })
    .await;
    let client = runtime.client();
    let mut details = runtime.broker().subscribe(DETAIL_TOPIC).await;

    let id = client
        .create_locale_item("Hello", "greeting", "en", "alice")
        .await
        .unwrap()
        .aggregate_id;
    client.update_translation(id, "Hallo", "de", "bob").await.unwrap();
    client.update_translation(id, "Ciao", "it", "bob").await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let snapshot = runtime.snapshot(&aggregate_address()).await.unwrap();
    assert_eq!(snapshot["notifications"], 3);
    assert_eq!(snapshot["rebuilds"], 0);

    assert_eq!(next(&mut details).await, id.to_string());
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(details.try_recv().is_err());

    let snapshot = runtime.snapshot(&aggregate_address()).await.unwrap();
    assert_eq!(snapshot["rebuilds"], 1);

    let item = client.get_detail(id).await.unwrap().unwrap();
    assert_eq!(item.translations().len(), 3);

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn full_batch_rebuilds_without_waiting() {
    let runtime = start(Config {
        batch: BatchConfig {
            max_size: 5,
            max_wait: Duration::from_secs(3600),
        },
        ..fast_config()
    })
    .await;
    let client = runtime.client();
    let mut details = runtime.broker().subscribe(DETAIL_TOPIC).await;
    let start = Instant::now();

    let id = client
        .create_locale_item("Hello", "greeting", "en", "alice")
        .await
        .unwrap()
        .aggregate_id;
    for lang in ["de", "it", "fr", "es"] {
        client.update_translation(id, "x", lang, "bob").await.unwrap();
    }

    assert_eq!(next(&mut details).await, id.to_string());
    assert!(start.elapsed() < Duration::from_secs(3600));

    let item = client.get_detail(id).await.unwrap().unwrap();
    assert_eq!(item.translations().len(), 5);

    runtime.shutdown().await;
}

#[tokio::test]
async fn rebuild_on_start_restores_read_models() {
    let repository = InMemoryEventRepository::new();

    let first = LocaleRuntime::start_with(
        fast_config(),
        repository.clone(),
        InMemoryDetailStore::new(),
        InMemoryListStore::new(),
    )
    .await
    .unwrap();
    let mut details = first.broker().subscribe(DETAIL_TOPIC).await;
    let id = first
        .client()
        .create_locale_item("Hello", "greeting", "en", "alice")
        .await
        .unwrap()
        .aggregate_id;
    next(&mut details).await;
    first.shutdown().await;

    let detail_store = InMemoryDetailStore::new();
    let second = LocaleRuntime::start_with(
        Config {
            rebuild_on_start: true,
            ..fast_config()
        },
        repository,
        detail_store.clone(),
        InMemoryListStore::new(),
    )
    .await
    .unwrap();

    assert_eq!(detail_store.len().await, 1);
    let client = second.client();
    let item = client.get_detail(id).await.unwrap().unwrap();
    assert_eq!(item.translation("en").unwrap().content, "Hello");
    assert_eq!(client.get_list_by_context("greeting").await.unwrap().len(), 1);

    let report = second.rebuild_projections().await.unwrap();
    assert_eq!(report.aggregates, 1);
    assert_eq!(report.failures, 0);

    second.shutdown().await;
}

#[tokio::test]
async fn shutdown_closes_subscriptions_and_rejects_requests() {
    let runtime = start(fast_config()).await;
    let client = runtime.client();
    let mut details = runtime.broker().subscribe(DETAIL_TOPIC).await;

    runtime.shutdown().await;

    assert!(details.recv().await.is_none());
    let err = client.get_detail(AggregateId::new()).await.unwrap_err();
    assert!(matches!(err, Error::Actor(ActorError::UnknownAddress(_))));
}
