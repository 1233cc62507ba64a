//! Wiring of the locale pipeline.

use std::sync::Arc;

use broker::Broker;
use event_store::{EventAppended, EventRepository, EventStore, InMemoryEventRepository, PostgresEventRepository};
use futures_util::{FutureExt, future::BoxFuture};
use projections::{
    DetailProjection, DetailStore, InMemoryDetailStore, InMemoryListStore, ListProjection,
    ListStore, PostgresDetailStore, PostgresListStore, ProjectionRebuilder, RebuildReport,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;

use actor::Address;

use crate::{
    Config, LocaleClient, Result,
    actors::{AggregateActor, DetailActor, EventStoreActor, ListActor},
    messages::{
        Command, LocaleSystem, aggregate_address, detail_address, event_store_address,
        list_address,
    },
};

type RebuildFn = Arc<dyn Fn() -> BoxFuture<'static, projections::Result<RebuildReport>> + Send + Sync>;

/// A running locale pipeline: the actor system, its actors and its storage.
pub struct LocaleRuntime {
    config: Config,
    system: LocaleSystem,
    rebuild: RebuildFn,
}

impl LocaleRuntime {
    /// Starts the pipeline on the storage named by the configuration.
    pub async fn start(config: Config) -> Result<Self> {
        match config.database_url.clone() {
            Some(url) => {
                tracing::info!("connecting to PostgreSQL");
                let pool = PgPoolOptions::new()
                    .max_connections(config.database_max_connections)
                    .connect(&url)
                    .await
                    .map_err(event_store::EventStoreError::from)?;

                let repository = PostgresEventRepository::new(pool.clone());
                repository
                    .run_migrations()
                    .await
                    .map_err(event_store::EventStoreError::from)?;
                tracing::info!("migrations applied");

                Self::start_with(
                    config,
                    repository,
                    PostgresDetailStore::new(pool.clone()),
                    PostgresListStore::new(pool),
                )
                .await
            }
            None => {
                tracing::info!("using in-memory storage");
                Self::start_with(
                    config,
                    InMemoryEventRepository::new(),
                    InMemoryDetailStore::new(),
                    InMemoryListStore::new(),
                )
                .await
            }
        }
    }

    /// Starts the pipeline on the given storage.
    pub async fn start_with<R, D, L>(config: Config, repository: R, detail: D, list: L) -> Result<Self>
    where
        R: EventRepository + Clone + 'static,
        D: DetailStore + Clone + 'static,
        L: ListStore + Clone + 'static,
    {
        let system = LocaleSystem::new(config.system_config());
        let rebuild = rebuild_fn(
            repository.clone(),
            detail.clone(),
            list.clone(),
            system.broker().clone(),
        );

        // Projections first so that teardown stops them last.
        system
            .register(detail_address(), DetailActor::new(detail, system.broker().clone()))
            .await?;
        system
            .register(list_address(), ListActor::new(list, system.broker().clone()))
            .await?;
        system
            .register(
                aggregate_address(),
                AggregateActor::new(config.batch, config.request_timeout),
            )
            .await?;

        let store = EventStore::new(repository).with_notifier(Arc::new(notifier(system.clone())));
        system
            .register(event_store_address(), EventStoreActor::new(store))
            .await?;

        let runtime = Self {
            config,
            system,
            rebuild,
        };

        if runtime.config.rebuild_on_start {
            let report = runtime.rebuild_projections().await?;
            tracing::info!(?report, "read models rebuilt from the event log");
        }

        tracing::info!("locale runtime started");
        Ok(runtime)
    }

    /// A client for issuing requests against this runtime.
    pub fn client(&self) -> LocaleClient {
        LocaleClient::new(self.system.clone(), self.config.request_timeout)
    }

    pub fn system(&self) -> &LocaleSystem {
        &self.system
    }

    /// The broker on which read model changes are announced.
    pub fn broker(&self) -> &Broker {
        self.system.broker()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Diagnostic state of one actor.
    pub async fn snapshot(&self, address: &Address) -> Result<Value> {
        Ok(self.system.snapshot_state(address).await?)
    }

    /// Replays the whole event log into both read models.
    pub async fn rebuild_projections(&self) -> Result<RebuildReport> {
        Ok((self.rebuild)().await?)
    }

    /// Stops every actor and closes the broker.
    pub async fn shutdown(self) {
        tracing::info!("shutting down locale runtime");
        self.system.shutdown_all().await;
    }
}

/// Forwards append announcements to the aggregate actor without blocking
/// the append.
fn notifier(system: LocaleSystem) -> impl Fn(EventAppended) + Send + Sync + 'static {
    move |notice: EventAppended| {
        let system = system.clone();
        tokio::spawn(async move {
            let aggregate_id = notice.aggregate_id;
            if let Err(e) = system
                .tell(
                    &event_store_address(),
                    &aggregate_address(),
                    Command::EventAppended(notice),
                )
                .await
            {
                tracing::warn!(%aggregate_id, error = %e, "append announcement not delivered");
            }
        });
    }
}

fn rebuild_fn<R, D, L>(repository: R, detail: D, list: L, broker: Broker) -> RebuildFn
where
    R: EventRepository + Clone + 'static,
    D: DetailStore + Clone + 'static,
    L: ListStore + Clone + 'static,
{
    Arc::new(move || {
        let mut rebuilder = ProjectionRebuilder::new(EventStore::new(repository.clone()));
        rebuilder.register(Arc::new(DetailProjection::new(detail.clone(), broker.clone())));
        rebuilder.register(Arc::new(ListProjection::new(list.clone(), broker.clone())));
        async move { rebuilder.rebuild_all().await }.boxed()
    })
}
