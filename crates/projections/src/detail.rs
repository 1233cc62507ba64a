//! Detail read model: one document per locale item.

use async_trait::async_trait;
use broker::Broker;
use common::AggregateId;
use domain::{Aggregate, LocaleItem};

use crate::{
    Result,
    projection::{DETAIL_TOPIC, Projection},
    read_model::DetailRecord,
    sink::DetailStore,
};

/// Maintains the detail read model and announces changes on
/// [`DETAIL_TOPIC`].
pub struct DetailProjection<S: DetailStore> {
    store: S,
    broker: Broker,
}

impl<S: DetailStore> DetailProjection<S> {
    pub fn new(store: S, broker: Broker) -> Self {
        Self { store, broker }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stores the aggregate without announcing it.
    pub async fn persist(&self, aggregate: &LocaleItem) -> Result<AggregateId> {
        let record = DetailRecord::from_aggregate(aggregate)?;
        self.store.upsert(&record).await?;
        Ok(record.aggregate_id)
    }

    /// Returns the stored aggregate, if any.
    pub async fn get_by_id(&self, aggregate_id: AggregateId) -> Result<Option<LocaleItem>> {
        self.store
            .get(aggregate_id)
            .await?
            .map(|record| record.aggregate())
            .transpose()
    }
}

#[async_trait]
impl<S: DetailStore> Projection for DetailProjection<S> {
    fn name(&self) -> &'static str {
        "DetailProjection"
    }

    fn topic(&self) -> &'static str {
        DETAIL_TOPIC
    }

    #[tracing::instrument(skip(self, aggregate), fields(aggregate_id = ?aggregate.id()))]
    async fn project(&self, aggregate: &LocaleItem) -> Result<()> {
        let aggregate_id = self.persist(aggregate).await?;
        metrics::counter!("projections_detail_writes_total").increment(1);

        let delivered = self
            .broker
            .publish(DETAIL_TOPIC, &aggregate_id.to_string())
            .await;
        tracing::debug!(delivered, "detail updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use domain::LocaleItemEvent;

    use super::*;
    use crate::{InMemoryDetailStore, ProjectionError};

    fn item() -> LocaleItem {
        let create = LocaleItemEvent::new_create_event("Hello", "home", "en", "alice").unwrap();
        LocaleItem::reduce(&[create])
    }

    #[tokio::test]
    async fn project_stores_and_announces() {
        let broker = Broker::default();
        let mut updates = broker.subscribe(DETAIL_TOPIC).await;
        let projection = DetailProjection::new(InMemoryDetailStore::new(), broker);
        let item = item();
        let id = item.id().unwrap();

        projection.project(&item).await.unwrap();

        assert_eq!(updates.recv().await, Some(id.to_string()));
        assert_eq!(projection.get_by_id(id).await.unwrap(), Some(item));
    }

    #[tokio::test]
    async fn unknown_id_is_none() {
        let projection = DetailProjection::new(InMemoryDetailStore::new(), Broker::default());
        assert_eq!(projection.get_by_id(AggregateId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn uninitialized_aggregate_is_not_projected() {
        let broker = Broker::default();
        let mut updates = broker.subscribe(DETAIL_TOPIC).await;
        let projection = DetailProjection::new(InMemoryDetailStore::new(), broker);

        let err = projection.project(&LocaleItem::default()).await.unwrap_err();

        assert!(matches!(err, ProjectionError::Uninitialized));
        assert!(projection.store().is_empty().await);
        assert!(updates.try_recv().is_err());
    }
}
