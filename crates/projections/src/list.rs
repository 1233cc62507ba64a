//! List read model: one row per translation, queried by context.

use async_trait::async_trait;
use broker::Broker;
use domain::{Aggregate, LocaleItem};

use crate::{
    ProjectionError, Result,
    projection::{LIST_TOPIC, Projection},
    read_model::ListRow,
    sink::{ListStore, ListTransaction},
};

/// Maintains the list read model and announces changes on [`LIST_TOPIC`].
pub struct ListProjection<S: ListStore> {
    store: S,
    broker: Broker,
}

impl<S: ListStore> ListProjection<S> {
    pub fn new(store: S, broker: Broker) -> Self {
        Self { store, broker }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Writes every translation row of the aggregate in one transaction.
    ///
    /// Either all rows are written or none are.
    pub async fn persist(&self, aggregate: &LocaleItem) -> Result<()> {
        let rows = ListRow::from_aggregate(aggregate)?;
        let aggregate_id = aggregate.id().ok_or(ProjectionError::Uninitialized)?;

        let mut tx = self.store.begin().await?;
        for row in &rows {
            if let Err(e) = tx.upsert(row).await {
                tracing::error!(%aggregate_id, lang = %row.lang, error = %e, "list row upsert failed");
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(%aggregate_id, error = %rollback, "rollback failed");
                }
                return Err(ProjectionError::Transaction {
                    aggregate_id,
                    reason: e.to_string(),
                });
            }
        }
        tx.commit().await
    }

    /// Returns every row of a context. An unknown context yields no rows.
    pub async fn get_by_context(&self, context: &str) -> Result<Vec<ListRow>> {
        self.store.get_by_context(context).await
    }
}

#[async_trait]
impl<S: ListStore> Projection for ListProjection<S> {
    fn name(&self) -> &'static str {
        "ListProjection"
    }

    fn topic(&self) -> &'static str {
        LIST_TOPIC
    }

    #[tracing::instrument(skip(self, aggregate), fields(aggregate_id = ?aggregate.id()))]
    async fn project(&self, aggregate: &LocaleItem) -> Result<()> {
        self.persist(aggregate).await?;
        metrics::counter!("projections_list_writes_total").increment(1);

        let delivered = self.broker.publish(LIST_TOPIC, aggregate.context()).await;
        tracing::debug!(delivered, context = aggregate.context(), "list updated");
        Ok(())
    }
}
