//! Storage contracts for the read models.

use async_trait::async_trait;
use common::AggregateId;

use crate::{
    Result,
    read_model::{DetailRecord, ListRow},
};

/// Storage for [`DetailRecord`]s.
#[async_trait]
pub trait DetailStore: Send + Sync {
    /// Inserts the record or replaces the one with the same aggregate ID.
    async fn upsert(&self, record: &DetailRecord) -> Result<()>;

    async fn get(&self, aggregate_id: AggregateId) -> Result<Option<DetailRecord>>;
}

/// Storage for [`ListRow`]s.
#[async_trait]
pub trait ListStore: Send + Sync {
    type Transaction: ListTransaction;

    /// Starts a transaction; nothing it writes is visible before commit.
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Returns every row of a context, ordered by aggregate and language.
    async fn get_by_context(&self, context: &str) -> Result<Vec<ListRow>>;
}

/// A pending set of [`ListRow`] writes.
///
/// Dropping a transaction without committing it discards its writes.
#[async_trait]
pub trait ListTransaction: Send {
    /// Inserts the row or replaces the one with the same `(aggregate_id, lang)`.
    async fn upsert(&mut self, row: &ListRow) -> Result<()>;

    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}
