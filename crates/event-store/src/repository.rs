use async_trait::async_trait;

use crate::{AggregateId, EventEnvelope, EventId, Result};

/// Storage backend behind an [`EventStore`](crate::EventStore).
///
/// Every lookup separates "not found" (`Ok(None)`) from a failing backend
/// (`Err`). Event sequences are returned in append order.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Appends one event to the end of the log.
    ///
    /// Appended events are never updated or removed.
    async fn append(&self, event: &EventEnvelope) -> Result<()>;

    /// Retrieves a single event by its ID.
    async fn retrieve_by_id(&self, id: EventId) -> Result<Option<EventEnvelope>>;

    /// Retrieves every event of one aggregate, oldest first.
    ///
    /// Returns None if the aggregate has no events.
    async fn retrieve_by_aggregate_id(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Option<Vec<EventEnvelope>>>;

    /// Retrieves every event of every aggregate with this name, oldest first.
    ///
    /// Returns None if no such event exists.
    async fn retrieve_by_aggregate_name(&self, name: &str) -> Result<Option<Vec<EventEnvelope>>>;
}
