use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    AggregateId, EventEnvelope, EventId, EventStoreError, Result, repository::EventRepository,
};

/// Notification emitted after an event has been durably appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAppended {
    /// The aggregate that changed.
    pub aggregate_id: AggregateId,

    /// The kind of change.
    pub event_type: String,
}

impl From<&EventEnvelope> for EventAppended {
    fn from(event: &EventEnvelope) -> Self {
        Self {
            aggregate_id: event.aggregate_id,
            event_type: event.event_type.clone(),
        }
    }
}

/// Receives append notifications from an [`EventStore`].
///
/// Implementations must return promptly: the store calls `notify` on its
/// write path, so any delivery that can wait has to be handed off.
pub trait AppendNotifier: Send + Sync {
    /// Called once per successfully appended event.
    fn notify(&self, notice: EventAppended);
}

impl<F> AppendNotifier for F
where
    F: Fn(EventAppended) + Send + Sync,
{
    fn notify(&self, notice: EventAppended) {
        self(notice)
    }
}

/// Append-only event log over a pluggable repository.
///
/// The store exclusively owns its repository. Appends are the only writes;
/// every successful append is announced to the configured notifier, which is
/// the only link between the write path and the projection pipeline.
pub struct EventStore<R: EventRepository> {
    repository: R,
    notifier: Option<Arc<dyn AppendNotifier>>,
}

impl<R: EventRepository> EventStore<R> {
    /// Creates a store without a notifier.
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            notifier: None,
        }
    }

    /// Sets the notifier told about every successful append.
    pub fn with_notifier(mut self, notifier: Arc<dyn AppendNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Appends an event and announces it.
    ///
    /// Nothing is announced when the append fails.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type, aggregate_id = %event.aggregate_id))]
    pub async fn add(&self, event: &EventEnvelope) -> Result<()> {
        self.repository.append(event).await?;
        metrics::counter!("event_store_appends_total").increment(1);
        tracing::debug!("event appended");

        if let Some(notifier) = &self.notifier {
            notifier.notify(EventAppended::from(event));
        }
        Ok(())
    }

    /// Retrieves all events for an aggregate in append order.
    pub async fn retrieve_by_aggregate_id(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        self.repository
            .retrieve_by_aggregate_id(aggregate_id)
            .await?
            .ok_or(EventStoreError::AggregateNotFound(aggregate_id))
    }

    /// Retrieves all events for every aggregate with the given name.
    pub async fn retrieve_by_aggregate_name(&self, name: &str) -> Result<Vec<EventEnvelope>> {
        self.repository
            .retrieve_by_aggregate_name(name)
            .await?
            .ok_or_else(|| EventStoreError::AggregateNameNotFound(name.to_string()))
    }

    /// Retrieves a single event.
    pub async fn retrieve_by_event_id(&self, id: EventId) -> Result<EventEnvelope> {
        self.repository
            .retrieve_by_id(id)
            .await?
            .ok_or(EventStoreError::EventNotFound(id))
    }

    /// Checks if an aggregate exists (has any events).
    pub async fn exists(&self, aggregate_id: AggregateId) -> Result<bool> {
        Ok(self
            .repository
            .retrieve_by_aggregate_id(aggregate_id)
            .await?
            .is_some())
    }
}
