use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{AggregateId, EventEnvelope, EventId, Result, repository::EventRepository};

/// In-memory event repository implementation for testing.
///
/// This implementation stores all events in memory and provides
/// the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryEventRepository {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
}

impl InMemoryEventRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    fn non_empty(events: Vec<EventEnvelope>) -> Option<Vec<EventEnvelope>> {
        if events.is_empty() {
            None
        } else {
            Some(events)
        }
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn append(&self, event: &EventEnvelope) -> Result<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn retrieve_by_id(&self, id: EventId) -> Result<Option<EventEnvelope>> {
        let store = self.events.read().await;
        Ok(store.iter().find(|e| e.event_id == id).cloned())
    }

    async fn retrieve_by_aggregate_id(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Option<Vec<EventEnvelope>>> {
        let store = self.events.read().await;
        let events: Vec<_> = store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        Ok(Self::non_empty(events))
    }

    async fn retrieve_by_aggregate_name(&self, name: &str) -> Result<Option<Vec<EventEnvelope>>> {
        let store = self.events.read().await;
        let events: Vec<_> = store
            .iter()
            .filter(|e| e.aggregate_name == name)
            .cloned()
            .collect();
        Ok(Self::non_empty(events))
    }
}
