use thiserror::Error;

use crate::{AggregateId, EventId};

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// No event with this ID has been appended.
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// No event has been appended for this aggregate.
    #[error("Aggregate not found: {0}")]
    AggregateNotFound(AggregateId),

    /// No event has been appended for any aggregate with this name.
    #[error("No events for aggregate name: {0}")]
    AggregateNameNotFound(String),

    /// The underlying repository failed.
    #[error("Repository error: {0}")]
    Repository(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventStoreError {
    /// Returns true when the error means "absent" rather than "broken".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::EventNotFound(_) | Self::AggregateNotFound(_) | Self::AggregateNameNotFound(_)
        )
    }
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
