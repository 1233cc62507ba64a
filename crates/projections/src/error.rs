//! Projection error types.

use common::AggregateId;
use thiserror::Error;

/// Errors that can occur while maintaining or reading a read model.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The read model storage failed.
    #[error("Sink error: {0}")]
    Sink(#[from] sqlx::Error),

    /// Failed to encode or decode a stored aggregate.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A multi-row write was rolled back.
    #[error("Transaction rolled back for {aggregate_id}: {reason}")]
    Transaction {
        aggregate_id: AggregateId,
        reason: String,
    },

    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    /// The aggregate has no create event and is not projected.
    #[error("Aggregate is not initialized")]
    Uninitialized,
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
