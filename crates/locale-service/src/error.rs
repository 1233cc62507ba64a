//! Service error types.

use actor::ActorError;
use common::AggregateId;
use domain::DomainError;
use event_store::EventStoreError;
use projections::ProjectionError;
use thiserror::Error;

/// Errors surfaced by the locale service.
#[derive(Debug, Error)]
pub enum Error {
    /// No locale item with this ID exists.
    #[error("Locale item not found: {0}")]
    NotFound(AggregateId),

    /// A request could not be delivered or was not answered.
    #[error(transparent)]
    Actor(#[from] ActorError),

    /// The event log failed.
    #[error(transparent)]
    EventStore(#[from] EventStoreError),

    /// A read model failed.
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// The request was invalid.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// An actor answered with the wrong kind of reply.
    #[error("Unexpected reply, expected {expected}")]
    UnexpectedReply { expected: &'static str },

    /// The configuration could not be loaded.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns true for request deadlines that a caller may retry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Actor(ActorError::Timeout { .. }))
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, Error>;
