//! Append-only event log for locale items.
//!
//! - [`EventEnvelope`] is the immutable stored form of a domain event
//! - [`EventRepository`] is the pluggable storage contract, with an
//!   in-memory and a PostgreSQL implementation
//! - [`EventStore`] appends through a repository and announces each append

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{ANONYMOUS_USER, EventEnvelope, EventEnvelopeBuilder, EventId};
pub use memory::InMemoryEventRepository;
pub use postgres::PostgresEventRepository;
pub use repository::EventRepository;
pub use store::{AppendNotifier, EventAppended, EventStore};
