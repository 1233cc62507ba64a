//! Core aggregate and domain event traits.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::EventEnvelope;
use serde::Serialize;

use crate::error::Result;

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and travel through the event log as JSON payloads
/// tagged with their event type.
pub trait DomainEvent: Serialize + Send + Sync + Clone + Sized {
    /// Returns the event type name.
    ///
    /// This is the discriminant stored next to the payload in the event log.
    fn event_type(&self) -> &'static str;

    /// Decodes a stored payload.
    ///
    /// Returns `Ok(None)` for event types this event family does not know,
    /// and an error when the type is known but the payload does not match.
    fn decode(event_type: &str, payload: &serde_json::Value) -> Result<Option<Self>>;
}

/// A decoded event together with the metadata the log recorded for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded<E> {
    pub aggregate_id: AggregateId,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub event: E,
}

impl<E> Recorded<E> {
    /// Pairs a decoded event with the envelope it came from.
    pub fn from_envelope(envelope: &EventEnvelope, event: E) -> Self {
        Self {
            aggregate_id: envelope.aggregate_id,
            created_at: envelope.created_at,
            created_by: envelope.created_by.clone(),
            event,
        }
    }
}

/// Trait for aggregates in an event-sourced system.
///
/// In event sourcing, aggregates:
/// - Are rebuilt by replaying their full history
/// - Apply events to update state (pure, deterministic)
/// - Never read the wall clock; every timestamp comes from an event
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate consumes.
    type Event: DomainEvent;

    /// Returns the aggregate name under which its events are stored.
    fn aggregate_name() -> &'static str;

    /// Returns the aggregate's unique identifier.
    ///
    /// Returns None for a new, uninitialized aggregate.
    fn id(&self) -> Option<AggregateId>;

    /// Applies an event to the aggregate, updating its state.
    ///
    /// This method must be pure and deterministic:
    /// - Given the same state and event, it must always produce the same new state
    /// - It must not have side effects
    /// - It must not fail (events represent facts that have happened)
    fn apply(&mut self, event: Recorded<Self::Event>);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Recorded<Self::Event>>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Rebuilds an aggregate from its stored history, oldest first.
    ///
    /// Starts from the default (sentinel) aggregate. Events of an unknown
    /// type are skipped, as are events whose payload cannot be decoded.
    fn reduce(events: &[EventEnvelope]) -> Self {
        let mut aggregate = Self::default();

        for envelope in events {
            match Self::Event::decode(&envelope.event_type, &envelope.payload) {
                Ok(Some(event)) => aggregate.apply(Recorded::from_envelope(envelope, event)),
                Ok(None) => {
                    tracing::debug!(
                        event_type = %envelope.event_type,
                        aggregate = Self::aggregate_name(),
                        "skipping unknown event type"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        event_id = %envelope.event_id,
                        event_type = %envelope.event_type,
                        error = %e,
                        "skipping undecodable event"
                    );
                }
            }
        }

        aggregate
    }
}
