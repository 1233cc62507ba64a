//! The closed message protocol spoken between the service's actors.

use actor::{ActorSystem, Address, Context};
use common::AggregateId;
use domain::LocaleItem;
use event_store::{EventAppended, EventEnvelope};
use projections::ListRow;

use crate::Result;

/// Every request an actor of the service understands.
#[derive(Debug)]
pub enum Command {
    /// Append an event to the log.
    AddEvent { event: EventEnvelope },
    /// Ask whether an aggregate has any events.
    CheckExistence { aggregate_id: AggregateId },
    /// Fetch the full history of an aggregate.
    GetEvents { aggregate_id: AggregateId },
    /// An event was appended.
    EventAppended(EventAppended),
    /// Reduce an aggregate from its history and update the read models.
    RebuildAggregate { aggregate_id: AggregateId },
    /// Write a freshly reduced aggregate into a read model.
    ProjectAggregate { aggregate: LocaleItem },
    GetDetail { aggregate_id: AggregateId },
    GetListByContext { context: String },
}

/// Every answer an actor of the service gives.
#[derive(Debug)]
pub enum Reply {
    EventAdded(Result<()>),
    Existence(Result<bool>),
    Events(Result<Vec<EventEnvelope>>),
    Rebuilt(Result<()>),
    Detail(Result<Option<LocaleItem>>),
    List(Result<Vec<ListRow>>),
}

pub type LocaleSystem = ActorSystem<Command, Reply>;
pub type LocaleContext = Context<Command, Reply>;

const NAMESPACE: &str = "local";

/// Owner of the event log.
pub fn event_store_address() -> Address {
    Address::new(NAMESPACE, "event-store")
}

/// Coalesces append notifications and rebuilds aggregates.
pub fn aggregate_address() -> Address {
    Address::new(NAMESPACE, "localeitem-aggregate")
}

/// Maintains the detail read model.
pub fn detail_address() -> Address {
    Address::new(NAMESPACE, "detail-aggregate-persister")
}

/// Maintains the list read model.
pub fn list_address() -> Address {
    Address::new(NAMESPACE, "list-aggregate-persister")
}

/// Sender address of requests made through a [`LocaleClient`](crate::LocaleClient).
pub fn client_address() -> Address {
    Address::new(NAMESPACE, "localeitem-client")
}
