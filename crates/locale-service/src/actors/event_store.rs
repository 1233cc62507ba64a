use async_trait::async_trait;
use event_store::{EventRepository, EventStore, EventStoreError};
use serde_json::json;

use actor::{Actor, Message};

use crate::{
    Error,
    messages::{Command, LocaleContext, Reply},
};

/// Owns the event log. Every write to the log goes through this actor.
pub struct EventStoreActor<R: EventRepository> {
    store: EventStore<R>,
    appended: u64,
}

impl<R: EventRepository + 'static> EventStoreActor<R> {
    pub fn new(store: EventStore<R>) -> Self {
        Self { store, appended: 0 }
    }
}

#[async_trait]
impl<R: EventRepository + 'static> Actor<Command, Reply> for EventStoreActor<R> {
    async fn handle(&mut self, _ctx: &LocaleContext, message: Message<Command, Reply>) {
        let (command, reply) = message.split();
        match command {
            Command::AddEvent { event } => {
                let result = self.store.add(&event).await;
                match &result {
                    Ok(()) => self.appended += 1,
                    Err(e) => tracing::error!(
                        event_id = %event.event_id,
                        aggregate_id = %event.aggregate_id,
                        error = %e,
                        "failed to append event"
                    ),
                }
                reply.send(Reply::EventAdded(result.map_err(Error::from)));
            }
            Command::CheckExistence { aggregate_id } => {
                let result = self.store.exists(aggregate_id).await;
                reply.send(Reply::Existence(result.map_err(Error::from)));
            }
            Command::GetEvents { aggregate_id } => {
                let result = self
                    .store
                    .retrieve_by_aggregate_id(aggregate_id)
                    .await
                    .map_err(|e| match e {
                        EventStoreError::AggregateNotFound(id) => Error::NotFound(id),
                        other => Error::from(other),
                    });
                reply.send(Reply::Events(result));
            }
            other @ (Command::EventAppended(_)
            | Command::RebuildAggregate { .. }
            | Command::ProjectAggregate { .. }
            | Command::GetDetail { .. }
            | Command::GetListByContext { .. }) => {
                tracing::warn!(command = ?other, from = %reply.requester(), "unsupported command");
            }
        }
    }

    async fn shutdown(&mut self) {
        tracing::info!(appended = self.appended, "event store stopped");
    }

    fn snapshot_state(&self) -> serde_json::Value {
        json!({ "appended": self.appended })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actor::ActorSystem;
    use common::AggregateId;
    use domain::LocaleItemEvent;
    use event_store::InMemoryEventRepository;

    use super::*;
    use crate::messages::{client_address, event_store_address};

    const TIMEOUT: Duration = Duration::from_secs(1);

    async fn system() -> ActorSystem<Command, Reply> {
        let system = ActorSystem::default();
        system
            .register(
                event_store_address(),
                EventStoreActor::new(EventStore::new(InMemoryEventRepository::new())),
            )
            .await
            .unwrap();
        system
    }

    async fn ask(system: &ActorSystem<Command, Reply>, command: Command) -> Reply {
        system
            .send_with_reply(&client_address(), &event_store_address(), command, TIMEOUT)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn appended_events_are_readable() {
        let system = system().await;
        let event = LocaleItemEvent::new_create_event("Hello", "home", "en", "alice").unwrap();
        let aggregate_id = event.aggregate_id;

        let reply = ask(&system, Command::AddEvent { event }).await;
        assert!(matches!(reply, Reply::EventAdded(Ok(()))));

        let reply = ask(&system, Command::CheckExistence { aggregate_id }).await;
        assert!(matches!(reply, Reply::Existence(Ok(true))));

        let Reply::Events(Ok(events)) = ask(&system, Command::GetEvents { aggregate_id }).await
        else {
            panic!("expected events");
        };
        assert_eq!(events.len(), 1);

        let snapshot = system.snapshot_state(&event_store_address()).await.unwrap();
        assert_eq!(snapshot["appended"], 1);
    }

    #[tokio::test]
    async fn unknown_aggregate_is_not_found() {
        let system = system().await;
        let aggregate_id = AggregateId::new();

        let reply = ask(&system, Command::CheckExistence { aggregate_id }).await;
        assert!(matches!(reply, Reply::Existence(Ok(false))));

        let reply = ask(&system, Command::GetEvents { aggregate_id }).await;
        assert!(matches!(reply, Reply::Events(Err(Error::NotFound(id))) if id == aggregate_id));
    }

    #[tokio::test]
    async fn unsupported_command_gets_no_reply() {
        let system = system().await;

        let err = system
            .send_with_reply(
                &client_address(),
                &event_store_address(),
                Command::GetListByContext {
                    context: "home".to_string(),
                },
                TIMEOUT,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, actor::ActorError::NoReply(_)));
    }
}
