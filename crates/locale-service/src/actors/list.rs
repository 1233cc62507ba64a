use async_trait::async_trait;
use broker::Broker;
use domain::Aggregate;
use projections::{ListProjection, ListStore, Projection};
use serde_json::json;

use actor::{Actor, Message};

use crate::{
    Error,
    messages::{Command, LocaleContext, Reply},
};

/// Serves and maintains the list read model.
pub struct ListActor<S: ListStore> {
    projection: ListProjection<S>,
    projected: u64,
    failed: u64,
}

impl<S: ListStore + 'static> ListActor<S> {
    pub fn new(store: S, broker: Broker) -> Self {
        Self {
            projection: ListProjection::new(store, broker),
            projected: 0,
            failed: 0,
        }
    }
}

#[async_trait]
impl<S: ListStore + 'static> Actor<Command, Reply> for ListActor<S> {
    async fn handle(&mut self, _ctx: &LocaleContext, message: Message<Command, Reply>) {
        let (command, reply) = message.split();
        match command {
            Command::ProjectAggregate { aggregate } => {
                match self.projection.project(&aggregate).await {
                    Ok(()) => self.projected += 1,
                    Err(e) => {
                        self.failed += 1;
                        metrics::counter!("projection_failures_total", "projection" => self.projection.name())
                            .increment(1);
                        tracing::error!(
                            aggregate_id = ?aggregate.id(),
                            context = aggregate.context(),
                            error = %e,
                            "failed to update list read model"
                        );
                    }
                }
            }
            Command::GetListByContext { context } => {
                let result = self.projection.get_by_context(&context).await;
                reply.send(Reply::List(result.map_err(Error::from)));
            }
            other @ (Command::AddEvent { .. }
            | Command::CheckExistence { .. }
            | Command::GetEvents { .. }
            | Command::EventAppended(_)
            | Command::RebuildAggregate { .. }
            | Command::GetDetail { .. }) => {
                tracing::warn!(command = ?other, from = %reply.requester(), "unsupported command");
            }
        }
    }

    fn snapshot_state(&self) -> serde_json::Value {
        json!({ "projected": self.projected, "failed": self.failed })
    }
}
