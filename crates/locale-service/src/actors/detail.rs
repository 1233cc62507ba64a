use async_trait::async_trait;
use broker::Broker;
use domain::Aggregate;
use projections::{DetailProjection, DetailStore, Projection};
use serde_json::json;

use actor::{Actor, Message};

use crate::{
    Error,
    messages::{Command, LocaleContext, Reply},
};

/// Serves and maintains the detail read model.
///
/// A failed write is logged and dropped; the next rebuild of the same item
/// overwrites the record anyway.
pub struct DetailActor<S: DetailStore> {
    projection: DetailProjection<S>,
    projected: u64,
    failed: u64,
}

impl<S: DetailStore + 'static> DetailActor<S> {
    pub fn new(store: S, broker: Broker) -> Self {
        Self {
            projection: DetailProjection::new(store, broker),
            projected: 0,
            failed: 0,
        }
    }
}

#[async_trait]
impl<S: DetailStore + 'static> Actor<Command, Reply> for DetailActor<S> {
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
                            error = %e,
                            "failed to update detail read model"
                        );
                    }
                }
            }
            Command::GetDetail { aggregate_id } => {
                let result = self.projection.get_by_id(aggregate_id).await;
                reply.send(Reply::Detail(result.map_err(Error::from)));
            }
            other @ (Command::AddEvent { .. }
            | Command::CheckExistence { .. }
            | Command::GetEvents { .. }
            | Command::EventAppended(_)
            | Command::RebuildAggregate { .. }
            | Command::GetListByContext { .. }) => {
                tracing::warn!(command = ?other, from = %reply.requester(), "unsupported command");
            }
        }
    }

    fn snapshot_state(&self) -> serde_json::Value {
        json!({ "projected": self.projected, "failed": self.failed })
    }
}
