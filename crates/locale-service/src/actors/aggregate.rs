use std::time::Duration;

use async_trait::async_trait;
use common::AggregateId;
use domain::{Aggregate, LocaleItem};
use event_store::EventAppended;
use futures_util::FutureExt;
use serde_json::json;

use actor::{Actor, BatchConfig, BatchEntry, Batcher, Message};

use crate::{
    Error, Result,
    messages::{
        Command, LocaleContext, Reply, detail_address, event_store_address, list_address,
    },
};

/// Turns append announcements into fresh read model input.
///
/// Announcements are coalesced per locale item. Each flush rebuilds the item
/// once from its full history and sends it to both projection actors.
pub struct AggregateActor {
    batch: BatchConfig,
    request_timeout: Duration,
    batcher: Option<Batcher<AggregateId, EventAppended>>,
    notifications: u64,
    rebuilds: u64,
    skipped: u64,
}

impl AggregateActor {
    pub fn new(batch: BatchConfig, request_timeout: Duration) -> Self {
        Self {
            batch,
            request_timeout,
            batcher: None,
            notifications: 0,
            rebuilds: 0,
            skipped: 0,
        }
    }

    #[tracing::instrument(skip(self, ctx))]
    async fn rebuild(&mut self, ctx: &LocaleContext, aggregate_id: AggregateId) -> Result<()> {
        let reply = ctx
            .ask(
                &event_store_address(),
                Command::GetEvents { aggregate_id },
                self.request_timeout,
            )
            .await?;
        let events = match reply {
            Reply::Events(events) => events?,
            _ => return Err(Error::UnexpectedReply { expected: "Events" }),
        };

        let aggregate = LocaleItem::reduce(&events);
        if !aggregate.is_initialized() {
            self.skipped += 1;
            tracing::warn!(events = events.len(), "locale item has no create event, not projected");
            return Ok(());
        }

        self.rebuilds += 1;
        metrics::counter!("aggregate_rebuilds_total").increment(1);
        tracing::debug!(events = events.len(), "locale item rebuilt");

        ctx.tell(
            &detail_address(),
            Command::ProjectAggregate {
                aggregate: aggregate.clone(),
            },
        )
        .await?;
        ctx.tell(&list_address(), Command::ProjectAggregate { aggregate })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Actor<Command, Reply> for AggregateActor {
    async fn started(&mut self, ctx: &LocaleContext) {
        let system = ctx.system().clone();
        let address = ctx.address().clone();
        let timeout = self.request_timeout;

        // Flushes are routed back through the mailbox so rebuilds run on the
        // actor's task, one at a time.
        let batcher = Batcher::new(
            self.batch,
            move |aggregate_id: AggregateId, entry: BatchEntry<EventAppended>| {
                let system = system.clone();
                let address = address.clone();
                async move {
                    tracing::debug!(
                        %aggregate_id,
                        coalesced = entry.count,
                        last_event = %entry.latest.event_type,
                        "flushing locale item"
                    );
                    let reply = system
                        .send_with_reply(
                            &address,
                            &address,
                            Command::RebuildAggregate { aggregate_id },
                            timeout,
                        )
                        .await;
                    match reply {
                        Ok(Reply::Rebuilt(Ok(()))) => {}
                        Ok(Reply::Rebuilt(Err(e))) => {
                            tracing::error!(%aggregate_id, error = %e, "failed to rebuild locale item");
                        }
                        Ok(_) => tracing::error!(%aggregate_id, "unexpected reply to rebuild"),
                        Err(e) => {
                            tracing::warn!(%aggregate_id, error = %e, "rebuild request not answered");
                        }
                    }
                }
                .boxed()
            },
        );
        self.batcher = Some(batcher);
    }

    async fn handle(&mut self, ctx: &LocaleContext, message: Message<Command, Reply>) {
        let (command, reply) = message.split();
        match command {
            Command::EventAppended(notice) => {
                self.notifications += 1;
                if let Some(batcher) = &self.batcher {
                    batcher.add(notice.aggregate_id, notice);
                }
            }
            Command::RebuildAggregate { aggregate_id } => {
                let result = self.rebuild(ctx, aggregate_id).await;
                reply.send(Reply::Rebuilt(result));
            }
            other @ (Command::AddEvent { .. }
            | Command::CheckExistence { .. }
            | Command::GetEvents { .. }
            | Command::ProjectAggregate { .. }
            | Command::GetDetail { .. }
            | Command::GetListByContext { .. }) => {
                tracing::warn!(command = ?other, from = %reply.requester(), "unsupported command");
            }
        }
    }

    async fn shutdown(&mut self) {
        if let Some(batcher) = self.batcher.take() {
            batcher.close();
        }
        tracing::info!(
            notifications = self.notifications,
            rebuilds = self.rebuilds,
            "aggregate actor stopped"
        );
    }

    fn snapshot_state(&self) -> serde_json::Value {
        json!({
            "notifications": self.notifications,
            "rebuilds": self.rebuilds,
            "skipped": self.skipped,
            "pending": self.batcher.as_ref().map_or(0, Batcher::active_keys),
        })
    }
}
