use std::time::Duration;

use actor::Address;
use common::AggregateId;
use domain::{LocaleItem, LocaleItemEvent};
use event_store::EventEnvelope;
use projections::ListRow;

use crate::{
    Error, Result,
    messages::{
        Command, LocaleSystem, Reply, client_address, detail_address, event_store_address,
        list_address,
    },
};

/// Request API of a running [`LocaleRuntime`](crate::LocaleRuntime).
///
/// Every call is a request/reply exchange bounded by the configured request
/// timeout. Writes return once the event is in the log; the read models catch
/// up asynchronously.
#[derive(Clone)]
pub struct LocaleClient {
    system: LocaleSystem,
    address: Address,
    timeout: Duration,
}

impl LocaleClient {
    pub fn new(system: LocaleSystem, timeout: Duration) -> Self {
        Self {
            system,
            address: client_address(),
            timeout,
        }
    }

    async fn ask(&self, to: &Address, command: Command) -> Result<Reply> {
        Ok(self
            .system
            .send_with_reply(&self.address, to, command, self.timeout)
            .await?)
    }

    async fn add_event(&self, event: EventEnvelope) -> Result<EventEnvelope> {
        match self
            .ask(&event_store_address(), Command::AddEvent { event: event.clone() })
            .await?
        {
            Reply::EventAdded(result) => result.map(|()| event),
            _ => Err(Error::UnexpectedReply {
                expected: "EventAdded",
            }),
        }
    }

    /// Creates a new locale item with its reference translation.
    ///
    /// Returns the appended event; its `aggregate_id` identifies the item.
    #[tracing::instrument(skip(self, content))]
    pub async fn create_locale_item(
        &self,
        content: &str,
        context: &str,
        lang: &str,
        user: &str,
    ) -> Result<EventEnvelope> {
        let event = LocaleItemEvent::new_create_event(content, context, lang, user)?;
        self.add_event(event).await
    }

    /// Adds or replaces one translation of an existing locale item.
    #[tracing::instrument(skip(self, content))]
    pub async fn update_translation(
        &self,
        aggregate_id: AggregateId,
        content: &str,
        lang: &str,
        user: &str,
    ) -> Result<EventEnvelope> {
        let event = LocaleItemEvent::new_update_event(aggregate_id, content, lang, user)?;

        match self
            .ask(&event_store_address(), Command::CheckExistence { aggregate_id })
            .await?
        {
            Reply::Existence(Ok(true)) => {}
            Reply::Existence(Ok(false)) => return Err(Error::NotFound(aggregate_id)),
            Reply::Existence(Err(e)) => return Err(e),
            _ => {
                return Err(Error::UnexpectedReply {
                    expected: "Existence",
                });
            }
        }

        self.add_event(event).await
    }

    /// Full event history of a locale item, in append order.
    pub async fn get_events(&self, aggregate_id: AggregateId) -> Result<Vec<EventEnvelope>> {
        match self
            .ask(&event_store_address(), Command::GetEvents { aggregate_id })
            .await?
        {
            Reply::Events(result) => result,
            _ => Err(Error::UnexpectedReply { expected: "Events" }),
        }
    }

    /// The item as last written to the detail read model, if any.
    pub async fn get_detail(&self, aggregate_id: AggregateId) -> Result<Option<LocaleItem>> {
        match self
            .ask(&detail_address(), Command::GetDetail { aggregate_id })
            .await?
        {
            Reply::Detail(result) => result,
            _ => Err(Error::UnexpectedReply { expected: "Detail" }),
        }
    }

    /// Every translation row of a context. Unknown contexts yield no rows.
    pub async fn get_list_by_context(&self, context: &str) -> Result<Vec<ListRow>> {
        match self
            .ask(
                &list_address(),
                Command::GetListByContext {
                    context: context.to_string(),
                },
            )
            .await?
        {
            Reply::List(result) => result,
            _ => Err(Error::UnexpectedReply { expected: "List" }),
        }
    }
}
