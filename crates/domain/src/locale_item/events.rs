//! LocaleItem domain events.

use common::AggregateId;
use event_store::EventEnvelope;
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::DomainEvent,
    error::{DomainError, Result},
};

/// Aggregate name under which locale item events are stored.
pub const LOCALE_ITEM_AGGREGATE: &str = "localeitem";

/// Event type of [`LocaleItemCreated`].
pub const CREATE_EVENT_TYPE: &str = "created-localeitem";

/// Event type of [`TranslationUpdated`].
pub const UPDATE_EVENT_TYPE: &str = "update-translation";

/// Events that can occur on a locale item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LocaleItemEvent {
    /// A locale item was created with its reference translation.
    Created(LocaleItemCreated),

    /// A translation was added or changed.
    TranslationUpdated(TranslationUpdated),
}

/// Data for the created event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocaleItemCreated {
    /// Text in the reference language.
    pub content: String,

    /// Grouping the item belongs to (e.g. a screen or a feature).
    pub context: String,

    /// Reference language of the item.
    pub lang: String,
}

/// Data for the translation updated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TranslationUpdated {
    /// New text.
    pub content: String,

    /// Language of the text.
    pub lang: String,
}

impl DomainEvent for LocaleItemEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LocaleItemEvent::Created(_) => CREATE_EVENT_TYPE,
            LocaleItemEvent::TranslationUpdated(_) => UPDATE_EVENT_TYPE,
        }
    }

    fn decode(event_type: &str, payload: &serde_json::Value) -> Result<Option<Self>> {
        let event = match event_type {
            CREATE_EVENT_TYPE => {
                LocaleItemEvent::Created(serde_json::from_value(payload.clone())?)
            }
            UPDATE_EVENT_TYPE => {
                LocaleItemEvent::TranslationUpdated(serde_json::from_value(payload.clone())?)
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

fn required(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::MissingField(field));
    }
    Ok(())
}

impl LocaleItemEvent {
    /// Builds the event that creates a new locale item.
    ///
    /// A fresh aggregate ID is generated for it.
    pub fn new_create_event(
        content: impl Into<String>,
        context: impl Into<String>,
        lang: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<EventEnvelope> {
        let data = LocaleItemCreated {
            content: content.into(),
            context: context.into(),
            lang: lang.into(),
        };
        required(&data.content, "content")?;
        required(&data.context, "context")?;
        required(&data.lang, "lang")?;

        Self::Created(data).into_envelope(AggregateId::new(), user.into())
    }

    /// Builds the event that adds or changes one translation of an
    /// existing locale item.
    pub fn new_update_event(
        aggregate_id: AggregateId,
        content: impl Into<String>,
        lang: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<EventEnvelope> {
        let data = TranslationUpdated {
            content: content.into(),
            lang: lang.into(),
        };
        required(&data.content, "content")?;
        required(&data.lang, "lang")?;

        Self::TranslationUpdated(data).into_envelope(aggregate_id, user.into())
    }

    fn into_envelope(self, aggregate_id: AggregateId, user: String) -> Result<EventEnvelope> {
        let builder = EventEnvelope::builder()
            .event_type(self.event_type())
            .aggregate_id(aggregate_id)
            .aggregate_name(LOCALE_ITEM_AGGREGATE)
            .created_by(user);

        let builder = match &self {
            LocaleItemEvent::Created(data) => builder.payload(data)?,
            LocaleItemEvent::TranslationUpdated(data) => builder.payload(data)?,
        };
        Ok(builder.build())
    }
}
