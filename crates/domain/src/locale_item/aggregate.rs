//! LocaleItem aggregate implementation.

use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, Recorded};

use super::{
    LOCALE_ITEM_AGGREGATE, LocaleItemEvent, TranslationItem,
    events::{LocaleItemCreated, TranslationUpdated},
};

/// Context of a locale item that has not been created yet.
pub const EMPTY_CONTEXT: &str = "no-context";

/// LocaleItem aggregate root.
///
/// A translatable text identified by its aggregate ID, grouped under a
/// context, with at most one translation per language. The language of the
/// create event is the reference language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleItem {
    /// Unique identifier, None until the create event is applied.
    id: Option<AggregateId>,

    context: String,

    reference_lang: String,

    /// Translations in the order their languages first appeared.
    translations: Vec<TranslationItem>,
}

impl Default for LocaleItem {
    fn default() -> Self {
        Self {
            id: None,
            context: EMPTY_CONTEXT.to_string(),
            reference_lang: String::new(),
            translations: Vec::new(),
        }
    }
}

impl Aggregate for LocaleItem {
    type Event = LocaleItemEvent;

    fn aggregate_name() -> &'static str {
        LOCALE_ITEM_AGGREGATE
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn apply(&mut self, recorded: Recorded<Self::Event>) {
        let Recorded {
            aggregate_id,
            created_at,
            created_by,
            event,
        } = recorded;

        match event {
            LocaleItemEvent::Created(LocaleItemCreated {
                content,
                context,
                lang,
            }) => {
                self.id = Some(aggregate_id);
                self.context = context;
                self.reference_lang = lang.clone();
                self.upsert_translation(lang, content, &created_by, created_at);
            }
            LocaleItemEvent::TranslationUpdated(TranslationUpdated { content, lang }) => {
                self.upsert_translation(lang, content, &created_by, created_at);
            }
        }
    }
}

impl LocaleItem {
    fn upsert_translation(
        &mut self,
        lang: String,
        content: String,
        user: &str,
        at: chrono::DateTime<chrono::Utc>,
    ) {
        match self.translations.iter_mut().find(|t| t.lang == lang) {
            Some(existing) => existing.update(content, user, at),
            None => {
                tracing::debug!(%lang, "new translation item");
                self.translations
                    .push(TranslationItem::new(lang, content, user, at));
            }
        }
    }
}

// Query methods
impl LocaleItem {
    /// Returns the context, or [`EMPTY_CONTEXT`] before creation.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Returns the reference language, empty before creation.
    pub fn reference_lang(&self) -> &str {
        &self.reference_lang
    }

    /// Returns all translations.
    pub fn translations(&self) -> &[TranslationItem] {
        &self.translations
    }

    /// Returns the translation for a language.
    pub fn translation(&self, lang: &str) -> Option<&TranslationItem> {
        self.translations.iter().find(|t| t.lang == lang)
    }

    /// Returns the translation in the reference language.
    pub fn reference_translation(&self) -> Option<&TranslationItem> {
        self.translation(&self.reference_lang)
    }

    /// Returns true once a create event has been applied.
    pub fn is_initialized(&self) -> bool {
        self.id.is_some()
    }
}
