//! LocaleItem aggregate and related types.

mod aggregate;
mod events;
mod translation;

pub use aggregate::{EMPTY_CONTEXT, LocaleItem};
pub use events::{
    CREATE_EVENT_TYPE, LOCALE_ITEM_AGGREGATE, LocaleItemCreated, LocaleItemEvent,
    TranslationUpdated, UPDATE_EVENT_TYPE,
};
pub use translation::TranslationItem;
