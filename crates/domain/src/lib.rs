//! Domain layer for locale management.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate trait for event-sourced entities, with a replaying reducer
//! - DomainEvent trait for decoding stored events
//! - LocaleItem aggregate: one translatable text with its translations

pub mod aggregate;
pub mod error;
pub mod locale_item;

pub use aggregate::{Aggregate, DomainEvent, Recorded};
pub use error::{DomainError, Result};
pub use locale_item::{
    CREATE_EVENT_TYPE, EMPTY_CONTEXT, LOCALE_ITEM_AGGREGATE, LocaleItem, LocaleItemCreated,
    LocaleItemEvent, TranslationItem, TranslationUpdated, UPDATE_EVENT_TYPE,
};
