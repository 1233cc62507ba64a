//! The actors of the locale pipeline.
//!
//! Appends go to [`EventStoreActor`], which announces each one to
//! [`AggregateActor`]. The aggregate actor coalesces announcements per item,
//! reduces the item from its history and hands the result to
//! [`DetailActor`] and [`ListActor`].

mod aggregate;
mod detail;
mod event_store;
mod list;

pub use aggregate::AggregateActor;
pub use detail::DetailActor;
pub use event_store::EventStoreActor;
pub use list::ListActor;
