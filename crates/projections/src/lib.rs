//! Read models for locale items.
//!
//! This crate provides the query side of the locale pipeline:
//! - [`Projection`] trait for writing a reduced aggregate into a read model
//! - [`DetailProjection`]: the whole aggregate by ID
//! - [`ListProjection`]: one row per translation, queried by context
//! - [`DetailStore`] / [`ListStore`] storage contracts with in-memory and
//!   PostgreSQL implementations
//! - [`ProjectionRebuilder`] for repopulating read models from the event log

pub mod detail;
pub mod error;
pub mod list;
pub mod memory;
pub mod postgres;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod sink;

pub use detail::DetailProjection;
pub use error::{ProjectionError, Result};
pub use list::ListProjection;
pub use memory::{InMemoryDetailStore, InMemoryListStore};
pub use postgres::{PostgresDetailStore, PostgresListStore};
pub use processor::{ProjectionRebuilder, RebuildReport};
pub use projection::{DETAIL_TOPIC, LIST_TOPIC, Projection};
pub use read_model::{DetailRecord, ListRow};
pub use sink::{DetailStore, ListStore, ListTransaction};
