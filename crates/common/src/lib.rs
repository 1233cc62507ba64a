//! Shared identifiers for the locale management workspace.

mod types;

pub use types::AggregateId;
