//! Core projection trait.

use async_trait::async_trait;
use domain::LocaleItem;

use crate::Result;

/// Topic announcing that a detail record changed; the payload is the
/// aggregate ID.
pub const DETAIL_TOPIC: &str = "detail";

/// Topic announcing that a context's list changed; the payload is the
/// context.
pub const LIST_TOPIC: &str = "list";

/// A read model kept up to date from freshly reduced aggregates.
///
/// Projections receive the whole aggregate, never single events, so writing
/// the same aggregate twice leaves the read model unchanged.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// Topic published to after each successful write.
    fn topic(&self) -> &'static str;

    /// Persists the aggregate's read model and announces the change.
    async fn project(&self, aggregate: &LocaleItem) -> Result<()>;
}
