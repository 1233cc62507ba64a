//! Replay-based rebuild of the read models.

use std::{collections::HashMap, sync::Arc};

use common::AggregateId;
use domain::{Aggregate, LocaleItem};
use event_store::{EventEnvelope, EventRepository, EventStore};

use crate::{Result, projection::Projection};

/// Outcome of a rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Aggregates found in the log.
    pub aggregates: usize,
    /// Aggregates skipped because they were never created.
    pub skipped: usize,
    /// Projection writes that failed.
    pub failures: usize,
}

/// Rebuilds every registered projection from the event log.
///
/// Each aggregate is reduced from its full history and written to every
/// projection, so running a rebuild over healthy read models changes
/// nothing.
pub struct ProjectionRebuilder<R: EventRepository> {
    store: EventStore<R>,
    projections: Vec<Arc<dyn Projection>>,
}

impl<R: EventRepository> ProjectionRebuilder<R> {
    /// Creates a new rebuilder reading from the given event store.
    pub fn new(store: EventStore<R>) -> Self {
        Self {
            store,
            projections: Vec::new(),
        }
    }

    /// Registers a projection with this rebuilder.
    pub fn register(&mut self, projection: Arc<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Replays every locale item and rewrites all registered projections.
    ///
    /// A failing projection write is logged and counted; the rebuild goes on
    /// with the next one.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<RebuildReport> {
        let events = match self
            .store
            .retrieve_by_aggregate_name(LocaleItem::aggregate_name())
            .await
        {
            Ok(events) => events,
            Err(e) if e.is_not_found() => {
                tracing::info!("event log is empty, nothing to rebuild");
                return Ok(RebuildReport::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut report = RebuildReport::default();
        for (aggregate_id, history) in group_by_aggregate(events) {
            report.aggregates += 1;

            let aggregate = LocaleItem::reduce(&history);
            if !aggregate.is_initialized() {
                tracing::warn!(%aggregate_id, "aggregate has no create event, skipped");
                report.skipped += 1;
                continue;
            }

            for projection in &self.projections {
                if let Err(e) = projection.project(&aggregate).await {
                    tracing::error!(
                        %aggregate_id,
                        projection = projection.name(),
                        error = %e,
                        "rebuild write failed"
                    );
                    report.failures += 1;
                }
            }
            metrics::counter!("projections_rebuilt_aggregates_total").increment(1);
        }

        tracing::info!(
            aggregates = report.aggregates,
            skipped = report.skipped,
            failures = report.failures,
            "rebuild complete"
        );
        Ok(report)
    }
}

/// Splits the log into per-aggregate histories, keeping append order both
/// across aggregates (by first appearance) and within each one.
fn group_by_aggregate(events: Vec<EventEnvelope>) -> Vec<(AggregateId, Vec<EventEnvelope>)> {
    let mut order = Vec::new();
    let mut histories: HashMap<AggregateId, Vec<EventEnvelope>> = HashMap::new();

    for event in events {
        let history = histories.entry(event.aggregate_id).or_insert_with(|| {
            order.push(event.aggregate_id);
            Vec::new()
        });
        history.push(event);
    }

    order
        .into_iter()
        .filter_map(|id| histories.remove(&id).map(|history| (id, history)))
        .collect()
}
