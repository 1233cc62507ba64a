//! Rows stored by the read models.

use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{Aggregate, LocaleItem};
use serde::{Deserialize, Serialize};

use crate::{ProjectionError, Result};

/// One translation of one locale item, as listed by context.
///
/// Keyed by `(aggregate_id, lang)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRow {
    pub aggregate_id: AggregateId,
    pub lang: String,
    pub content: String,
    pub context: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
    pub is_reference_lang: bool,
}

impl ListRow {
    /// Flattens an aggregate into one row per translation.
    pub fn from_aggregate(aggregate: &LocaleItem) -> Result<Vec<ListRow>> {
        let aggregate_id = aggregate.id().ok_or(ProjectionError::Uninitialized)?;

        Ok(aggregate
            .translations()
            .iter()
            .map(|t| ListRow {
                aggregate_id,
                lang: t.lang.clone(),
                content: t.content.clone(),
                context: aggregate.context().to_string(),
                updated_at: t.updated_at,
                updated_by: if t.updated_by.is_empty() {
                    t.created_by.clone()
                } else {
                    t.updated_by.clone()
                },
                is_reference_lang: t.lang == aggregate.reference_lang(),
            })
            .collect())
    }

    pub(crate) fn key(&self) -> (AggregateId, String) {
        (self.aggregate_id, self.lang.clone())
    }
}

/// The full serialized aggregate, looked up by ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub aggregate_id: AggregateId,
    /// Latest change among the aggregate's translations.
    pub updated_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl DetailRecord {
    pub fn from_aggregate(aggregate: &LocaleItem) -> Result<DetailRecord> {
        let aggregate_id = aggregate.id().ok_or(ProjectionError::Uninitialized)?;
        let updated_at = aggregate
            .translations()
            .iter()
            .map(|t| t.updated_at)
            .max()
            .ok_or(ProjectionError::Uninitialized)?;

        Ok(DetailRecord {
            aggregate_id,
            updated_at,
            data: serde_json::to_value(aggregate)?,
        })
    }

    /// Decodes the stored aggregate.
    pub fn aggregate(&self) -> Result<LocaleItem> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}
