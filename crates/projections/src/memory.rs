//! In-memory read model storage.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use common::AggregateId;
use tokio::sync::RwLock;

use crate::{
    Result,
    read_model::{DetailRecord, ListRow},
    sink::{DetailStore, ListStore, ListTransaction},
};

/// In-memory [`DetailStore`], for tests and database-less runs.
#[derive(Clone, Default)]
pub struct InMemoryDetailStore {
    records: Arc<RwLock<HashMap<AggregateId, DetailRecord>>>,
}

impl InMemoryDetailStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl DetailStore for InMemoryDetailStore {
    async fn upsert(&self, record: &DetailRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.aggregate_id, record.clone());
        Ok(())
    }

    async fn get(&self, aggregate_id: AggregateId) -> Result<Option<DetailRecord>> {
        Ok(self.records.read().await.get(&aggregate_id).cloned())
    }
}

type Rows = BTreeMap<(AggregateId, String), ListRow>;

/// In-memory [`ListStore`], for tests and database-less runs.
#[derive(Clone, Default)]
pub struct InMemoryListStore {
    rows: Arc<RwLock<Rows>>,
}

impl InMemoryListStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl ListStore for InMemoryListStore {
    type Transaction = InMemoryListTransaction;

    async fn begin(&self) -> Result<Self::Transaction> {
        Ok(InMemoryListTransaction {
            rows: Arc::clone(&self.rows),
            staged: Vec::new(),
        })
    }

    async fn get_by_context(&self, context: &str) -> Result<Vec<ListRow>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|row| row.context == context)
            .cloned()
            .collect())
    }
}

/// Writes staged in memory and applied at once on commit.
pub struct InMemoryListTransaction {
    rows: Arc<RwLock<Rows>>,
    staged: Vec<ListRow>,
}

#[async_trait]
impl ListTransaction for InMemoryListTransaction {
    async fn upsert(&mut self, row: &ListRow) -> Result<()> {
        self.staged.push(row.clone());
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let mut rows = self.rows.write().await;
        for row in self.staged {
            rows.insert(row.key(), row);
        }
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn row(aggregate_id: AggregateId, lang: &str, content: &str, context: &str) -> ListRow {
        ListRow {
            aggregate_id,
            lang: lang.to_string(),
            content: content.to_string(),
            context: context.to_string(),
            updated_at: Utc::now(),
            updated_by: "alice".to_string(),
            is_reference_lang: lang == "en",
        }
    }

    #[tokio::test]
    async fn rows_are_visible_only_after_commit() {
        let store = InMemoryListStore::new();
        let id = AggregateId::new();

        let mut tx = store.begin().await.unwrap();
        tx.upsert(&row(id, "en", "Hello", "home")).await.unwrap();
        assert!(store.get_by_context("home").await.unwrap().is_empty());

        tx.commit().await.unwrap();
        assert_eq!(store.get_by_context("home").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rollback_discards_staged_rows() {
        let store = InMemoryListStore::new();
        let id = AggregateId::new();

        let mut tx = store.begin().await.unwrap();
        tx.upsert(&row(id, "en", "Hello", "home")).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn upsert_replaces_same_key() {
        let store = InMemoryListStore::new();
        let id = AggregateId::new();

        for content in ["Hello", "Hi"] {
            let mut tx = store.begin().await.unwrap();
            tx.upsert(&row(id, "en", content, "home")).await.unwrap();
            tx.commit().await.unwrap();
        }

        let rows = store.get_by_context("home").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].content, "Hi");
    }

    #[tokio::test]
    async fn detail_upsert_and_get() {
        let store = InMemoryDetailStore::new();
        let id = AggregateId::new();
        let record = DetailRecord {
            aggregate_id: id,
            updated_at: Utc::now(),
            data: serde_json::json!({ "v": 1 }),
        };

        store.upsert(&record).await.unwrap();
        store
            .upsert(&DetailRecord {
                data: serde_json::json!({ "v": 2 }),
                ..record.clone()
            })
            .await
            .unwrap();

        let found = store.get(id).await.unwrap().unwrap();
        assert_eq!(found.data["v"], 2);
        assert_eq!(store.len().await, 1);
        assert!(store.get(AggregateId::new()).await.unwrap().is_none());
    }
}
