//! PostgreSQL read model storage.

use async_trait::async_trait;
use common::AggregateId;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result,
    read_model::{DetailRecord, ListRow},
    sink::{DetailStore, ListStore, ListTransaction},
};

/// [`DetailStore`] over the `localeitem_detail` table.
#[derive(Clone)]
pub struct PostgresDetailStore {
    pool: PgPool,
}

impl PostgresDetailStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DetailStore for PostgresDetailStore {
    async fn upsert(&self, record: &DetailRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO localeitem_detail (aggregate_id, updated_at, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (aggregate_id)
            DO UPDATE SET updated_at = EXCLUDED.updated_at, data = EXCLUDED.data
            "#,
        )
        .bind(record.aggregate_id.as_uuid())
        .bind(record.updated_at)
        .bind(&record.data)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, aggregate_id: AggregateId) -> Result<Option<DetailRecord>> {
        let row: Option<PgRow> = sqlx::query(
            "SELECT aggregate_id, updated_at, data FROM localeitem_detail WHERE aggregate_id = $1",
        )
        .bind(aggregate_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(DetailRecord {
                aggregate_id: AggregateId::from_uuid(row.try_get::<Uuid, _>("aggregate_id")?),
                updated_at: row.try_get("updated_at")?,
                data: row.try_get("data")?,
            })
        })
        .transpose()
    }
}

/// [`ListStore`] over the `localeitems_list` table.
#[derive(Clone)]
pub struct PostgresListStore {
    pool: PgPool,
}

impl PostgresListStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_list_row(row: PgRow) -> Result<ListRow> {
        Ok(ListRow {
            aggregate_id: AggregateId::from_uuid(row.try_get::<Uuid, _>("aggregate_id")?),
            lang: row.try_get("lang")?,
            content: row.try_get("content")?,
            context: row.try_get("context")?,
            updated_at: row.try_get("updated_at")?,
            updated_by: row.try_get("updated_by")?,
            is_reference_lang: row.try_get("is_lang_reference")?,
        })
    }
}

#[async_trait]
impl ListStore for PostgresListStore {
    type Transaction = PostgresListTransaction;

    async fn begin(&self) -> Result<Self::Transaction> {
        Ok(PostgresListTransaction {
            tx: self.pool.begin().await?,
        })
    }

    async fn get_by_context(&self, context: &str) -> Result<Vec<ListRow>> {
        let rows = sqlx::query(
            r#"
            SELECT aggregate_id, lang, content, context, updated_at, updated_by, is_lang_reference
            FROM localeitems_list
            WHERE context = $1
            ORDER BY aggregate_id, lang
            "#,
        )
        .bind(context)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_list_row).collect()
    }
}

/// A database transaction on `localeitems_list`.
pub struct PostgresListTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ListTransaction for PostgresListTransaction {
    async fn upsert(&mut self, row: &ListRow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO localeitems_list
                (aggregate_id, lang, content, context, updated_at, updated_by, is_lang_reference)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (aggregate_id, lang)
            DO UPDATE SET
                content = EXCLUDED.content,
                context = EXCLUDED.context,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by,
                is_lang_reference = EXCLUDED.is_lang_reference
            "#,
        )
        .bind(row.aggregate_id.as_uuid())
        .bind(&row.lang)
        .bind(&row.content)
        .bind(&row.context)
        .bind(row.updated_at)
        .bind(&row.updated_by)
        .bind(row.is_reference_lang)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
