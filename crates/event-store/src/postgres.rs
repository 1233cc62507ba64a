use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{AggregateId, EventEnvelope, EventId, Result, repository::EventRepository};

const SELECT_EVENTS: &str = r#"
    SELECT id, event_type, aggregate_id, aggregate_name, created_at, created_by, payload
    FROM events
"#;

/// PostgreSQL-backed event repository implementation.
///
/// Append order is the `position` column (a `BIGSERIAL`), never the
/// `created_at` timestamp.
#[derive(Clone)]
pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    /// Creates a new PostgreSQL event repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations for the event log and the read models.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_event(row: PgRow) -> Result<EventEnvelope> {
        Ok(EventEnvelope {
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_type: row.try_get("event_type")?,
            aggregate_id: AggregateId::from_uuid(row.try_get::<Uuid, _>("aggregate_id")?),
            aggregate_name: row.try_get("aggregate_name")?,
            created_at: row.try_get("created_at")?,
            created_by: row.try_get("created_by")?,
            payload: row.try_get("payload")?,
        })
    }

    fn rows_to_events(rows: Vec<PgRow>) -> Result<Option<Vec<EventEnvelope>>> {
        if rows.is_empty() {
            return Ok(None);
        }
        rows.into_iter()
            .map(Self::row_to_event)
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepository {
    async fn append(&self, event: &EventEnvelope) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (id, event_type, aggregate_id, aggregate_name, created_at, created_by, payload)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.event_id.as_uuid())
        .bind(&event.event_type)
        .bind(event.aggregate_id.as_uuid())
        .bind(&event.aggregate_name)
        .bind(event.created_at)
        .bind(&event.created_by)
        .bind(&event.payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn retrieve_by_id(&self, id: EventId) -> Result<Option<EventEnvelope>> {
        let row: Option<PgRow> = sqlx::query(&format!("{SELECT_EVENTS} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_event).transpose()
    }

    async fn retrieve_by_aggregate_id(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Option<Vec<EventEnvelope>>> {
        let rows = sqlx::query(&format!(
            "{SELECT_EVENTS} WHERE aggregate_id = $1 ORDER BY position ASC"
        ))
        .bind(aggregate_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Self::rows_to_events(rows)
    }

    async fn retrieve_by_aggregate_name(&self, name: &str) -> Result<Option<Vec<EventEnvelope>>> {
        let rows = sqlx::query(&format!(
            "{SELECT_EVENTS} WHERE aggregate_name = $1 ORDER BY position ASC"
        ))
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        Self::rows_to_events(rows)
    }
}
