//! Typed access to the article collection.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};

use crate::error::DocumentStoreError;
use crate::models::{DocumentStoreConfig, NewsDocument, PublishDate, TaskStatus};

/// Read/update access to the document collection, narrowed to the operations
/// the worker consumes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Cheap liveness probe.
    async fn health_check(&self) -> Result<(), DocumentStoreError>;

    /// Documents whose status flag for `status_field` is absent or unset,
    /// up to `limit`.
    async fn fetch_unprocessed(
        &self,
        status_field: &str,
        limit: i64,
    ) -> Result<Vec<NewsDocument>, DocumentStoreError>;

    /// Flip the status flag for `status_field` to complete. Returns whether
    /// a row was touched.
    async fn mark_complete(&self, id: i64, status_field: &str)
    -> Result<bool, DocumentStoreError>;
}

/// Postgres-backed document store.
///
/// The articles table is owned by the ingestion service; this client never
/// creates or migrates it. Per-task status flags live in the table's
/// `task_status` JSONB column keyed by status-field name, so "absent or 0"
/// selects both never-attempted and previously-failed documents.
pub struct PostgresDocumentStore {
    pool: PgPool,
    table: String,
}

impl PostgresDocumentStore {
    /// The pool is created lazily; the first health probe opens the actual
    /// connection, which keeps startup under the connection supervisor.
    pub fn new(config: &DocumentStoreConfig) -> Result<Self, DocumentStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_max)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy(&config.url)
            .map_err(|e| DocumentStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            pool,
            table: config.table.clone(),
        })
    }

    /// Close the pool, waiting for in-flight queries to finish.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn map_row(row: &PgRow) -> Result<NewsDocument, DocumentStoreError> {
        let id: i64 = row.try_get("id").map_err(row_error)?;
        let content: Option<String> = row.try_get("content").map_err(row_error)?;
        let title: Option<String> = row.try_get("title").map_err(row_error)?;
        let url: Option<String> = row.try_get("url").map_err(row_error)?;
        let publish_date: Option<String> = row.try_get("publish_date").map_err(row_error)?;

        Ok(NewsDocument {
            id,
            content: content.unwrap_or_default(),
            title,
            url,
            published_at: publish_date.map(|v| PublishDate::parse(&v)),
        })
    }
}

fn row_error(e: sqlx::Error) -> DocumentStoreError {
    DocumentStoreError::RowError(e.to_string())
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn health_check(&self) -> Result<(), DocumentStoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| DocumentStoreError::ConnectionError(e.to_string()))
    }

    async fn fetch_unprocessed(
        &self,
        status_field: &str,
        limit: i64,
    ) -> Result<Vec<NewsDocument>, DocumentStoreError> {
        let query = format!(
            "SELECT id, content, title, url, publish_date FROM {table} \
             WHERE COALESCE((task_status ->> $1)::int, {unset}) = {unset} \
             ORDER BY id LIMIT $2",
            table = self.table,
            unset = TaskStatus::Unset.as_i32(),
        );

        let rows = sqlx::query(&query)
            .bind(status_field)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DocumentStoreError::QueryError(e.to_string()))?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn mark_complete(
        &self,
        id: i64,
        status_field: &str,
    ) -> Result<bool, DocumentStoreError> {
        let query = format!(
            "UPDATE {table} SET task_status = \
             jsonb_set(COALESCE(task_status, '{{}}'::jsonb), ARRAY[$1], '{complete}'::jsonb, true) \
             WHERE id = $2",
            table = self.table,
            complete = TaskStatus::Complete.as_i32(),
        );

        let result = sqlx::query(&query)
            .bind(status_field)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DocumentStoreError::UpdateError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
