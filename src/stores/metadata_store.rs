//! SQLite-backed metadata store for photo records.

use super::{MetadataStore, StoreResult};
use crate::models::photo::PhotoRecord;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

/// Schema applied by `--migrate`.
const INIT_SQL: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Clone)]
pub struct SqliteMetadataStore {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
}

impl SqliteMetadataStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Run the embedded schema statements one by one.
    pub async fn migrate(&self) -> StoreResult<usize> {
        let statements = INIT_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        for stmt in &statements {
            debug!("Executing migration SQL: {}", stmt);
            sqlx::query(stmt).execute(&*self.db).await?;
        }

        Ok(statements.len())
    }
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn scan_all(&self) -> StoreResult<Vec<PhotoRecord>> {
        let rows = sqlx::query_as::<_, PhotoRecord>(
            "SELECT image_id, description, s3_url FROM photos",
        )
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }

    async fn put(&self, record: &PhotoRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO photos (image_id, description, s3_url)
            VALUES (?, ?, ?)
            ON CONFLICT(image_id) DO UPDATE SET
                description = excluded.description,
                s3_url = excluded.s3_url
            "#,
        )
        .bind(&record.image_id)
        .bind(&record.description)
        .bind(&record.s3_url)
        .execute(&*self.db)
        .await?;
        Ok(())
    }

    async fn delete(&self, image_id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM photos WHERE image_id = ?")
            .bind(image_id)
            .execute(&*self.db)
            .await?;
        debug!(image_id, rows = result.rows_affected(), "deleted photo row");
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await?;
        Ok(())
    }
}
