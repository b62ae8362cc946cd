use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{DocumentFilter, EntityStore};

/// SQLite implementation of the entity store. One table holds every
/// collection; documents are stored as JSON text.
pub struct SqliteEntityStore {
    pool: SqlitePool,
}

impl SqliteEntityStore {
    pub async fn new(database_url: &str, max_connections: u32) -> AppResult<Self> {
        ensure_parent_dir(database_url)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to connect to {}: {}", database_url, e))
            })?;

        let store = Self { pool };
        store.initialize().await?;
        info!("Entity store ready at {}", database_url);
        Ok(store)
    }

    /// Private in-memory database. A single connection, since every
    /// `:memory:` connection opens its own empty database.
    pub async fn new_in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Create the documents table if it does not exist yet.
    pub async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                time_created INTEGER NOT NULL,
                time_updated INTEGER NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create documents table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_created ON documents(collection, time_created)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create documents index: {}", e)))?;

        Ok(())
    }
}

fn ensure_parent_dir(database_url: &str) -> AppResult<()> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Configuration(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

fn decode(data: &str) -> AppResult<Value> {
    serde_json::from_str(data).map_err(AppError::from)
}

#[async_trait]
impl EntityStore for SqliteEntityStore {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to get {}/{}: {}", collection, id, e))
            })?;

        match row {
            Some(row) => {
                let data: String = row.try_get("data")?;
                Ok(Some(decode(&data)?))
            }
            None => Ok(None),
        }
    }

    async fn save_whole(&self, collection: &str, id: &str, document: Value) -> AppResult<()> {
        let data = serde_json::to_string(&document)?;
        let now = Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, time_created, time_updated)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(collection, id) DO UPDATE SET
                data = excluded.data,
                time_updated = excluded.time_updated
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(data)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to save {}/{}: {}", collection, id, e)))?;

        debug!("Saved {}/{}", collection, id);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to delete {}/{}: {}", collection, id, e))
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_all(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        skip: usize,
        limit: Option<usize>,
    ) -> AppResult<Vec<Value>> {
        // Unfiltered scans page in SQL; filtered scans page after matching.
        let result = if filter.is_empty() {
            sqlx::query(
                "SELECT data FROM documents WHERE collection = ? ORDER BY time_created, rowid LIMIT ? OFFSET ?",
            )
            .bind(collection)
            .bind(limit.map(|l| l as i64).unwrap_or(-1))
            .bind(skip as i64)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query("SELECT data FROM documents WHERE collection = ? ORDER BY time_created, rowid")
                .bind(collection)
                .fetch_all(&self.pool)
                .await
        };
        let rows = result
            .map_err(|e| AppError::Database(format!("Failed to scan {}: {}", collection, e)))?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let data: String = row.try_get("data")?;
            documents.push(decode(&data)?);
        }

        if filter.is_empty() {
            return Ok(documents);
        }

        Ok(documents
            .into_iter()
            .filter(|doc| filter.matches(doc))
            .skip(skip)
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Entity store closed");
    }
}
