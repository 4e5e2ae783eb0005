//! Embedded SQLite backend
//!
//! Documents are kept as JSON text in a single table; indexes become SQLite
//! expression indexes over `json_extract`.

use super::StoreBackend;
use crate::document::{BatchCommand, StoredDocument};
use crate::error::{StoreError, StoreResult};
use crate::indexes::IndexDefinition;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const DATABASE_FILE: &str = "raccoon.db";

pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open (or create) the database file under `data_dir`
    pub async fn open(data_dir: &Path, acquire_timeout: Duration) -> StoreResult<Self> {
        if !data_dir.exists() {
            info!("Creating data directory: {}", data_dir.display());
            std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Database {
                message: format!("Failed to create data directory {}: {}", data_dir.display(), e),
                source: Some(Box::new(e)),
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(data_dir.join(DATABASE_FILE))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;

        let backend = Self { pool };
        backend.create_tables().await?;
        info!("SQLite document storage ready at {}", data_dir.display());
        Ok(backend)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_tables(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                collection TEXT,
                body TEXT NOT NULL,
                last_modified TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS index_definitions (
                name TEXT PRIMARY KEY,
                definition TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn sql_index_name(index: &IndexDefinition) -> String {
        let sanitized: String = index
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("idx_{}", sanitized)
    }
}

#[async_trait]
impl StoreBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn load(&self, id: &str) -> StoreResult<Option<StoredDocument>> {
        let row = sqlx::query("SELECT id, collection, body FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let body: String = row.try_get("body")?;
        let body = serde_json::from_str(&body).map_err(|source| StoreError::Deserialize {
            id: id.to_string(),
            source,
        })?;

        Ok(Some(StoredDocument {
            id: row.try_get("id")?,
            collection: row.try_get("collection")?,
            body,
        }))
    }

    async fn batch(&self, commands: &[BatchCommand]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let now = chrono::Utc::now().to_rfc3339();

        for command in commands {
            match command {
                BatchCommand::Put {
                    id,
                    body,
                    collection,
                } => {
                    sqlx::query(
                        "INSERT OR REPLACE INTO documents (id, collection, body, last_modified) VALUES (?, ?, ?, ?)",
                    )
                    .bind(id)
                    .bind(collection.as_deref())
                    .bind(serde_json::to_string(body)?)
                    .bind(&now)
                    .execute(&mut *tx)
                    .await?;
                }
                BatchCommand::Delete { id } => {
                    sqlx::query("DELETE FROM documents WHERE id = ?")
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        debug!(commands = commands.len(), "Committed batch to SQLite storage");
        Ok(())
    }

    async fn put_index(&self, index: &IndexDefinition) -> StoreResult<()> {
        index.validate()?;

        let columns = index
            .fields
            .iter()
            .map(|field| format!("json_extract(body, '$.{}')", field))
            .collect::<Vec<_>>()
            .join(", ");

        let sql_name = Self::sql_index_name(index);
        let mut tx = self.pool.begin().await?;

        // Definitions can change between releases, so the index is rebuilt every time
        sqlx::query(&format!("DROP INDEX IF EXISTS {}", sql_name))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "CREATE INDEX {} ON documents (collection, {}) WHERE collection = '{}'",
            sql_name, columns, index.collection
        ))
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT OR REPLACE INTO index_definitions (name, definition) VALUES (?, ?)")
            .bind(&index.name)
            .bind(serde_json::to_string(index)?)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(index = %index.name, "Created SQLite index {}", sql_name);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
