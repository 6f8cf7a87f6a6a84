//! SQLite-backed store implementations.
//!
//! One `SqlitePool` serves both stores. WAL mode is enabled so summary reads
//! and pipeline writes can overlap without blocking. Table names come from
//! configuration and are validated as plain identifiers before they reach
//! this module, which is why they can be spliced into the statements below.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::entities::Entity;

use super::{
    DocumentRecord, DocumentStore, NewDocument, StoreError, SummaryListing, SummaryRecord,
    SummaryStore, current_timestamp_rfc3339, generate_file_id,
};

/// Open a connection pool to the configured SQLite database, creating the
/// file and its parent directories when missing.
pub async fn connect(database_path: &str) -> Result<SqlitePool, StoreError> {
    if let Some(parent) = std::path::Path::new(database_path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{database_path}"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::debug!(database_path, "Opened SQLite pool");
    Ok(pool)
}

/// [`DocumentStore`] backed by a SQLite table with a BLOB content column.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    table: String,
}

impl SqliteDocumentStore {
    /// Wrap a pool and the validated table name.
    pub fn new(pool: SqlitePool, table: &str) -> Self {
        Self {
            pool,
            table: table.to_string(),
        }
    }

    /// Create the documents table when it does not exist yet.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                file_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content BLOB NOT NULL,
                created_at TEXT NOT NULL
            )",
            self.table
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn put(&self, document: NewDocument) -> Result<String, StoreError> {
        let file_id = generate_file_id();
        sqlx::query(&format!(
            "INSERT INTO {} (file_id, title, content, created_at) VALUES (?, ?, ?, ?)",
            self.table
        ))
        .bind(&file_id)
        .bind(&document.title)
        .bind(&document.content)
        .bind(current_timestamp_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(file_id)
    }

    async fn get(&self, file_id: &str) -> Result<Option<DocumentRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT file_id, title, content, created_at FROM {} WHERE file_id = ?",
            self.table
        ))
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(DocumentRecord {
                file_id: row.try_get("file_id")?,
                title: row.try_get("title")?,
                content: row.try_get("content")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }

    async fn purge(&self) -> Result<(), StoreError> {
        sqlx::query(&format!("DELETE FROM {}", self.table))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// [`SummaryStore`] backed by a SQLite table without uniqueness constraints,
/// preserving the append-only contract. Entities are stored as a JSON column.
pub struct SqliteSummaryStore {
    pool: SqlitePool,
    table: String,
}

impl SqliteSummaryStore {
    /// Wrap a pool and the validated table name.
    pub fn new(pool: SqlitePool, table: &str) -> Self {
        Self {
            pool,
            table: table.to_string(),
        }
    }

    /// Create the summaries table when it does not exist yet.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                file_id TEXT NOT NULL,
                summary TEXT NOT NULL,
                entities TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            self.table
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn decode_entities(raw: &str) -> Result<Vec<Entity>, StoreError> {
    serde_json::from_str(raw)
        .map_err(|error| StoreError::Corrupt(format!("invalid entities payload: {error}")))
}

#[async_trait]
impl SummaryStore for SqliteSummaryStore {
    async fn put(&self, record: SummaryRecord) -> Result<(), StoreError> {
        let entities = serde_json::to_string(&record.entities)
            .map_err(|error| StoreError::Corrupt(format!("unserializable entities: {error}")))?;
        sqlx::query(&format!(
            "INSERT INTO {} (file_id, summary, entities, created_at) VALUES (?, ?, ?, ?)",
            self.table
        ))
        .bind(&record.file_id)
        .bind(&record.summary)
        .bind(entities)
        .bind(&record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, file_id: &str) -> Result<Option<SummaryRecord>, StoreError> {
        // Most recently inserted record wins when a document was run twice.
        let row = sqlx::query(&format!(
            "SELECT file_id, summary, entities, created_at FROM {} \
             WHERE file_id = ? ORDER BY rowid DESC LIMIT 1",
            self.table
        ))
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let entities: String = row.try_get("entities")?;
            Ok(SummaryRecord {
                file_id: row.try_get("file_id")?,
                summary: row.try_get("summary")?,
                entities: decode_entities(&entities)?,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }

    async fn list_all(&self) -> Result<Vec<SummaryListing>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT file_id, summary FROM {} ORDER BY rowid",
            self.table
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(SummaryListing {
                    file_id: row.try_get("file_id")?,
                    summary: row.try_get("summary")?,
                })
            })
            .collect()
    }

    async fn purge(&self) -> Result<(), StoreError> {
        sqlx::query(&format!("DELETE FROM {}", self.table))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
