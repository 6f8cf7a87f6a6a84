//! Storage contracts for uploaded documents and derived summaries.
//!
//! Two narrow traits cover everything the pipeline and the HTTP surface need:
//! [`DocumentStore`] owns raw document bytes keyed by a generated identifier,
//! [`SummaryStore`] owns append-only summary records keyed by the document
//! identifier. A summary's `file_id` is a soft reference; nothing enforces
//! that the referenced document still exists. Backends are injected where they
//! are used rather than held in process-wide globals.

pub mod memory;
pub mod sqlite;

use crate::entities::Entity;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

/// Errors returned by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database operation failed.
    #[error("Database operation failed: {0}")]
    Database(#[from] sqlx::Error),
    /// Filesystem preparation for the database failed.
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// A stored record could not be decoded.
    #[error("Stored record is malformed: {0}")]
    Corrupt(String),
}

/// A document as submitted by the client, before the store assigns identity.
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Display title; callers default it when the upload carries none.
    pub title: String,
    /// Raw document bytes.
    pub content: Vec<u8>,
}

/// A persisted document. Immutable after creation.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    /// Store-assigned unique identifier, never reused.
    pub file_id: String,
    /// Display title.
    pub title: String,
    /// Raw document bytes.
    pub content: Vec<u8>,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

/// A persisted pipeline result for one completed run.
#[derive(Debug, Clone)]
pub struct SummaryRecord {
    /// Identifier of the summarized document (soft reference).
    pub file_id: String,
    /// Final abstractive summary text.
    pub summary: String,
    /// Entities detected in the summary, in detection order.
    pub entities: Vec<Entity>,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

impl SummaryRecord {
    /// Build a record stamped with the current time.
    pub fn new(file_id: String, summary: String, entities: Vec<Entity>) -> Self {
        Self {
            file_id,
            summary,
            entities,
            created_at: current_timestamp_rfc3339(),
        }
    }
}

/// Projection returned by the summary listing: identifiers and summary text
/// only, entities and timestamps omitted by contract.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryListing {
    /// Identifier of the summarized document.
    pub file_id: String,
    /// Final abstractive summary text.
    pub summary: String,
}

/// Persistence contract for uploaded documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Assign a fresh identifier and durably store the document. No dedup.
    async fn put(&self, document: NewDocument) -> Result<String, StoreError>;

    /// Retrieve a document by exact identifier match.
    async fn get(&self, file_id: &str) -> Result<Option<DocumentRecord>, StoreError>;

    /// Delete every stored document.
    async fn purge(&self) -> Result<(), StoreError>;
}

/// Persistence contract for summary records.
///
/// `put` appends; there are no upsert semantics, so a second pipeline run for
/// the same document produces a second record.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Append a new summary record.
    async fn put(&self, record: SummaryRecord) -> Result<(), StoreError>;

    /// Retrieve a summary by document identifier. When several records share
    /// the identifier, implementations in this crate return the most recently
    /// inserted one.
    async fn get(&self, file_id: &str) -> Result<Option<SummaryRecord>, StoreError>;

    /// List every stored summary as a `{file_id, summary}` projection.
    async fn list_all(&self) -> Result<Vec<SummaryListing>, StoreError>;

    /// Delete every stored summary record.
    async fn purge(&self) -> Result<(), StoreError>;
}

/// Construct an identifier for a newly stored document.
pub(crate) fn generate_file_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current timestamp formatted for record storage.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_ids_are_unique() {
        assert_ne!(generate_file_id(), generate_file_id());
    }

    #[test]
    fn timestamp_is_rfc3339_like() {
        let ts = current_timestamp_rfc3339();
        assert!(ts.contains('T') && ts.ends_with('Z'));
    }

    #[test]
    fn summary_record_is_stamped_on_creation() {
        let record = SummaryRecord::new("doc-1".into(), "summary".into(), Vec::new());
        assert_eq!(record.file_id, "doc-1");
        assert!(!record.created_at.is_empty());
    }
}
