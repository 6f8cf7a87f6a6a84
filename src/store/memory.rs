//! In-memory store implementations for tests and ephemeral deployments.
//!
//! Documents live in a `HashMap`; summaries in an append-only `Vec`, so the
//! "most recently inserted wins" lookup rule falls out of a reverse scan.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{
    DocumentRecord, DocumentStore, NewDocument, StoreError, SummaryListing, SummaryRecord,
    SummaryStore, current_timestamp_rfc3339, generate_file_id,
};

/// In-memory [`DocumentStore`].
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, DocumentRecord>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn put(&self, document: NewDocument) -> Result<String, StoreError> {
        let file_id = generate_file_id();
        let record = DocumentRecord {
            file_id: file_id.clone(),
            title: document.title,
            content: document.content,
            created_at: current_timestamp_rfc3339(),
        };
        self.documents.write().unwrap().insert(file_id.clone(), record);
        Ok(file_id)
    }

    async fn get(&self, file_id: &str) -> Result<Option<DocumentRecord>, StoreError> {
        Ok(self.documents.read().unwrap().get(file_id).cloned())
    }

    async fn purge(&self) -> Result<(), StoreError> {
        self.documents.write().unwrap().clear();
        Ok(())
    }
}

/// In-memory [`SummaryStore`].
#[derive(Default)]
pub struct MemorySummaryStore {
    records: RwLock<Vec<SummaryRecord>>,
}

impl MemorySummaryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SummaryStore for MemorySummaryStore {
    async fn put(&self, record: SummaryRecord) -> Result<(), StoreError> {
        self.records.write().unwrap().push(record);
        Ok(())
    }

    async fn get(&self, file_id: &str) -> Result<Option<SummaryRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|record| record.file_id == file_id)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<SummaryListing>, StoreError> {
        Ok(self
            .records
            .read()
            .unwrap()
            .iter()
            .map(|record| SummaryListing {
                file_id: record.file_id.clone(),
                summary: record.summary.clone(),
            })
            .collect())
    }

    async fn purge(&self) -> Result<(), StoreError> {
        self.records.write().unwrap().clear();
        Ok(())
    }
}
