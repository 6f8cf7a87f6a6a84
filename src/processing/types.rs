//! Core data types and error definitions for the processing pipeline.

use crate::entities::{Entity, EntityClientError};
use crate::extraction::ExtractionClientError;
use crate::store::StoreError;
use crate::summarization::SummarizationClientError;
use anyhow::Error as TokenizerError;
use thiserror::Error;

/// Errors produced while splitting text into token-bounded chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Chunking was configured with an impossible token budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Tokenizer resources were unavailable for the configured encoding.
    #[error("failed to initialize tokenizer for encoding '{encoding}': {source}")]
    Tokenizer {
        /// Encoding we attempted to load.
        encoding: String,
        /// Underlying error raised by the tokenizer library.
        #[source]
        source: TokenizerError,
    },
    /// A token slice could not be re-materialized into text.
    #[error("failed to decode token chunk: {source}")]
    Decode {
        /// Underlying error raised by the tokenizer library.
        #[source]
        source: TokenizerError,
    },
}

/// Failure taxonomy for one pipeline run, surfaced directly to the caller.
///
/// Every stage failure aborts the run; nothing is retried internally and no
/// partial artifacts are persisted.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Requested document or summary does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Submitted or stored content is unusable.
    #[error("Invalid document content: {0}")]
    InvalidContent(String),
    /// Text extraction adapter failed.
    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ExtractionClientError),
    /// Chunking step failed to segment the document.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Summarization adapter exceeded its time budget. Reported distinctly
    /// from other upstream failures so callers can retry later.
    #[error("{0}")]
    UpstreamTimeout(SummarizationClientError),
    /// Summarization adapter failed for a reason other than a timeout.
    #[error("Failed to summarize document: {0}")]
    Summarization(SummarizationClientError),
    /// Entity extraction adapter failed.
    #[error("Entity extraction failed: {0}")]
    Entities(#[from] EntityClientError),
    /// A persistence operation failed.
    #[error("Storage operation failed: {0}")]
    Storage(#[from] StoreError),
}

impl From<SummarizationClientError> for PipelineError {
    fn from(error: SummarizationClientError) -> Self {
        match error {
            SummarizationClientError::Timeout(_) => Self::UpstreamTimeout(error),
            other => Self::Summarization(other),
        }
    }
}

/// Stages of one pipeline run, entered strictly in declaration order. A run
/// that errors stops at whatever stage it had reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Run accepted, document identifier resolved.
    Submitted,
    /// Waiting on the OCR adapter.
    Extracting,
    /// Normalizing the raw extracted text.
    Cleaning,
    /// Splitting normalized text into token-bounded chunks.
    Chunking,
    /// Waiting on the summarization adapter.
    Summarizing,
    /// Waiting on the entity extraction adapter.
    ExtractingEntities,
    /// Writing the summary record.
    Persisting,
    /// Run finished and its record is durable.
    Completed,
}

/// Transient state for one orchestration call. Never persisted; intermediate
/// outputs accumulated here are discarded when a run fails.
#[derive(Debug)]
pub(crate) struct PipelineRun {
    pub(crate) file_id: String,
    pub(crate) stage: PipelineStage,
    pub(crate) extracted_text: String,
    pub(crate) chunks: Vec<String>,
    pub(crate) chunk_summaries: Vec<String>,
}

impl PipelineRun {
    pub(crate) fn new(file_id: String) -> Self {
        Self {
            file_id,
            stage: PipelineStage::Submitted,
            extracted_text: String::new(),
            chunks: Vec::new(),
            chunk_summaries: Vec::new(),
        }
    }

    /// Move to the next stage, leaving a trace of the transition.
    pub(crate) fn advance(&mut self, stage: PipelineStage) {
        tracing::debug!(file_id = %self.file_id, stage = ?stage, "Pipeline stage");
        self.stage = stage;
    }
}

/// Result of one completed pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Final abstractive summary text.
    pub summary: String,
    /// Entities detected in the summary, in detection order.
    pub entities: Vec<Entity>,
    /// Number of chunks the document was split into.
    pub chunk_count: usize,
}

/// Client-visible result of a document submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    /// Identifier assigned to the stored document.
    pub file_id: String,
    /// Title recorded for the document.
    pub title: String,
    /// Final abstractive summary text.
    pub summary: String,
    /// Entities detected in the summary, in detection order.
    pub entities: Vec<Entity>,
}
