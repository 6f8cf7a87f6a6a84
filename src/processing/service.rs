//! Pipeline orchestration: extraction, cleanup, chunking, summarization,
//! entity extraction, and persistence for one document at a time.

use crate::{
    entities::EntityExtractor,
    extraction::TextExtractor,
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::{
        chunking::TokenChunker,
        normalize::clean_extracted_text,
        summarize::{LengthBounds, summarize_chunks},
        types::{
            PipelineError, PipelineOutcome, PipelineRun, PipelineStage, SubmissionOutcome,
        },
    },
    store::{
        DocumentRecord, DocumentStore, NewDocument, SummaryListing, SummaryRecord, SummaryStore,
    },
    summarization::SummarizationClient,
};
use async_trait::async_trait;
use std::sync::Arc;

const DEFAULT_TITLE: &str = "Untitled Document";

/// Numeric settings driving one pipeline instance.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// Token budget per chunk handed to the summarization model.
    pub max_tokens: usize,
    /// Length bounds forwarded to every summarization invocation.
    pub bounds: LengthBounds,
}

/// Coordinates the full document pipeline and owns the long-lived handles to
/// both stores and all three model adapters.
///
/// Stages within one run execute strictly sequentially; a failure at any stage
/// aborts the remaining stages without rolling back earlier persisted side
/// effects (the document itself stays stored). Running the pipeline twice for
/// the same document performs the full pipeline twice and appends two summary
/// records. Construct the service once near process start and share it
/// through an `Arc`.
pub struct PipelineService {
    documents: Arc<dyn DocumentStore>,
    summaries: Arc<dyn SummaryStore>,
    extractor: Box<dyn TextExtractor>,
    summarizer: Box<dyn SummarizationClient>,
    entity_extractor: Box<dyn EntityExtractor>,
    chunker: TokenChunker,
    settings: PipelineSettings,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the pipeline used by the HTTP surface, so handlers can be
/// exercised against stubs.
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Store a document and drive the full pipeline for it.
    async fn submit_document(
        &self,
        content: Vec<u8>,
        title: Option<String>,
    ) -> Result<SubmissionOutcome, PipelineError>;

    /// Retrieve a stored document by identifier.
    async fn fetch_document(&self, file_id: &str) -> Result<DocumentRecord, PipelineError>;

    /// Retrieve the summary record for a document.
    async fn fetch_summary(&self, file_id: &str) -> Result<SummaryRecord, PipelineError>;

    /// List every stored summary as a `{file_id, summary}` projection.
    async fn list_summaries(&self) -> Result<Vec<SummaryListing>, PipelineError>;

    /// Delete every document and every summary record.
    async fn purge_all(&self) -> Result<(), PipelineError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl PipelineService {
    /// Build a pipeline service from injected stores, adapters, and settings.
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        summaries: Arc<dyn SummaryStore>,
        extractor: Box<dyn TextExtractor>,
        summarizer: Box<dyn SummarizationClient>,
        entity_extractor: Box<dyn EntityExtractor>,
        chunker: TokenChunker,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            documents,
            summaries,
            extractor,
            summarizer,
            entity_extractor,
            chunker,
            settings,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Store the uploaded bytes, then run the pipeline for the new document.
    pub async fn submit_document(
        &self,
        content: Vec<u8>,
        title: Option<String>,
    ) -> Result<SubmissionOutcome, PipelineError> {
        if content.is_empty() {
            return Err(PipelineError::InvalidContent(
                "document body is empty".into(),
            ));
        }

        let title = title
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();
        tracing::info!(title = %title, bytes = content.len(), "Received document");

        let file_id = self
            .documents
            .put(NewDocument {
                title: title.clone(),
                content,
            })
            .await?;
        self.metrics.record_submission();

        let outcome = self.run_pipeline(&file_id).await?;
        Ok(SubmissionOutcome {
            file_id,
            title,
            summary: outcome.summary,
            entities: outcome.entities,
        })
    }

    /// Drive the pipeline for an already-persisted document.
    pub async fn run_pipeline(&self, file_id: &str) -> Result<PipelineOutcome, PipelineError> {
        let mut run = PipelineRun::new(file_id.to_string());
        match self.execute(&mut run).await {
            Ok(outcome) => {
                self.metrics.record_completed(outcome.chunk_count as u64);
                tracing::info!(
                    file_id,
                    chunks = outcome.chunk_count,
                    entities = outcome.entities.len(),
                    "Pipeline run completed"
                );
                Ok(outcome)
            }
            Err(error) => {
                self.metrics.record_failure();
                tracing::error!(
                    file_id,
                    stage = ?run.stage,
                    error = %error,
                    "Pipeline run failed"
                );
                Err(error)
            }
        }
    }

    async fn execute(&self, run: &mut PipelineRun) -> Result<PipelineOutcome, PipelineError> {
        let document = self
            .documents
            .get(&run.file_id)
            .await?
            .ok_or(PipelineError::NotFound("Document"))?;
        if document.content.is_empty() {
            return Err(PipelineError::InvalidContent(
                "stored document content is empty".into(),
            ));
        }

        run.advance(PipelineStage::Extracting);
        let raw_text = self.extractor.extract(&document.content).await?;

        run.advance(PipelineStage::Cleaning);
        run.extracted_text = clean_extracted_text(&raw_text);
        if run.extracted_text.is_empty() {
            return Err(PipelineError::InvalidContent(
                "no usable text extracted from document".into(),
            ));
        }

        run.advance(PipelineStage::Chunking);
        run.chunks = self
            .chunker
            .chunk(&run.extracted_text, self.settings.max_tokens)?;
        tracing::info!(
            file_id = %run.file_id,
            tokens = self.chunker.count_tokens(&run.extracted_text),
            chunks = run.chunks.len(),
            "Document chunked"
        );

        run.advance(PipelineStage::Summarizing);
        let reduction =
            summarize_chunks(self.summarizer.as_ref(), &run.chunks, self.settings.bounds).await?;
        run.chunk_summaries = reduction.chunk_summaries;

        run.advance(PipelineStage::ExtractingEntities);
        let entities = self
            .entity_extractor
            .extract_entities(&reduction.final_summary)
            .await?;

        run.advance(PipelineStage::Persisting);
        self.summaries
            .put(SummaryRecord::new(
                run.file_id.clone(),
                reduction.final_summary.clone(),
                entities.clone(),
            ))
            .await?;

        run.advance(PipelineStage::Completed);
        Ok(PipelineOutcome {
            summary: reduction.final_summary,
            entities,
            chunk_count: run.chunks.len(),
        })
    }

    /// Retrieve a stored document, rejecting records whose content is empty.
    pub async fn fetch_document(&self, file_id: &str) -> Result<DocumentRecord, PipelineError> {
        let document = self
            .documents
            .get(file_id)
            .await?
            .ok_or(PipelineError::NotFound("Document"))?;
        if document.content.is_empty() {
            return Err(PipelineError::InvalidContent(
                "stored document content is empty".into(),
            ));
        }
        Ok(document)
    }

    /// Retrieve the summary record for a document.
    pub async fn fetch_summary(&self, file_id: &str) -> Result<SummaryRecord, PipelineError> {
        self.summaries
            .get(file_id)
            .await?
            .ok_or(PipelineError::NotFound("Summary"))
    }

    /// List every stored summary.
    pub async fn list_summaries(&self) -> Result<Vec<SummaryListing>, PipelineError> {
        Ok(self.summaries.list_all().await?)
    }

    /// Delete all documents, then all summaries. The two deletions run
    /// sequentially against independent stores, so a failure in between can
    /// leave one store emptied and the other untouched.
    pub async fn purge_all(&self) -> Result<(), PipelineError> {
        self.documents.purge().await?;
        self.summaries.purge().await?;
        tracing::info!("All documents and summaries deleted");
        Ok(())
    }

    /// Return the current pipeline metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl PipelineApi for PipelineService {
    async fn submit_document(
        &self,
        content: Vec<u8>,
        title: Option<String>,
    ) -> Result<SubmissionOutcome, PipelineError> {
        PipelineService::submit_document(self, content, title).await
    }

    async fn fetch_document(&self, file_id: &str) -> Result<DocumentRecord, PipelineError> {
        PipelineService::fetch_document(self, file_id).await
    }

    async fn fetch_summary(&self, file_id: &str) -> Result<SummaryRecord, PipelineError> {
        PipelineService::fetch_summary(self, file_id).await
    }

    async fn list_summaries(&self) -> Result<Vec<SummaryListing>, PipelineError> {
        PipelineService::list_summaries(self).await
    }

    async fn purge_all(&self) -> Result<(), PipelineError> {
        PipelineService::purge_all(self).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        PipelineService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Entity, EntityClientError};
    use crate::extraction::ExtractionClientError;
    use crate::store::memory::{MemoryDocumentStore, MemorySummaryStore};
    use crate::summarization::{SummarizationClientError, SummarizationRequest};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StubExtractor {
        text: String,
    }

    #[async_trait]
    impl TextExtractor for StubExtractor {
        async fn extract(&self, _content: &[u8]) -> Result<String, ExtractionClientError> {
            Ok(self.text.clone())
        }
    }

    struct FailingExtractor;

    #[async_trait]
    impl TextExtractor for FailingExtractor {
        async fn extract(&self, _content: &[u8]) -> Result<String, ExtractionClientError> {
            Err(ExtractionClientError::ExtractionFailed(
                "corrupt input".into(),
            ))
        }
    }

    /// Counts invocations and replies with a fixed summary.
    struct CountingSummarizer {
        calls: AtomicUsize,
        inputs: Mutex<Vec<String>>,
    }

    impl CountingSummarizer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                inputs: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SummarizationClient for CountingSummarizer {
        async fn summarize(
            &self,
            request: SummarizationRequest,
        ) -> Result<String, SummarizationClientError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.inputs.lock().unwrap().push(request.text);
            Ok(format!("summary-{call}"))
        }
    }

    struct TimeoutSummarizer;

    #[async_trait]
    impl SummarizationClient for TimeoutSummarizer {
        async fn summarize(
            &self,
            _request: SummarizationRequest,
        ) -> Result<String, SummarizationClientError> {
            Err(SummarizationClientError::Timeout(Duration::from_secs(120)))
        }
    }

    struct StubEntityExtractor {
        entities: Vec<Entity>,
    }

    #[async_trait]
    impl EntityExtractor for StubEntityExtractor {
        async fn extract_entities(&self, _text: &str) -> Result<Vec<Entity>, EntityClientError> {
            Ok(self.entities.clone())
        }
    }

    fn settings(max_tokens: usize) -> PipelineSettings {
        PipelineSettings {
            max_tokens,
            bounds: LengthBounds {
                min_length: 30,
                max_length: 150,
            },
        }
    }

    fn repeated_words(word_count: usize) -> String {
        let mut text = String::from("hello");
        for _ in 1..word_count {
            text.push_str(" hello");
        }
        text
    }

    struct Harness {
        service: PipelineService,
        summaries: Arc<MemorySummaryStore>,
        summarizer_calls: Arc<CountingSummarizer>,
    }

    fn harness(extracted_text: &str, max_tokens: usize) -> Harness {
        let summaries = Arc::new(MemorySummaryStore::new());
        let summarizer = Arc::new(CountingSummarizer::new());
        let service = PipelineService::new(
            Arc::new(MemoryDocumentStore::new()),
            summaries.clone(),
            Box::new(StubExtractor {
                text: extracted_text.to_string(),
            }),
            Box::new(SharedSummarizer(summarizer.clone())),
            Box::new(StubEntityExtractor {
                entities: vec![
                    Entity {
                        label: "B-ORG".into(),
                        text: "Acme".into(),
                    },
                    Entity {
                        label: "B-PER".into(),
                        text: "Lovelace".into(),
                    },
                ],
            }),
            TokenChunker::new(None).expect("chunker"),
            settings(max_tokens),
        );
        Harness {
            service,
            summaries,
            summarizer_calls: summarizer,
        }
    }

    /// Forwards to a shared counting summarizer so tests can inspect calls.
    struct SharedSummarizer(Arc<CountingSummarizer>);

    #[async_trait]
    impl SummarizationClient for SharedSummarizer {
        async fn summarize(
            &self,
            request: SummarizationRequest,
        ) -> Result<String, SummarizationClientError> {
            self.0.summarize(request).await
        }
    }

    #[tokio::test]
    async fn single_chunk_document_invokes_model_once() {
        let harness = harness(&repeated_words(400), 512);
        let outcome = harness
            .service
            .submit_document(b"%PDF bytes".to_vec(), Some("Report".into()))
            .await
            .expect("outcome");

        assert_eq!(harness.summarizer_calls.calls.load(Ordering::SeqCst), 1);
        // The single model output is the final summary, passed through as-is.
        assert_eq!(outcome.summary, "summary-0");
        assert_eq!(outcome.title, "Report");
        assert_eq!(outcome.entities.len(), 2);

        let record = harness
            .summaries
            .get(&outcome.file_id)
            .await
            .expect("get")
            .expect("persisted");
        assert_eq!(record.summary, "summary-0");
        assert_eq!(record.entities[0].text, "Acme");
    }

    #[tokio::test]
    async fn multi_chunk_document_runs_two_level_reduce() {
        let harness = harness(&repeated_words(1100), 512);
        let outcome = harness
            .service
            .submit_document(b"%PDF bytes".to_vec(), None)
            .await
            .expect("outcome");

        // Three chunk passes plus one combined pass.
        assert_eq!(harness.summarizer_calls.calls.load(Ordering::SeqCst), 4);
        assert_eq!(outcome.title, "Untitled Document");
        assert_eq!(outcome.summary, "summary-3");

        let inputs = harness.summarizer_calls.inputs.lock().unwrap().clone();
        assert_eq!(inputs[3], "summary-0 summary-1 summary-2");

        let snapshot = harness.service.metrics_snapshot();
        assert_eq!(snapshot.documents_ingested, 1);
        assert_eq!(snapshot.summaries_persisted, 1);
        assert_eq!(snapshot.chunks_processed, 3);
    }

    #[tokio::test]
    async fn summarizer_timeout_surfaces_distinctly_and_persists_nothing() {
        let summaries = Arc::new(MemorySummaryStore::new());
        let service = PipelineService::new(
            Arc::new(MemoryDocumentStore::new()),
            summaries.clone(),
            Box::new(StubExtractor {
                text: "some extracted text".into(),
            }),
            Box::new(TimeoutSummarizer),
            Box::new(StubEntityExtractor {
                entities: Vec::new(),
            }),
            TokenChunker::new(None).expect("chunker"),
            settings(512),
        );

        let error = service
            .submit_document(b"bytes".to_vec(), None)
            .await
            .expect_err("timeout");

        assert!(matches!(error, PipelineError::UpstreamTimeout(_)));
        assert!(summaries.list_all().await.expect("list").is_empty());
        assert_eq!(service.metrics_snapshot().failed_runs, 1);
    }

    #[tokio::test]
    async fn extraction_failure_aborts_the_run() {
        let summaries = Arc::new(MemorySummaryStore::new());
        let service = PipelineService::new(
            Arc::new(MemoryDocumentStore::new()),
            summaries.clone(),
            Box::new(FailingExtractor),
            Box::new(TimeoutSummarizer),
            Box::new(StubEntityExtractor {
                entities: Vec::new(),
            }),
            TokenChunker::new(None).expect("chunker"),
            settings(512),
        );

        let error = service
            .submit_document(b"bytes".to_vec(), None)
            .await
            .expect_err("extraction fails");

        assert!(matches!(error, PipelineError::Extraction(_)));
        assert!(summaries.list_all().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn empty_submission_is_rejected_up_front() {
        let harness = harness("text", 512);
        let error = harness
            .service
            .submit_document(Vec::new(), None)
            .await
            .expect_err("empty body");
        assert!(matches!(error, PipelineError::InvalidContent(_)));
        assert_eq!(harness.summarizer_calls.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn whitespace_only_extraction_is_invalid_content() {
        let harness = harness("\n\n\n", 512);
        let error = harness
            .service
            .submit_document(b"bytes".to_vec(), None)
            .await
            .expect_err("nothing extractable");
        assert!(matches!(error, PipelineError::InvalidContent(_)));
        assert_eq!(harness.summarizer_calls.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resubmission_appends_a_second_record() {
        let harness = harness(&repeated_words(10), 512);
        let first = harness
            .service
            .submit_document(b"bytes".to_vec(), None)
            .await
            .expect("first");
        let second = harness
            .service
            .submit_document(b"bytes".to_vec(), None)
            .await
            .expect("second");

        assert_ne!(first.file_id, second.file_id);
        assert_eq!(harness.summaries.list_all().await.expect("list").len(), 2);
    }

    #[tokio::test]
    async fn missing_document_and_summary_are_not_found() {
        let harness = harness("text", 512);
        assert!(matches!(
            harness.service.fetch_document("missing").await,
            Err(PipelineError::NotFound("Document"))
        ));
        assert!(matches!(
            harness.service.fetch_summary("missing").await,
            Err(PipelineError::NotFound("Summary"))
        ));
    }

    #[tokio::test]
    async fn purge_forgets_previously_valid_identifiers() {
        let harness = harness(&repeated_words(10), 512);
        let outcome = harness
            .service
            .submit_document(b"bytes".to_vec(), None)
            .await
            .expect("outcome");

        harness.service.purge_all().await.expect("purge");

        assert!(matches!(
            harness.service.fetch_document(&outcome.file_id).await,
            Err(PipelineError::NotFound("Document"))
        ));
        assert!(matches!(
            harness.service.fetch_summary(&outcome.file_id).await,
            Err(PipelineError::NotFound("Summary"))
        ));
    }
}
