use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_ingested: AtomicU64,
    summaries_persisted: AtomicU64,
    chunks_processed: AtomicU64,
    failed_runs: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted document submission.
    pub fn record_submission(&self) {
        self.documents_ingested.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed pipeline run and the number of chunks it produced.
    pub fn record_completed(&self, chunk_count: u64) {
        self.summaries_persisted.fetch_add(1, Ordering::Relaxed);
        self.chunks_processed
            .fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record a pipeline run that aborted before persisting a summary.
    pub fn record_failure(&self) {
        self.failed_runs.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_ingested: self.documents_ingested.load(Ordering::Relaxed),
            summaries_persisted: self.summaries_persisted.load(Ordering::Relaxed),
            chunks_processed: self.chunks_processed.load(Ordering::Relaxed),
            failed_runs: self.failed_runs.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents accepted since startup.
    pub documents_ingested: u64,
    /// Number of summary records written since startup.
    pub summaries_persisted: u64,
    /// Total chunk count produced across all completed runs.
    pub chunks_processed: u64,
    /// Number of pipeline runs that aborted with an error.
    pub failed_runs: u64,
}
