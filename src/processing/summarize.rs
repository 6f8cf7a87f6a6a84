//! Two-level hierarchical summarization over token-bounded chunks.

use crate::summarization::{SummarizationClient, SummarizationClientError, SummarizationRequest};

/// Length bounds forwarded to every summarization model invocation.
#[derive(Debug, Clone, Copy)]
pub struct LengthBounds {
    /// Lower bound on generated summary length.
    pub min_length: usize,
    /// Upper bound on generated summary length.
    pub max_length: usize,
}

/// Output of the hierarchical reduce.
#[derive(Debug, Clone)]
pub struct SummaryReduction {
    /// The single top-level summary.
    pub final_summary: String,
    /// Per-chunk summaries in original chunk order.
    pub chunk_summaries: Vec<String>,
}

/// Reduce an ordered chunk sequence to one bounded-length summary.
///
/// A single chunk is summarized with one model call whose output is the final
/// summary. For multiple chunks, each chunk is summarized in original order
/// with the same bounds, the partial summaries are joined with a single space,
/// and one more call condenses the joined text. The joined text is *not*
/// re-chunked if it exceeds the model's input capacity; that is a known limit
/// of the two-level reduce. Any failed invocation aborts the whole step and
/// discards the partial summaries.
pub(crate) async fn summarize_chunks(
    client: &dyn SummarizationClient,
    chunks: &[String],
    bounds: LengthBounds,
) -> Result<SummaryReduction, SummarizationClientError> {
    let request = |text: String| SummarizationRequest {
        text,
        min_length: bounds.min_length,
        max_length: bounds.max_length,
    };

    match chunks {
        [] => Err(SummarizationClientError::GenerationFailed(
            "no chunks to summarize".into(),
        )),
        [only] => {
            let summary = client.summarize(request(only.clone())).await?;
            Ok(SummaryReduction {
                final_summary: summary.clone(),
                chunk_summaries: vec![summary],
            })
        }
        many => {
            let mut chunk_summaries = Vec::with_capacity(many.len());
            for (index, chunk) in many.iter().enumerate() {
                tracing::debug!(
                    chunk = index + 1,
                    total = many.len(),
                    "Summarizing chunk"
                );
                let summary = client.summarize(request(chunk.clone())).await?;
                chunk_summaries.push(summary);
            }

            let combined = chunk_summaries.join(" ");
            tracing::debug!(
                combined_chars = combined.len(),
                "Summarizing combined chunk summaries"
            );
            let final_summary = client.summarize(request(combined)).await?;

            Ok(SummaryReduction {
                final_summary,
                chunk_summaries,
            })
        }
    }
}
