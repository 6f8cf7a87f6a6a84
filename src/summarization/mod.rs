//! Abstractive summarization boundary.
//!
//! The summarization model runs behind a separate service; this adapter issues
//! one HTTP request per invocation with the configured length bounds. Each
//! request carries its own time budget, and an elapsed budget is reported as a
//! distinct [`SummarizationClientError::Timeout`] so callers can tell "try
//! later" apart from "broken input".

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced while attempting abstractive summarization.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Summarization service was unreachable.
    #[error("Summarization service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Summarization call exceeded its time budget.
    #[error("Summarization timed out after {0:?}")]
    Timeout(Duration),
    /// Service returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Service response could not be parsed.
    #[error("Malformed summarizer response: {0}")]
    InvalidResponse(String),
}

/// Request payload passed to the summarization model.
#[derive(Debug, Clone)]
pub struct SummarizationRequest {
    /// Text to condense.
    pub text: String,
    /// Lower bound on generated summary length.
    pub min_length: usize,
    /// Upper bound on generated summary length.
    pub max_length: usize,
}

/// Interface implemented by abstractive summarization providers.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Generate a bounded-length summary of the supplied text.
    async fn summarize(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError>;
}

/// Summarization model service consumed over HTTP.
pub struct HttpSummarizationClient {
    http: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpSummarizationClient {
    /// Construct a client posting to the configured summarizer endpoint.
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        let http = Client::builder()
            .user_agent("docdigest/summary")
            .build()
            .expect("Failed to construct reqwest::Client for summarization");
        Self {
            http,
            endpoint,
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: String,
}

#[async_trait]
impl SummarizationClient for HttpSummarizationClient {
    async fn summarize(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "text": request.text,
            "min_length": request.min_length,
            "max_length": request.max_length,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    SummarizationClientError::Timeout(self.timeout)
                } else {
                    SummarizationClientError::ServiceUnavailable(format!(
                        "failed to reach summarizer at {}: {error}",
                        self.endpoint
                    ))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "summarizer returned {status}: {body}"
            )));
        }

        let body: SummaryResponse = response.json().await.map_err(|error| {
            if error.is_timeout() {
                SummarizationClientError::Timeout(self.timeout)
            } else {
                SummarizationClientError::InvalidResponse(format!(
                    "failed to decode summarizer response: {error}"
                ))
            }
        })?;

        Ok(body.summary.trim().to_string())
    }
}
