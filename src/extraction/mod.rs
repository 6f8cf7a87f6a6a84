//! Text extraction boundary for scanned documents.
//!
//! The OCR engine is an external collaborator reached over HTTP; the core
//! treats it as opaque and never retries a failed extraction. The adapter
//! mirrors the other model clients: a narrow trait so alternate OCR backends
//! can be substituted without touching orchestration logic.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced while turning document bytes into text.
#[derive(Debug, Error)]
pub enum ExtractionClientError {
    /// Extraction service was unreachable or did not answer in time.
    #[error("Extraction service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Service rejected the document or failed internally.
    #[error("Failed to extract text: {0}")]
    ExtractionFailed(String),
    /// Service response could not be parsed.
    #[error("Malformed extraction response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by OCR text extraction backends.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Convert raw document bytes into plain text.
    async fn extract(&self, content: &[u8]) -> Result<String, ExtractionClientError>;
}

/// OCR engine consumed over HTTP.
pub struct HttpTextExtractor {
    http: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpTextExtractor {
    /// Construct a client posting document bytes to the configured endpoint.
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        let http = Client::builder()
            .user_agent("docdigest/extract")
            .build()
            .expect("Failed to construct reqwest::Client for text extraction");
        Self {
            http,
            endpoint,
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    text: String,
}

#[async_trait]
impl TextExtractor for HttpTextExtractor {
    async fn extract(&self, content: &[u8]) -> Result<String, ExtractionClientError> {
        let response = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(content.to_vec())
            .send()
            .await
            .map_err(|error| {
                ExtractionClientError::ServiceUnavailable(format!(
                    "failed to reach extraction service at {}: {error}",
                    self.endpoint
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionClientError::ExtractionFailed(format!(
                "extraction service returned {status}: {body}"
            )));
        }

        let body: ExtractionResponse = response.json().await.map_err(|error| {
            ExtractionClientError::InvalidResponse(format!(
                "failed to decode extraction response: {error}"
            ))
        })?;

        Ok(body.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer) -> HttpTextExtractor {
        HttpTextExtractor::new(
            format!("{}/extract", server.base_url()),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn returns_extracted_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/extract")
                    .header("content-type", "application/octet-stream");
                then.status(200)
                    .json_body(serde_json::json!({ "text": "Scanned page contents" }));
            })
            .await;

        let text = client_for(&server)
            .extract(b"%PDF-1.4 fake bytes")
            .await
            .expect("extracted text");

        mock.assert();
        assert_eq!(text, "Scanned page contents");
    }

    #[tokio::test]
    async fn surfaces_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/extract");
                then.status(422).body("unsupported format");
            })
            .await;

        let error = client_for(&server)
            .extract(b"not a document")
            .await
            .expect_err("error response");

        assert!(matches!(error, ExtractionClientError::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn rejects_malformed_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/extract");
                then.status(200).body("plain, not json");
            })
            .await;

        let error = client_for(&server)
            .extract(b"bytes")
            .await
            .expect_err("malformed response");

        assert!(matches!(error, ExtractionClientError::InvalidResponse(_)));
    }
}
