//! Named-entity extraction boundary.
//!
//! Entities are pulled from the final summary text only, never from the raw
//! extracted text or intermediate chunk summaries. The core does not dedupe or
//! rank what the model returns; output order is the model's detection order.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// A labeled text span detected in a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity class label assigned by the model (e.g. `B-PER`, `I-ORG`).
    #[serde(rename = "type")]
    pub label: String,
    /// Surface form of the entity as it appears in the summary.
    pub text: String,
}

/// Errors surfaced while extracting entities.
#[derive(Debug, Error)]
pub enum EntityClientError {
    /// Entity extraction service was unreachable.
    #[error("Entity extraction service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Service returned an error response.
    #[error("Failed to extract entities: {0}")]
    ExtractionFailed(String),
    /// Service response could not be parsed.
    #[error("Malformed entity extraction response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by named-entity-recognition backends.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Detect named entities in the supplied text, in detection order.
    async fn extract_entities(&self, text: &str) -> Result<Vec<Entity>, EntityClientError>;
}

/// NER model service consumed over HTTP.
pub struct HttpEntityExtractor {
    http: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpEntityExtractor {
    /// Construct a client posting to the configured NER endpoint.
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        let http = Client::builder()
            .user_agent("docdigest/entities")
            .build()
            .expect("Failed to construct reqwest::Client for entity extraction");
        Self {
            http,
            endpoint,
            timeout,
        }
    }
}

/// Wire shape returned by the NER model service.
#[derive(Debug, Deserialize)]
struct NerResponse {
    entities: Vec<NerEntity>,
}

#[derive(Debug, Deserialize)]
struct NerEntity {
    entity: String,
    word: String,
}

#[async_trait]
impl EntityExtractor for HttpEntityExtractor {
    async fn extract_entities(&self, text: &str) -> Result<Vec<Entity>, EntityClientError> {
        let response = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|error| {
                EntityClientError::ServiceUnavailable(format!(
                    "failed to reach entity extraction service at {}: {error}",
                    self.endpoint
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EntityClientError::ExtractionFailed(format!(
                "entity extraction service returned {status}: {body}"
            )));
        }

        let body: NerResponse = response.json().await.map_err(|error| {
            EntityClientError::InvalidResponse(format!("failed to decode NER response: {error}"))
        })?;

        Ok(body
            .entities
            .into_iter()
            .map(|entity| Entity {
                label: entity.entity,
                text: entity.word,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer) -> HttpEntityExtractor {
        HttpEntityExtractor::new(
            format!("{}/ner", server.base_url()),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn maps_wire_entities_in_detection_order() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/ner");
                then.status(200).json_body(serde_json::json!({
                    "entities": [
                        { "entity": "B-ORG", "word": "Acme" },
                        { "entity": "B-PER", "word": "Lovelace" },
                        { "entity": "B-ORG", "word": "Acme" }
                    ]
                }));
            })
            .await;

        let entities = client_for(&server)
            .extract_entities("Acme hired Lovelace. Acme grew.")
            .await
            .expect("entities");

        mock.assert();
        // Duplicates stay and order is the model's detection order.
        assert_eq!(
            entities,
            vec![
                Entity {
                    label: "B-ORG".into(),
                    text: "Acme".into()
                },
                Entity {
                    label: "B-PER".into(),
                    text: "Lovelace".into()
                },
                Entity {
                    label: "B-ORG".into(),
                    text: "Acme".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn surfaces_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/ner");
                then.status(500).body("model crashed");
            })
            .await;

        let error = client_for(&server)
            .extract_entities("text")
            .await
            .expect_err("error response");

        assert!(matches!(error, EntityClientError::ExtractionFailed(_)));
    }

    #[test]
    fn entity_serializes_with_type_key() {
        let entity = Entity {
            label: "B-LOC".into(),
            text: "Lisbon".into(),
        };
        let value = serde_json::to_value(&entity).expect("serialize");
        assert_eq!(value, serde_json::json!({ "type": "B-LOC", "text": "Lisbon" }));
    }
}
