//! HTTP surface for docdigest.
//!
//! This module exposes a compact Axum router with the document workflow:
//!
//! - `POST /documents` – Store an uploaded document and run the full pipeline,
//!   returning `{file_id, title, summary, entities}`.
//! - `GET /documents/:file_id` – Download the original bytes as an attachment.
//! - `GET /summary/:file_id` – Fetch the summary record for one document.
//! - `GET /summaries` – List every summary as a `{file_id, summary}` projection.
//! - `DELETE /clean` – Purge all documents and summaries.
//! - `GET /metrics` – Observe pipeline counters.
//!
//! Handlers are generic over [`PipelineApi`] so they can be exercised against
//! stub services in tests.

use crate::entities::Entity;
use crate::metrics::MetricsSnapshot;
use crate::processing::{PipelineApi, PipelineError, SubmissionOutcome};
use crate::store::SummaryListing;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the document pipeline.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: PipelineApi + 'static,
{
    Router::new()
        .route("/documents", post(submit_document::<S>))
        .route("/documents/:file_id", get(fetch_document::<S>))
        .route("/summary/:file_id", get(fetch_summary::<S>))
        .route("/summaries", get(list_summaries::<S>))
        .route("/clean", delete(purge_all::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .with_state(service)
}

/// Query parameters accepted by `POST /documents`.
#[derive(Deserialize)]
struct SubmitParams {
    /// Optional document title; defaults when absent or blank.
    #[serde(default)]
    title: Option<String>,
}

/// Success response for `POST /documents`.
#[derive(Serialize)]
struct SubmitResponse {
    file_id: String,
    title: String,
    summary: String,
    entities: Vec<Entity>,
}

impl From<SubmissionOutcome> for SubmitResponse {
    fn from(outcome: SubmissionOutcome) -> Self {
        Self {
            file_id: outcome.file_id,
            title: outcome.title,
            summary: outcome.summary,
            entities: outcome.entities,
        }
    }
}

/// Store the uploaded bytes and drive the pipeline to completion.
async fn submit_document<S>(
    State(service): State<Arc<S>>,
    Query(params): Query<SubmitParams>,
    body: Bytes,
) -> Result<Json<SubmitResponse>, AppError>
where
    S: PipelineApi,
{
    let outcome = service
        .submit_document(body.to_vec(), params.title)
        .await?;
    tracing::info!(
        file_id = %outcome.file_id,
        entities = outcome.entities.len(),
        "Document submission completed"
    );
    Ok(Json(outcome.into()))
}

/// Download the original document bytes as an attachment.
async fn fetch_document<S>(
    State(service): State<Arc<S>>,
    Path(file_id): Path<String>,
) -> Result<Response, AppError>
where
    S: PipelineApi,
{
    let document = service.fetch_document(&file_id).await?;
    let disposition = format!("attachment; filename=\"{}\"", document.file_id);
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.content,
    )
        .into_response())
}

/// Response body for `GET /summary/:file_id`.
#[derive(Serialize)]
struct SummaryResponse {
    file_id: String,
    summary: String,
    created_at: String,
    entities: Vec<Entity>,
}

/// Fetch the summary record for one document.
async fn fetch_summary<S>(
    State(service): State<Arc<S>>,
    Path(file_id): Path<String>,
) -> Result<Json<SummaryResponse>, AppError>
where
    S: PipelineApi,
{
    let record = service.fetch_summary(&file_id).await?;
    Ok(Json(SummaryResponse {
        file_id: record.file_id,
        summary: record.summary,
        created_at: record.created_at,
        entities: record.entities,
    }))
}

/// List every stored summary.
async fn list_summaries<S>(
    State(service): State<Arc<S>>,
) -> Result<Json<Vec<SummaryListing>>, AppError>
where
    S: PipelineApi,
{
    Ok(Json(service.list_summaries().await?))
}

/// Delete every document and summary.
async fn purge_all<S>(State(service): State<Arc<S>>) -> Result<Json<serde_json::Value>, AppError>
where
    S: PipelineApi,
{
    service.purge_all().await?;
    Ok(Json(json!({ "message": "Stores cleaned successfully" })))
}

/// Return pipeline counters for observability dashboards.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: PipelineApi,
{
    Json(service.metrics_snapshot())
}

struct AppError(PipelineError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::InvalidContent(_) => StatusCode::BAD_REQUEST,
            PipelineError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self(inner)
    }
}
