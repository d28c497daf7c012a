//! # aevis-api
//!
//! HTTP surface for the aevis visibility pipeline.
//!
//! One write endpoint (`POST /checks/run`) triggers a check run for a
//! keyword on behalf of the authenticated caller. The caller identity is
//! supplied by an upstream authentication proxy as a trusted `x-user-id`
//! header; this service never validates credentials itself.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use aevis_core::{KeywordRepository, ObservationStore, ProjectRepository};
use aevis_pipeline::CheckOrchestrator;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObservationStore>,
    pub keywords: Arc<dyn KeywordRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub orchestrator: Arc<CheckOrchestrator>,
}

/// API error response. All error bodies are `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<aevis_core::Error> for ApiError {
    fn from(err: aevis_core::Error) -> Self {
        use aevis_core::Error;
        match err {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::KeywordNotFound(_) | Error::ProjectNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            Error::AlreadyRunning(_) => ApiError::Conflict(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                error!(error_msg = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Resolve the trusted caller identity from the `x-user-id` header.
fn requester_id(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("no authenticated caller".to_string()))?;
    raw.parse()
        .map_err(|_| ApiError::Unauthorized("invalid caller identity".to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunCheckRequest {
    keyword_id: Option<String>,
}

/// `POST /checks/run`: trigger a check run for one keyword.
async fn run_check(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RunCheckRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = requester_id(&headers)?;

    let keyword_id: Uuid = body
        .keyword_id
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("keywordId is required".to_string()))?
        .parse()
        .map_err(|_| ApiError::BadRequest("keywordId must be a UUID".to_string()))?;

    // Run in a detached task so a client disconnect cannot abandon the
    // batch commit mid-run; the lease is still released on every path.
    let orchestrator = state.orchestrator.clone();
    let handle =
        tokio::spawn(async move { orchestrator.run_check(keyword_id, user_id).await });
    let observations = handle
        .await
        .map_err(|e| ApiError::Internal(format!("check run task failed: {}", e)))??;

    info!(
        subsystem = "api",
        op = "run_check",
        %keyword_id,
        user_id = %user_id,
        observation_count = observations.len(),
        "Check run completed"
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "checks": observations,
    })))
}

/// `GET /health`: liveness probe.
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Assemble the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/checks/run", post(run_check))
        .route("/health", get(health))
        .with_state(state)
}
