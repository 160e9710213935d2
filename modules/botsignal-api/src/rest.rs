use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use botsignal_common::{AnalysisSession, BotSignalError, BotVerdict};

use crate::AppState;

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

pub struct ApiError(BotSignalError);

impl From<BotSignalError> for ApiError {
    fn from(err: BotSignalError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BotSignalError::NotFound(_) => StatusCode::NOT_FOUND,
            BotSignalError::Validation(_) => StatusCode::BAD_REQUEST,
            BotSignalError::UpstreamFetch(_) => StatusCode::BAD_GATEWAY,
            BotSignalError::Config(_)
            | BotSignalError::Persistence(_)
            | BotSignalError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request/response bodies
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub name: Option<String>,
    pub subreddit: String,
}

#[derive(Serialize)]
pub struct ExtractionCounts {
    pub activity_count: u64,
    pub author_count: u64,
}

#[derive(Serialize)]
pub struct DetectionCounts {
    pub users_analyzed: u64,
    pub bots_detected: u64,
    pub verdicts: Vec<BotVerdict>,
}

#[derive(Serialize)]
pub struct RunResponse {
    pub extraction: ExtractionCounts,
    pub detection: DetectionCounts,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<AnalysisSession>, ApiError> {
    let session = state
        .pipeline
        .sessions()
        .create(req.name, req.subreddit)
        .await?;
    Ok(Json(session))
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AnalysisSession>>, ApiError> {
    Ok(Json(state.pipeline.sessions().list().await?))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisSession>, ApiError> {
    Ok(Json(state.pipeline.sessions().get(id).await?))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.pipeline.sessions().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn run_pipeline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunResponse>, ApiError> {
    let outcome = state.pipeline.run(id).await?;
    Ok(Json(RunResponse {
        extraction: ExtractionCounts {
            activity_count: outcome.extraction.activity_count,
            author_count: outcome.extraction.author_count,
        },
        detection: DetectionCounts {
            users_analyzed: outcome.detection.users_analyzed,
            bots_detected: outcome.detection.bots_detected,
            verdicts: outcome.detection.verdicts,
        },
    }))
}

pub async fn list_verdicts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BotVerdict>>, ApiError> {
    let verdicts = state
        .store
        .list_verdicts()
        .await
        .map_err(|e| BotSignalError::Persistence(e.to_string()))?;
    Ok(Json(verdicts))
}
