use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::analytics::{analytics_report, pipeline_stats};
use super::decision::{DecisionEngine, DecisionError};
use super::domain::CandidateStatus;
use super::intake::{IntakeCoordinator, IntakeError};
use super::ledger::CandidateLedger;
use super::store::ContentStore;

/// Shared service handles for the HTTP surface.
#[derive(Clone)]
pub struct PipelineState {
    pub intake: Arc<IntakeCoordinator>,
    pub decisions: Arc<DecisionEngine>,
    pub ledger: Arc<CandidateLedger>,
    pub content: ContentStore,
}

/// Router builder exposing the pipeline operations upward.
///
/// Manual file upload stays a library/CLI concern; the `analyses` endpoint
/// runs a warehouse re-scan against a new job description.
pub fn recruitment_router(state: PipelineState) -> Router {
    Router::new()
        .route("/api/v1/recruitment/analyses", post(analyze_handler))
        .route("/api/v1/recruitment/candidates", get(candidates_handler))
        .route(
            "/api/v1/recruitment/candidates/:name",
            get(candidate_handler).post(update_candidate_handler),
        )
        .route("/api/v1/recruitment/decisions", post(decision_handler))
        .route("/api/v1/recruitment/analytics", get(analytics_handler))
        .route("/api/v1/recruitment/stats", get(stats_handler))
        .route("/api/v1/recruitment/purge", post(purge_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AnalysisRequest {
    job_description: String,
}

#[derive(Debug, Deserialize)]
struct UpdateCandidateRequest {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

const fn default_threshold() -> u8 {
    65
}

#[derive(Debug, Deserialize)]
struct DecisionRequest {
    #[serde(default = "default_threshold")]
    threshold: u8,
    #[serde(default)]
    preview_only: bool,
}

async fn analyze_handler(
    State(state): State<PipelineState>,
    axum::Json(request): axum::Json<AnalysisRequest>,
) -> Response {
    match state.intake.rescan_warehouse(&request.job_description) {
        Ok(candidates) => (StatusCode::OK, axum::Json(candidates)).into_response(),
        Err(
            err @ (IntakeError::MissingJobDescription
            | IntakeError::NoDocuments
            | IntakeError::EmptyWarehouse),
        ) => error_response(StatusCode::BAD_REQUEST, &err),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err),
    }
}

async fn candidates_handler(State(state): State<PipelineState>) -> Response {
    (StatusCode::OK, axum::Json(state.ledger.candidates())).into_response()
}

async fn candidate_handler(
    State(state): State<PipelineState>,
    Path(name): Path<String>,
) -> Response {
    match state.ledger.find_by_name(&name) {
        Some(candidate) => (StatusCode::OK, axum::Json(candidate)).into_response(),
        None => {
            let payload = json!({ "error": "candidate not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}

async fn update_candidate_handler(
    State(state): State<PipelineState>,
    Path(name): Path<String>,
    axum::Json(request): axum::Json<UpdateCandidateRequest>,
) -> Response {
    let status = request.status.map(CandidateStatus::new);
    match state.ledger.update_by_name(&name, status, request.notes) {
        Ok(updated) => {
            let payload = json!({ "updated": updated });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err),
    }
}

async fn decision_handler(
    State(state): State<PipelineState>,
    axum::Json(request): axum::Json<DecisionRequest>,
) -> Response {
    match state
        .decisions
        .decide(request.threshold, request.preview_only)
    {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err @ (DecisionError::NoCandidates | DecisionError::ThresholdOutOfRange(_))) => {
            error_response(StatusCode::BAD_REQUEST, &err)
        }
    }
}

async fn analytics_handler(State(state): State<PipelineState>) -> Response {
    let report = analytics_report(&state.ledger.candidates());
    (StatusCode::OK, axum::Json(report)).into_response()
}

async fn stats_handler(State(state): State<PipelineState>) -> Response {
    let stored = match state.content.list_all() {
        Ok(files) => files.len(),
        Err(err) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &err),
    };
    let snapshot = state.ledger.snapshot();
    let stats = pipeline_stats(&snapshot.candidates, snapshot.counters, stored);
    (StatusCode::OK, axum::Json(stats)).into_response()
}

async fn purge_handler(State(state): State<PipelineState>) -> Response {
    let content = state.content.clone();
    match state.ledger.mutate(|snapshot| content.purge_all(snapshot)) {
        Ok(deleted) => {
            let payload = json!({ "documents_deleted": deleted });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err),
    }
}

fn error_response(status: StatusCode, err: &dyn std::error::Error) -> Response {
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
