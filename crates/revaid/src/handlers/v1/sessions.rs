//! Session lifecycle HTTP handlers.

use axum::Json;
use axum::extract::{Path as PathExtract, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::error;

use crate::api::{
    ContinueSessionRequest, GetTurnsResponse, ListSessionsResponse, SessionProgressResponse,
    SessionSummary, StartSessionRequest,
};
use crate::handlers::problem_details;
use crate::prompts;
use crate::revision::EngineError;
use crate::server::AppState;

// ============================================================================
// Query Types
// ============================================================================

#[derive(Deserialize)]
pub struct GetTurnsQuery {
    limit: Option<u32>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/sessions
pub async fn list_sessions(State(state): State<AppState>) -> Json<ListSessionsResponse> {
    let sessions = state
        .engine
        .registry()
        .snapshots()
        .await
        .iter()
        .map(SessionSummary::from_snapshot)
        .collect();

    Json(ListSessionsResponse { sessions })
}

/// POST /api/v1/sessions
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> impl IntoResponse {
    if req.topic.trim().is_empty() {
        return problem_details::bad_request("topic must not be empty").into_response();
    }

    match state
        .engine
        .start_session(&req.topic, &req.student_id, req.session_id)
        .await
    {
        Ok(reply) => (StatusCode::CREATED, Json(reply)).into_response(),
        Err(e) => {
            error!(error = %e, "failed to start session");
            problem_details::bad_gateway("text generation failed").into_response()
        }
    }
}

/// POST /api/v1/sessions/{session_id}/messages
pub async fn continue_session(
    State(state): State<AppState>,
    PathExtract(session_id): PathExtract<String>,
    Json(req): Json<ContinueSessionRequest>,
) -> impl IntoResponse {
    match state
        .engine
        .continue_session(&session_id, &req.message)
        .await
    {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(EngineError::SessionNotFound(_)) => {
            problem_details::not_found(prompts::SESSION_NOT_FOUND).into_response()
        }
        Err(e) => {
            error!(session_id = %session_id, error = %e, "failed to continue session");
            problem_details::bad_gateway("text generation failed").into_response()
        }
    }
}

/// GET /api/v1/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    PathExtract(session_id): PathExtract<String>,
) -> impl IntoResponse {
    let Some(snapshot) = state.engine.session_view(&session_id).await else {
        return problem_details::not_found("session not found").into_response();
    };

    let session = snapshot.into_session();
    let response = SessionProgressResponse::for_session(&session);
    (StatusCode::OK, Json(response)).into_response()
}

/// GET /api/v1/sessions/{session_id}/turns
pub async fn get_turns(
    State(state): State<AppState>,
    PathExtract(session_id): PathExtract<String>,
    Query(query): Query<GetTurnsQuery>,
) -> impl IntoResponse {
    if state.engine.session_view(&session_id).await.is_none() {
        return problem_details::not_found("session not found").into_response();
    }

    let mut turns = match state
        .engine
        .registry()
        .store()
        .load_turns(&session_id)
        .await
    {
        Ok(t) => t,
        Err(e) => {
            error!(session_id = %session_id, error = %e, "failed to load turn records");
            return problem_details::internal_error("failed to load turn records").into_response();
        }
    };

    // limit keeps the most recent records
    if let Some(limit) = query.limit {
        let limit = limit as usize;
        if turns.len() > limit {
            turns = turns.split_off(turns.len() - limit);
        }
    }

    (StatusCode::OK, Json(GetTurnsResponse { turns })).into_response()
}

/// DELETE /api/v1/sessions/{session_id}
pub async fn delete_session(
    State(state): State<AppState>,
    PathExtract(session_id): PathExtract<String>,
) -> Response {
    if state.engine.registry().remove(&session_id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        problem_details::not_found("session not found").into_response()
    }
}
