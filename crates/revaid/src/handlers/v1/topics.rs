//! Topic listing HTTP handlers.

use axum::Json;
use axum::extract::State;

use crate::api::ListTopicsResponse;
use crate::server::AppState;

/// GET /api/v1/topics
pub async fn list_topics(State(state): State<AppState>) -> Json<ListTopicsResponse> {
    let topics = state.engine.catalog().list_topics().await;
    Json(ListTopicsResponse { topics })
}
