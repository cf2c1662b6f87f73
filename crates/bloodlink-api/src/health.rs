use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::warn;

use crate::state::{AppState, run_db};

/// GET /
pub async fn root() -> impl IntoResponse {
    Json(json!({ "status": "ok", "message": "Bloodlink API" }))
}

/// GET /api/health: round-trips a trivial query through the store.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match run_db(&state, |db| db.ping()).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "db": "up" }))),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "db": "down", "error": e.to_string() })),
            )
        }
    }
}
