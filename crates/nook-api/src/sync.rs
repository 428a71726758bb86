use axum::{Json, extract::State, response::IntoResponse};

use crate::error::ApiResult;
use crate::state::{AppState, blocking};

/// GET /api/sync — everything a client needs to bootstrap.
pub async fn sync(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let snapshot = blocking(move || Ok(state.snapshot())).await?;
    Ok(Json(snapshot))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
