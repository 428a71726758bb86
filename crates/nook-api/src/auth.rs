use axum::{Json, extract::State, response::IntoResponse};
use tracing::debug;

use nook_types::api::{LoginRequest, RegisterRequest, RegisterResponse, UserResponse};

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::{AppState, blocking};

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let login = req.login.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    let user = blocking(move || state.users.register(&login, &password, req.display_name)).await?;

    Ok(Json(RegisterResponse { ok: true, user }))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let login = req.login.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    let user = blocking(move || state.users.authenticate(&login, &password)).await?;
    debug!("User {} logged in", user.login);

    Ok(Json(UserResponse { ok: true, user }))
}
