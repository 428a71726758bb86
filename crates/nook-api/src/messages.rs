use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use nook_types::api::{ConversationQuery, SendMessageRequest, SendMessageResponse};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::{AppState, blocking};

/// POST /api/messages/send
pub async fn send_message(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let from = req.from.unwrap_or_default();
    let to = req.to.unwrap_or_default();
    let text = req.text.unwrap_or_default();

    let msg = blocking(move || state.messaging.send(&from, &to, text)).await?;
    Ok(Json(SendMessageResponse { ok: true, msg }))
}

/// GET /api/messages/{login}
///
/// Without `?with=` this returns every message `login` sent or received,
/// whatever the counterpart.
pub async fn get_messages(
    State(state): State<AppState>,
    ApiPath(login): ApiPath<String>,
    ApiQuery(query): ApiQuery<ConversationQuery>,
) -> ApiResult<impl IntoResponse> {
    let messages = blocking(move || {
        Ok(match query.with.as_deref() {
            Some(other) => state.messaging.list_between(&login, other),
            None => state.messaging.list_conversation(&login),
        })
    })
    .await?;

    Ok(Json(messages))
}
