use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use nook_types::api::{CommentRequest, CommentResponse, PostResponse};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, UploadForm};
use crate::state::{AppState, blocking};

/// GET /api/posts
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let posts = blocking(move || Ok(state.feed.list())).await?;
    Ok(Json(posts))
}

/// POST /api/posts — multipart with `login`, `text` and up to six `files`.
pub async fn create_post(
    State(state): State<AppState>,
    mut form: UploadForm,
) -> ApiResult<impl IntoResponse> {
    let login = form.field("login").unwrap_or_default().to_string();
    let text = form.field("text").unwrap_or_default().to_string();
    let files = form.take_files("files")?;

    let post = blocking(move || state.feed.create(&login, text, files)).await?;
    Ok(Json(PostResponse { ok: true, post }))
}

/// POST /api/posts/{id}/comment
pub async fn add_comment(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<String>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let login = req.login.unwrap_or_default();
    let text = req.text.unwrap_or_default();

    let comment = blocking(move || state.feed.add_comment(&post_id, &login, text)).await?;
    Ok(Json(CommentResponse { ok: true, comment }))
}
