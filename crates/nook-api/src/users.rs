use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use nook_types::api::{
    FriendRequest, FriendsResponse, SearchQuery, UpdateProfileRequest, UserResponse,
};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, UploadForm};
use crate::service::ProfilePatch;
use crate::state::{AppState, blocking};

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users = blocking(move || Ok(state.users.list())).await?;
    Ok(Json(users))
}

/// GET /api/user/{login}
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(login): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    let user = blocking(move || state.users.get_by_login(&login)).await?;
    Ok(Json(user))
}

/// POST /api/upload-avatar — multipart with a `login` field and an `avatar` file.
pub async fn upload_avatar(
    State(state): State<AppState>,
    mut form: UploadForm,
) -> ApiResult<impl IntoResponse> {
    let login = form.field("login").unwrap_or_default().to_string();
    let avatar = form.take_files("avatar")?.into_iter().next();

    let user = blocking(move || state.users.update_avatar(&login, avatar)).await?;
    Ok(Json(UserResponse { ok: true, user }))
}

/// POST /api/update-profile
pub async fn update_profile(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    let login = req.login.unwrap_or_default();
    let patch = ProfilePatch {
        bio: req.bio,
        display_name: req.display_name,
    };

    let user = blocking(move || state.users.update_profile(&login, patch)).await?;
    Ok(Json(UserResponse { ok: true, user }))
}

/// POST /api/add-friend
pub async fn add_friend(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<FriendRequest>,
) -> ApiResult<impl IntoResponse> {
    let (login, friend) = friend_pair(req);
    let friends = blocking(move || state.users.add_friend(&login, &friend)).await?;
    Ok(Json(FriendsResponse { ok: true, friends }))
}

/// POST /api/remove-friend
pub async fn remove_friend(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<FriendRequest>,
) -> ApiResult<impl IntoResponse> {
    let (login, friend) = friend_pair(req);
    let friends = blocking(move || state.users.remove_friend(&login, &friend)).await?;
    Ok(Json(FriendsResponse { ok: true, friends }))
}

/// GET /api/search?q=
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let users = blocking(move || Ok(state.users.search(&query.q))).await?;
    Ok(Json(users))
}

/// Absent logins become empty strings, which never match a user.
fn friend_pair(req: FriendRequest) -> (String, String) {
    (
        req.login.unwrap_or_default(),
        req.friend_login.unwrap_or_default(),
    )
}
