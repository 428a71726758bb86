use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;
use crate::{auth, messages, posts, sync, users};

/// Every API route. Static file serving and cross-cutting layers are added by
/// the server binary.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/users", get(users::list_users))
        .route("/api/user/{login}", get(users::get_user))
        .route("/api/upload-avatar", post(users::upload_avatar))
        .route("/api/update-profile", post(users::update_profile))
        .route("/api/add-friend", post(users::add_friend))
        .route("/api/remove-friend", post(users::remove_friend))
        .route("/api/search", get(users::search))
        .route("/api/posts", get(posts::list_posts).post(posts::create_post))
        .route("/api/posts/{id}/comment", post(posts::add_comment))
        .route("/api/messages/send", post(messages::send_message))
        .route("/api/messages/{login}", get(messages::get_messages))
        .route("/api/sync", get(sync::sync))
        .route("/health", get(sync::health))
        .with_state(state)
}
