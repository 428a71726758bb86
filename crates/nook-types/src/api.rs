use serde::{Deserialize, Serialize};

use crate::models::{Comment, Message, Post, User, UserRecord};

// Request fields are optional so that a missing field is reported as a
// validation error by the handler rather than a generic body rejection.

// -- Auth --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub login: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub login: Option<String>,
    pub password: Option<String>,
}

/// The user returned from registration. Plaintext mode echoes the stored
/// record, password included; hashed mode returns only the public view.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RegisteredUser {
    WithPassword(UserRecord),
    Public(User),
}

impl RegisteredUser {
    pub fn user(&self) -> &User {
        match self {
            Self::WithPassword(record) => &record.user,
            Self::Public(user) => user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub ok: bool,
    pub user: RegisteredUser,
}

// -- Users --

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub ok: bool,
    pub user: User,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub login: Option<String>,
    pub bio: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub login: Option<String>,
    pub friend_login: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FriendsResponse {
    pub ok: bool,
    pub friends: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

// -- Posts --

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub ok: bool,
    pub post: Post,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentRequest {
    pub login: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub ok: bool,
    pub comment: Comment,
}

// -- Messages --

#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    pub from: Option<String>,
    pub to: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub ok: bool,
    pub msg: Message,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConversationQuery {
    /// Restrict the listing to messages exchanged with this login.
    pub with: Option<String>,
}

// -- Sync --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub posts: Vec<Post>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
