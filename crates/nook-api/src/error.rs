use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use nook_store::StoreError;
use nook_types::api::ErrorResponse;

/// Everything a request can fail with. Rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("login/password required")]
    MissingCredentials,

    #[error("{0} required")]
    MissingField(&'static str),

    #[error("{0}")]
    MalformedBody(String),

    #[error("too many files (at most {max})")]
    TooManyFiles { max: usize },

    /// Registration conflict. Reported as 400, like every other bad request.
    #[error("login exists")]
    LoginTaken,

    /// Unknown login and wrong password are deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user not found")]
    UserNotFound(String),

    #[error("post not found")]
    PostNotFound(String),

    #[error("no file")]
    NoFile,

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("background task failed: {0}")]
    Task(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredentials
            | Self::MissingField(_)
            | Self::MalformedBody(_)
            | Self::TooManyFiles { .. }
            | Self::LoginTaken
            | Self::NoFile => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::UserNotFound(_) | Self::PostNotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::PasswordHash(_) | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::MalformedBody(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "internal error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
