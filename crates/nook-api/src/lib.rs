//! REST API for Nook: domain services over the JSON collections and the axum
//! handlers that expose them.

pub mod auth;
pub mod error;
pub mod extract;
pub mod messages;
pub mod password;
pub mod posts;
pub mod router;
pub mod service;
pub mod state;
pub mod sync;
pub mod users;

pub use error::{ApiError, ApiResult};
pub use password::PasswordMode;
pub use router::build_router;
pub use state::{AppState, AppStateInner};
