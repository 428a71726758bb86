pub mod api;
pub mod models;

pub use models::{Comment, Message, Post, User, UserRecord};

/// Current time as Unix epoch milliseconds, the timestamp format of every
/// stored record.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Fresh opaque record identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
