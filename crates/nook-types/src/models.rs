use serde::{Deserialize, Deserializer, Serialize};

/// Public view of a user. Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub login: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bio: String,
    /// Blob reference, or empty when no avatar was uploaded.
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar: String,
    /// Logins this user has added. One-directional, no duplicates.
    #[serde(default, deserialize_with = "null_as_default")]
    pub friends: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: i64,
}

/// A user as persisted in `users.json`: the public fields plus the stored
/// password (cleartext or an Argon2 PHC string depending on the password mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(flatten)]
    pub user: User,
    #[serde(default, deserialize_with = "null_as_default")]
    pub password: String,
}

impl UserRecord {
    pub fn new(login: &str, password: String, display_name: Option<String>) -> Self {
        Self {
            user: User {
                id: crate::new_id(),
                login: login.to_string(),
                display_name: display_name
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| login.to_string()),
                bio: String::new(),
                avatar: String::new(),
                friends: Vec::new(),
                created_at: crate::now_millis(),
            },
            password,
        }
    }

    pub fn login(&self) -> &str {
        &self.user.login
    }

    /// Copy of the record with the password stripped.
    pub fn public(&self) -> User {
        self.user.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Author login. Soft reference, not checked against the user directory.
    #[serde(default, deserialize_with = "null_as_default")]
    pub login: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    /// Blob references in upload order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<Comment>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: i64,
}

impl Post {
    pub fn new(login: &str, text: String, files: Vec<String>) -> Self {
        Self {
            id: crate::new_id(),
            login: login.to_string(),
            text,
            files,
            comments: Vec::new(),
            created_at: crate::now_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub login: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: i64,
}

impl Comment {
    pub fn new(login: &str, text: String) -> Self {
        Self {
            id: crate::new_id(),
            login: login.to_string(),
            text,
            created_at: crate::now_millis(),
        }
    }
}

/// A direct message. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub from: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub to: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: i64,
}

impl Message {
    pub fn new(from: &str, to: &str, text: String) -> Self {
        Self {
            id: crate::new_id(),
            from: from.to_string(),
            to: to.to_string(),
            text,
            created_at: crate::now_millis(),
        }
    }

    pub fn involves(&self, login: &str) -> bool {
        self.from == login || self.to == login
    }
}

/// Stored `null` reads as the field's default, the same as a missing field.
/// Older front-ends wrote `null` for fields they never set.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
