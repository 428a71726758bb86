use std::fmt;
use std::str::FromStr;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::{ApiError, ApiResult};

/// How passwords are kept in `users.json`.
///
/// `Plaintext` stores the password as given and echoes it back from
/// registration, matching existing data files and clients. `Argon2` stores an
/// Argon2id PHC string and never returns the secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordMode {
    #[default]
    Plaintext,
    Argon2,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown password mode {0:?} (expected \"plaintext\" or \"argon2\")")]
pub struct UnknownPasswordMode(pub String);

impl FromStr for PasswordMode {
    type Err = UnknownPasswordMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plaintext" | "plain" => Ok(Self::Plaintext),
            "argon2" | "hashed" => Ok(Self::Argon2),
            _ => Err(UnknownPasswordMode(s.to_string())),
        }
    }
}

impl fmt::Display for PasswordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plaintext => f.write_str("plaintext"),
            Self::Argon2 => f.write_str("argon2"),
        }
    }
}

impl PasswordMode {
    /// Value to persist for a newly registered password.
    pub fn seal(&self, password: &str) -> ApiResult<String> {
        match self {
            Self::Plaintext => Ok(password.to_string()),
            Self::Argon2 => {
                let salt = SaltString::generate(&mut OsRng);
                Argon2::default()
                    .hash_password(password.as_bytes(), &salt)
                    .map(|hash| hash.to_string())
                    .map_err(|e| ApiError::PasswordHash(e.to_string()))
            }
        }
    }

    /// Check `given` against a persisted value. In Argon2 mode a stored value
    /// that is not a PHC string never matches.
    pub fn verify(&self, stored: &str, given: &str) -> bool {
        match self {
            Self::Plaintext => stored == given,
            Self::Argon2 => PasswordHash::new(stored)
                .map(|parsed| {
                    Argon2::default()
                        .verify_password(given.as_bytes(), &parsed)
                        .is_ok()
                })
                .unwrap_or(false),
        }
    }

    /// Whether registration responses include the stored password.
    pub fn echoes_password(&self) -> bool {
        matches!(self, Self::Plaintext)
    }
}
