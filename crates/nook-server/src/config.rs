use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

use nook_api::PasswordMode;

/// Server settings, read from `NOOK_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    /// Static front-end assets served for unmatched paths, if the directory exists.
    pub public_dir: PathBuf,
    pub password_mode: PasswordMode,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            data_dir: PathBuf::from("./data"),
            uploads_dir: PathBuf::from("./uploads"),
            public_dir: PathBuf::from("./public"),
            password_mode: PasswordMode::Plaintext,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let port = match lookup("NOOK_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid port {raw:?}"))?,
            None => defaults.port,
        };
        let password_mode = match lookup("NOOK_PASSWORD_MODE") {
            Some(raw) => raw.parse()?,
            None => defaults.password_mode,
        };
        let max_upload_bytes = match lookup("NOOK_MAX_UPLOAD_MB") {
            Some(raw) => {
                let mb: usize = raw
                    .parse()
                    .with_context(|| format!("invalid upload limit {raw:?}"))?;
                mb.checked_mul(1024 * 1024)
                    .with_context(|| format!("upload limit {raw:?} MB is too large"))?
            }
            None => defaults.max_upload_bytes,
        };

        Ok(Self {
            host: lookup("NOOK_HOST").unwrap_or(defaults.host),
            port,
            data_dir: lookup("NOOK_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            uploads_dir: lookup("NOOK_UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_dir),
            public_dir: lookup("NOOK_PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.public_dir),
            password_mode,
            max_upload_bytes,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}
