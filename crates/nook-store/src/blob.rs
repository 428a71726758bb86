use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use rand::Rng;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// URL prefix under which the static file service exposes stored blobs.
pub const DEFAULT_URL_PREFIX: &str = "/uploads";

const NAME_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const NAME_ENTROPY_LEN: usize = 6;

/// Write-once storage for uploaded bytes.
///
/// `store` never overwrites: each blob gets a fresh name and the returned
/// reference stays valid for the blob's lifetime.
pub trait BlobStore: Send + Sync {
    /// Store `bytes` and return a reference resolvable by the static file
    /// service. The extension of `original_name` is preserved.
    fn store(&self, bytes: &[u8], original_name: &str) -> StoreResult<String>;

    /// Read a stored blob back by file name (the last path segment of its
    /// reference).
    fn open(&self, file_name: &str) -> StoreResult<Vec<u8>>;

    /// Delete the blob behind a reference returned by `store`. Used to undo an
    /// upload whose owning record was never written.
    fn remove(&self, reference: &str) -> StoreResult<()>;
}

/// `<epoch millis>-<6 base36 chars><.ext>`.
pub fn blob_file_name(original_name: &str) -> String {
    let mut rng = rand::rng();
    let entropy: String = (0..NAME_ENTROPY_LEN)
        .map(|_| NAME_ALPHABET[rng.random_range(0..NAME_ALPHABET.len())] as char)
        .collect();

    let millis = chrono::Utc::now().timestamp_millis();
    match extension(original_name) {
        Some(ext) => format!("{millis}-{entropy}.{ext}"),
        None => format!("{millis}-{entropy}"),
    }
}

fn extension(original_name: &str) -> Option<&str> {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn reference(url_prefix: &str, file_name: &str) -> String {
    format!("{}/{}", url_prefix.trim_end_matches('/'), file_name)
}

fn file_name_of(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Reject anything that is not a single plain path component.
fn check_file_name(file_name: &str) -> StoreResult<()> {
    let plain = !file_name.is_empty()
        && file_name != "."
        && file_name != ".."
        && !file_name.contains(['/', '\\', '\0']);
    if plain {
        Ok(())
    } else {
        Err(StoreError::InvalidBlobName(file_name.to_string()))
    }
}

/// Blobs stored as flat files in one directory.
pub struct DiskBlobStore {
    dir: PathBuf,
    url_prefix: String,
}

impl DiskBlobStore {
    pub fn open(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        info!("Upload directory: {}", dir.display());
        Ok(Self {
            dir,
            url_prefix: url_prefix.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl BlobStore for DiskBlobStore {
    fn store(&self, bytes: &[u8], original_name: &str) -> StoreResult<String> {
        let file_name = blob_file_name(original_name);
        let path = self.dir.join(&file_name);

        // create_new: a name collision fails instead of clobbering a blob
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        file.write_all(bytes)?;
        file.flush()?;

        debug!("Stored blob {} ({} bytes)", file_name, bytes.len());
        Ok(reference(&self.url_prefix, &file_name))
    }

    fn open(&self, file_name: &str) -> StoreResult<Vec<u8>> {
        check_file_name(file_name)?;
        match fs::read(self.dir.join(file_name)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::BlobNotFound(file_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, reference: &str) -> StoreResult<()> {
        let file_name = file_name_of(reference);
        check_file_name(file_name)?;
        match fs::remove_file(self.dir.join(file_name)) {
            Ok(()) => {
                debug!("Removed blob {}", file_name);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::BlobNotFound(file_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory blobs for tests and embedding.
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    url_prefix: String,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|blobs| blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for MemoryBlobStore {
    fn store(&self, bytes: &[u8], original_name: &str) -> StoreResult<String> {
        let file_name = blob_file_name(original_name);
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| StoreError::LockPoisoned("blobs".into()))?;
        if blobs.contains_key(&file_name) {
            return Err(StoreError::Io(ErrorKind::AlreadyExists.into()));
        }
        blobs.insert(file_name.clone(), bytes.to_vec());
        Ok(reference(&self.url_prefix, &file_name))
    }

    fn open(&self, file_name: &str) -> StoreResult<Vec<u8>> {
        check_file_name(file_name)?;
        self.blobs
            .read()
            .map_err(|_| StoreError::LockPoisoned("blobs".into()))?
            .get(file_name)
            .cloned()
            .ok_or_else(|| StoreError::BlobNotFound(file_name.to_string()))
    }

    fn remove(&self, reference: &str) -> StoreResult<()> {
        let file_name = file_name_of(reference);
        self.blobs
            .write()
            .map_err(|_| StoreError::LockPoisoned("blobs".into()))?
            .remove(file_name)
            .map(|_| ())
            .ok_or_else(|| StoreError::BlobNotFound(file_name.to_string()))
    }
}
