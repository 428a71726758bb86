/// Errors from collection and blob storage.
///
/// Read failures on collections never surface here: loading is permissive and
/// falls back to an empty sequence. These errors come from writes, blob I/O
/// and lock poisoning.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A writer panicked while holding the collection's update lock.
    #[error("update lock poisoned for collection {0}")]
    LockPoisoned(String),

    /// Blob names must be a single path component.
    #[error("invalid blob name: {0}")]
    InvalidBlobName(String),

    #[error("blob not found: {0}")]
    BlobNotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
