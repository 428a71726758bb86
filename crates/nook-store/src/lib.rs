//! JSON-file persistence for Nook: named record collections and write-once
//! blob storage.

pub mod backend;
pub mod blob;
pub mod collection;
pub mod error;

pub use backend::{CollectionBackend, JsonDirBackend, MemoryBackend};
pub use blob::{BlobStore, DEFAULT_URL_PREFIX, DiskBlobStore, MemoryBlobStore};
pub use collection::Collection;
pub use error::{StoreError, StoreResult};

/// File names of the three collections.
pub const USERS: &str = "users";
pub const POSTS: &str = "posts";
pub const MESSAGES: &str = "messages";
