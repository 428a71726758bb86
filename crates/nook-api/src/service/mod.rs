//! Domain operations over the collections. Everything here is synchronous
//! file I/O; handlers run it on the blocking pool.

pub mod directory;
pub mod feed;
pub mod messaging;

pub use directory::{ProfilePatch, UserDirectory};
pub use feed::{MAX_POST_FILES, PostFeed};
pub use messaging::Messaging;

use bytes::Bytes;
use tracing::warn;

use nook_store::BlobStore;

/// A file received in a multipart request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Delete blobs stored for a record that was never written.
fn discard_blobs(blobs: &dyn BlobStore, references: &[String]) {
    for reference in references {
        if let Err(e) = blobs.remove(reference) {
            warn!("Orphaned upload {} could not be removed: {}", reference, e);
        }
    }
}
