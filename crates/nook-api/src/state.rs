use std::sync::Arc;

use tracing::{error, info};

use nook_store::{
    BlobStore, Collection, CollectionBackend, MESSAGES, POSTS, StoreResult, USERS,
};
use nook_types::api::Snapshot;

use crate::error::{ApiError, ApiResult};
use crate::password::PasswordMode;
use crate::service::{Messaging, PostFeed, UserDirectory};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub users: UserDirectory,
    pub feed: PostFeed,
    pub messaging: Messaging,
}

impl AppStateInner {
    /// Wire the three collections onto one backend. Users and posts share the
    /// blob store.
    pub fn new(
        backend: Arc<dyn CollectionBackend>,
        blobs: Arc<dyn BlobStore>,
        password_mode: PasswordMode,
    ) -> Self {
        Self {
            users: UserDirectory::new(
                Collection::new(USERS, backend.clone()),
                blobs.clone(),
                password_mode,
            ),
            feed: PostFeed::new(Collection::new(POSTS, backend.clone()), blobs),
            messaging: Messaging::new(Collection::new(MESSAGES, backend)),
        }
    }

    /// Make sure every collection exists on disk.
    pub fn init(&self) -> StoreResult<()> {
        self.users.collection().ensure()?;
        self.feed.collection().ensure()?;
        self.messaging.collection().ensure()?;
        info!("Collections ready");
        Ok(())
    }

    /// Users without credentials plus the full feed, for client bootstrap.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.users.list(),
            posts: self.feed.list(),
        }
    }
}

/// Run synchronous store work off the async runtime.
pub async fn blocking<F, T>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Task(e.to_string())
    })?
}

#[cfg(test)]
mod tests {
    use nook_store::{MemoryBackend, MemoryBlobStore};

    use super::*;

    fn state() -> AppStateInner {
        AppStateInner::new(
            Arc::new(MemoryBackend::new()),
            Arc::new(MemoryBlobStore::new()),
            PasswordMode::Plaintext,
        )
    }

    #[test]
    fn snapshot_strips_passwords_and_keeps_feed_order() {
        let state = state();
        state.users.register("alice", "secret", None).unwrap();
        state.feed.create("alice", "first".into(), vec![]).unwrap();
        state.feed.create("alice", "second".into(), vec![]).unwrap();

        let snapshot = state.snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["users"][0].get("password").is_none());
        assert_eq!(json["users"][0]["login"], "alice");
        assert_eq!(snapshot.posts[0].text, "second");
        assert_eq!(snapshot.posts[1].text, "first");
    }

    #[test]
    fn init_creates_all_collections() {
        let backend = Arc::new(MemoryBackend::new());
        let state = AppStateInner::new(
            backend.clone(),
            Arc::new(MemoryBlobStore::new()),
            PasswordMode::Plaintext,
        );
        state.init().unwrap();

        for name in [USERS, POSTS, MESSAGES] {
            assert_eq!(backend.read(name).unwrap().unwrap(), b"[]");
        }
    }

    #[tokio::test]
    async fn blocking_surfaces_panics_as_task_errors() {
        let result: ApiResult<()> = blocking(|| panic!("boom")).await;
        assert!(matches!(result, Err(ApiError::Task(_))));
    }
}
