use std::sync::Arc;

use tracing::debug;

use nook_store::{BlobStore, Collection};
use nook_types::{Comment, Post};

use crate::error::{ApiError, ApiResult};
use crate::service::{Upload, discard_blobs};

/// Most files a single post may carry.
pub const MAX_POST_FILES: usize = 6;

/// Posts and their comments over `posts.json`, newest post first.
pub struct PostFeed {
    posts: Collection<Post>,
    blobs: Arc<dyn BlobStore>,
}

impl PostFeed {
    pub fn new(posts: Collection<Post>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { posts, blobs }
    }

    pub fn collection(&self) -> &Collection<Post> {
        &self.posts
    }

    /// Store the uploads, then put the new post at the head of the feed. The
    /// author login is not checked against the user directory.
    pub fn create(&self, login: &str, text: String, uploads: Vec<Upload>) -> ApiResult<Post> {
        if login.is_empty() {
            return Err(ApiError::MissingField("login"));
        }
        if uploads.len() > MAX_POST_FILES {
            return Err(ApiError::TooManyFiles { max: MAX_POST_FILES });
        }

        let mut files = Vec::with_capacity(uploads.len());
        for upload in &uploads {
            match self.blobs.store(&upload.bytes, &upload.file_name) {
                Ok(reference) => files.push(reference),
                Err(e) => {
                    discard_blobs(self.blobs.as_ref(), &files);
                    return Err(e.into());
                }
            }
        }

        let post = Post::new(login, text, files);
        let written = self.posts.update(|posts| {
            posts.insert(0, post.clone());
            Ok::<_, ApiError>(())
        });
        if let Err(e) = written {
            discard_blobs(self.blobs.as_ref(), &post.files);
            return Err(e);
        }

        debug!("Post {} by {} with {} files", post.id, post.login, post.files.len());
        Ok(post)
    }

    pub fn list(&self) -> Vec<Post> {
        self.posts.load()
    }

    pub fn add_comment(&self, post_id: &str, login: &str, text: String) -> ApiResult<Comment> {
        if login.is_empty() {
            return Err(ApiError::MissingField("login"));
        }

        self.posts.update(|posts| {
            let post = posts
                .iter_mut()
                .find(|p| p.id == post_id)
                .ok_or_else(|| ApiError::PostNotFound(post_id.to_string()))?;
            let comment = Comment::new(login, text);
            post.comments.push(comment.clone());
            Ok(comment)
        })
    }
}
