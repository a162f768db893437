//! Post repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Comment, NewComment, NewPost, Post};

/// Repository interface for post and comment persistence.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post.
    async fn create_post(&self, post: &NewPost) -> DomainResult<Post>;

    /// List all posts, oldest first.
    async fn list_posts(&self) -> DomainResult<Vec<Post>>;

    /// Get a post by ID.
    async fn find_post(&self, id: i64) -> DomainResult<Option<Post>>;

    /// Create a comment. Fails with `PostNotFound` when the post does not exist.
    async fn create_comment(&self, comment: &NewComment) -> DomainResult<Comment>;

    /// List the comments of a post, oldest first.
    async fn list_comments(&self, post_id: i64) -> DomainResult<Vec<Comment>>;
}
