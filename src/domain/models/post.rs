//! Posts and the comments attached to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A post together with all of its comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostWithComments {
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// Input for creating a post.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub body: String,
}

/// Input for creating a comment on an existing post.
#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub body: String,
    pub post_id: i64,
}

impl NewPost {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_body(&self.body)
    }
}

impl NewComment {
    pub fn new(body: impl Into<String>, post_id: i64) -> Self {
        Self {
            body: body.into(),
            post_id,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_body(&self.body)
    }
}

fn validate_body(body: &str) -> DomainResult<()> {
    if body.trim().is_empty() {
        return Err(DomainError::ValidationFailed(
            "body cannot be empty".to_string(),
        ));
    }
    Ok(())
}
