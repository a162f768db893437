//! SQLite implementation of the PostRepository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::connection::Database;
use super::parse_datetime;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Comment, NewComment, NewPost, Post};
use crate::domain::ports::PostRepository;

#[derive(Clone)]
pub struct SqlitePostRepository {
    db: Arc<Database>,
}

impl SqlitePostRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn create_post(&self, post: &NewPost) -> DomainResult<Post> {
        post.validate()?;
        let created_at = Utc::now();

        let mut session = self.db.session().await?;
        let result = sqlx::query("INSERT INTO posts (body, created_at) VALUES (?, ?)")
            .bind(&post.body)
            .bind(created_at.to_rfc3339())
            .execute(&mut *session)
            .await?;

        Ok(Post {
            id: result.last_insert_rowid(),
            body: post.body.clone(),
            created_at,
        })
    }

    async fn list_posts(&self) -> DomainResult<Vec<Post>> {
        let mut session = self.db.session().await?;
        let rows: Vec<PostRow> = sqlx::query_as("SELECT id, body, created_at FROM posts ORDER BY id")
            .fetch_all(&mut *session)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_post(&self, id: i64) -> DomainResult<Option<Post>> {
        let mut session = self.db.session().await?;
        let row: Option<PostRow> = sqlx::query_as("SELECT id, body, created_at FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *session)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create_comment(&self, comment: &NewComment) -> DomainResult<Comment> {
        comment.validate()?;
        let created_at = Utc::now();

        let mut session = self.db.session().await?;
        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM posts WHERE id = ?")
            .bind(comment.post_id)
            .fetch_optional(&mut *session)
            .await?;
        if exists.is_none() {
            return Err(DomainError::PostNotFound(comment.post_id));
        }

        let result = sqlx::query("INSERT INTO comments (body, post_id, created_at) VALUES (?, ?, ?)")
            .bind(&comment.body)
            .bind(comment.post_id)
            .bind(created_at.to_rfc3339())
            .execute(&mut *session)
            .await?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            body: comment.body.clone(),
            post_id: comment.post_id,
            created_at,
        })
    }

    async fn list_comments(&self, post_id: i64) -> DomainResult<Vec<Comment>> {
        let mut session = self.db.session().await?;
        let rows: Vec<CommentRow> = sqlx::query_as(
            "SELECT id, body, post_id, created_at FROM comments WHERE post_id = ? ORDER BY id",
        )
        .bind(post_id)
        .fetch_all(&mut *session)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    body: String,
    created_at: String,
}

impl TryFrom<PostRow> for Post {
    type Error = DomainError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            body: row.body,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    body: String,
    post_id: i64,
    created_at: String,
}

impl TryFrom<CommentRow> for Comment {
    type Error = DomainError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            body: row.body,
            post_id: row.post_id,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}
