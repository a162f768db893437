//! Posts HTTP Server.
//!
//! JSON endpoints for creating and reading posts and their comments.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::errors::DomainError;
use crate::domain::models::{Comment, NewComment, NewPost, Post, PostWithComments, ServerConfig};
use crate::domain::ports::PostRepository;

/// Request to create a post.
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub body: String,
}

/// Request to comment on a post.
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
    pub post_id: i64,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: &DomainError) -> ApiError {
    let (status, code) = match err {
        DomainError::PostNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        DomainError::ValidationFailed(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: code.to_string(),
        }),
    )
}

/// Malformed or mistyped request bodies share the validation error shape.
fn rejection_error(rejection: &JsonRejection) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            error: rejection.body_text(),
            code: "VALIDATION_ERROR".to_string(),
        }),
    )
}

/// Shared state for the posts HTTP server.
struct AppState<R: PostRepository> {
    repo: R,
}

/// Posts HTTP Server.
pub struct PostsHttpServer<R: PostRepository + 'static> {
    config: ServerConfig,
    repo: R,
}

impl<R: PostRepository + 'static> PostsHttpServer<R> {
    pub fn new(repo: R, config: ServerConfig) -> Self {
        Self { config, repo }
    }

    /// Build the router.
    pub fn build_router(self) -> Router {
        let enable_cors = self.config.enable_cors;
        let app = router(self.repo);

        if enable_cors {
            app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(TraceLayer::new_for_http())
        } else {
            app.layer(TraceLayer::new_for_http())
        }
    }

    /// Start the server with a shutdown signal.
    pub async fn serve_with_shutdown<F>(
        self,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let router = self.build_router();

        tracing::info!("Posts HTTP server listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

/// Routes without middleware, for embedding or in-process testing.
pub fn router<R: PostRepository + 'static>(repo: R) -> Router {
    let state = Arc::new(AppState { repo });

    Router::new()
        .route("/post", get(list_posts::<R>).post(create_post::<R>))
        .route("/post/{id}", get(get_post_with_comments::<R>))
        .route("/post/{id}/comment", get(list_comments::<R>))
        .route("/comment", axum::routing::post(create_comment::<R>))
        .route("/health", get(health_check))
        .with_state(state)
}

// Handler functions

async fn health_check() -> &'static str {
    "OK"
}

async fn create_post<R: PostRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let Json(req) = payload.map_err(|e| rejection_error(&e))?;
    let post = state
        .repo
        .create_post(&NewPost::new(req.body))
        .await
        .map_err(|e| api_error(&e))?;

    tracing::debug!(post_id = post.id, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

async fn list_posts<R: PostRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<Json<Vec<Post>>, ApiError> {
    state.repo.list_posts().await.map(Json).map_err(|e| api_error(&e))
}

async fn get_post_with_comments<R: PostRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<i64>,
) -> Result<Json<PostWithComments>, ApiError> {
    let post = find_post_or_404(&state.repo, id).await?;
    let comments = state.repo.list_comments(id).await.map_err(|e| api_error(&e))?;

    Ok(Json(PostWithComments { post, comments }))
}

async fn create_comment<R: PostRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let Json(req) = payload.map_err(|e| rejection_error(&e))?;
    let comment = state
        .repo
        .create_comment(&NewComment::new(req.body, req.post_id))
        .await
        .map_err(|e| api_error(&e))?;

    tracing::debug!(comment_id = comment.id, post_id = comment.post_id, "comment created");
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn list_comments<R: PostRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    find_post_or_404(&state.repo, id).await?;
    state.repo.list_comments(id).await.map(Json).map_err(|e| api_error(&e))
}

async fn find_post_or_404<R: PostRepository>(repo: &R, id: i64) -> Result<Post, ApiError> {
    match repo.find_post(id).await {
        Ok(Some(post)) => Ok(post),
        Ok(None) => Err(api_error(&DomainError::PostNotFound(id))),
        Err(e) => Err(api_error(&e)),
    }
}
