//! HTTP adapters.

pub mod posts_http;

pub use posts_http::{router, PostsHttpServer};
