//! Port trait definitions (Hexagonal Architecture)
//!
//! Interfaces the infrastructure adapters implement so the domain stays
//! independent of the storage backend.

pub mod post_repository;

pub use post_repository::PostRepository;
