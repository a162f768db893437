//! Domain layer for the posts service
//!
//! Core models, the repository port, and domain errors. Nothing here
//! touches the database or the process environment directly.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
