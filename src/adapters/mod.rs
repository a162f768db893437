//! Adapters for the database and the HTTP surface.

pub mod http;
pub mod sqlite;
