//! CLI command implementations.

pub mod config;
pub mod migrate;
pub mod serve;
